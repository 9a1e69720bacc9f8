//! Eventgate daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `eventgate-daemon` is used as a binary (main.rs).

pub mod bootstrap;
pub mod cli;
pub mod logging;
