//! Utility functions and helpers for the dongju gateway.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and log redaction of image payloads.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
