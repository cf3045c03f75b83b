//! Shared utilities for the Vein wallet core.

pub mod logging;

pub use logging::{init_logging, LogFormat};
