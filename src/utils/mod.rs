//! Utility modules for common functionality
//!
//! Provides output handling and environment helpers.

pub mod env;
pub mod io;

pub use env::EnvUtils;
pub use io::{Io, Output, Verbosity};
