//! Command set of the `console` binary
//!
//! A small demo application exercising namespaced, aliased and lazily
//! loaded commands.

pub mod commands;

pub use commands::build_application;
