//! Core types: errors, configuration, run identity, interruption.

pub mod config;
pub mod errors;
pub mod session;
pub mod signals;
