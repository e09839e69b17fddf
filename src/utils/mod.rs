//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod logging;
mod rate_limiter;

pub use rate_limiter::*;
