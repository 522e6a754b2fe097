//! # deltaT Common Library
//!
//! Shared code for the deltaT synchronisation tools:
//! - Error and result types
//! - Bootstrap configuration loading (TOML file, environment overrides)
//! - The time model mapping a time index onto an elapsed time

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::{elapsed_time, ElapsedTime, Interval, TimeUnit};
