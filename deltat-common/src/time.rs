//! Time model for per-timepoint acquisition metadata
//!
//! Maps a zero-based time index onto the elapsed time since acquisition start.
//! The same function is used when records are created and when they are
//! rewritten, so repeated runs converge on identical values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default spacing between consecutive timepoints, in seconds
pub const DEFAULT_INTERVAL_SECONDS: f64 = 300.0;

/// Unit attached to an elapsed-time value
///
/// Only `Second` is ever written. The others exist so that records stored
/// by other tools still deserialize and can be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Minute,
    Hour,
    Day,
    /// Any unit name not listed above
    #[serde(other)]
    Other,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "µs",
            TimeUnit::Nanosecond => "ns",
            TimeUnit::Minute => "min",
            TimeUnit::Hour => "h",
            TimeUnit::Day => "d",
            TimeUnit::Other => "?",
        };
        write!(f, "{}", symbol)
    }
}

/// Elapsed time since acquisition start (deltaT)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub value: f64,
    pub unit: TimeUnit,
}

impl ElapsedTime {
    pub fn seconds(value: f64) -> Self {
        Self {
            value,
            unit: TimeUnit::Second,
        }
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// Fixed spacing between timepoints
///
/// Always finite and strictly positive, and small enough that
/// `elapsed_time` stays finite for every `u32` index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval(f64);

impl Interval {
    /// Validate and wrap an interval given in seconds
    pub fn from_seconds(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::Config(format!(
                "interval must be a positive number of seconds, got {}",
                seconds
            )));
        }
        if !(f64::from(u32::MAX) * seconds).is_finite() {
            return Err(Error::Config(format!(
                "interval of {} seconds overflows the elapsed time of the last timepoint",
                seconds
            )));
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL_SECONDS)
    }
}

/// Elapsed time of timepoint `the_t` for a fixed `interval`
///
/// `elapsed_time(t, Δ) = t * Δ`, in seconds.
pub fn elapsed_time(the_t: u32, interval: Interval) -> ElapsedTime {
    ElapsedTime::seconds(f64::from(the_t) * interval.seconds())
}
