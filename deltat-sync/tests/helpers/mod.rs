//! Test Helper Utilities
//!
//! Shared utilities for testing deltat-sync

#![allow(dead_code)]

pub mod fake_service;
pub mod log_capture;

pub use fake_service::{image, stale_plane_info, FakeConnector};
pub use log_capture::LogCapture;
