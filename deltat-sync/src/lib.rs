//! deltat-sync library interface
//!
//! Synchronises per-timepoint acquisition times (PlaneInfo deltaT) of
//! time-lapse images held by a remote image-management service.
//! Exposes public APIs for the binary and for integration testing.

pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod remote;

pub use crate::batch::{BatchOptions, BatchSynchronizer, RunSummary};
pub use crate::error::{RemoteError, SyncError};
