//! Per-image reconciliation of temporal metadata
//!
//! locate → reconcile → persist. Each step works on one image and keeps no
//! state between images.

pub mod locator;
pub mod persister;
pub mod reconciler;

pub use locator::locate_plane_infos;
pub use persister::persist_plane_infos;
pub use reconciler::{PlaneInfoState, Reconciler, Reconciliation};

/// Identifies the image being processed in logs and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContext {
    pub owner: String,
    pub dataset_id: i64,
    pub image_id: i64,
}

impl ImageContext {
    pub fn new(owner: impl Into<String>, dataset_id: i64, image_id: i64) -> Self {
        Self {
            owner: owner.into(),
            dataset_id,
            image_id,
        }
    }
}
