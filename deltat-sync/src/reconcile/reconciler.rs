//! Reconciler: decides CREATE vs UPDATE per image
//!
//! State machine per image:
//! - `Empty` (no records located) → CREATE: one new record per timepoint
//!   `0..sizeT`, each at z=0, c=0.
//! - `Existing` (one or more records) → UPDATE: each located record gets its
//!   `delta_t` recomputed from its own `the_t`. Nothing is added or removed,
//!   even when the count differs from `sizeT`.
//!
//! Both paths use the same time model, so running twice yields identical values.

use crate::model::{Image, PlaneInfo};
use deltat_common::{elapsed_time, Interval};
use tracing::{debug, trace, warn};

/// What the locator found for one image
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneInfoState {
    Empty,
    Existing(Vec<PlaneInfo>),
}

impl From<Vec<PlaneInfo>> for PlaneInfoState {
    fn from(records: Vec<PlaneInfo>) -> Self {
        if records.is_empty() {
            PlaneInfoState::Empty
        } else {
            PlaneInfoState::Existing(records)
        }
    }
}

/// Full desired record set for one image, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Create(Vec<PlaneInfo>),
    Update(Vec<PlaneInfo>),
}

impl Reconciliation {
    pub fn records(&self) -> &[PlaneInfo] {
        match self {
            Reconciliation::Create(records) | Reconciliation::Update(records) => records,
        }
    }

    pub fn into_records(self) -> Vec<PlaneInfo> {
        match self {
            Reconciliation::Create(records) | Reconciliation::Update(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Reconciliation::Create(_))
    }
}

/// Applies one fixed interval to every image of a run
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    interval: Interval,
}

impl Reconciler {
    pub fn new(interval: Interval) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Produce the desired record set for `image` from its located state
    pub fn reconcile(&self, image: &Image, state: PlaneInfoState) -> Reconciliation {
        match state {
            PlaneInfoState::Empty => Reconciliation::Create(self.create(image)),
            PlaneInfoState::Existing(records) => {
                Reconciliation::Update(self.update(image, records))
            }
        }
    }

    fn create(&self, image: &Image) -> Vec<PlaneInfo> {
        debug!(image_id = image.id, size_t = image.size_t, "Creating PlaneInfo records");

        (0..image.size_t)
            .map(|the_t| {
                let delta_t = elapsed_time(the_t, self.interval);
                trace!(image_id = image.id, the_t, delta_t = %delta_t, "new PlaneInfo");
                PlaneInfo::new(image.pixels_id, the_t, delta_t)
            })
            .collect()
    }

    fn update(&self, image: &Image, mut records: Vec<PlaneInfo>) -> Vec<PlaneInfo> {
        if records.len() != image.size_t as usize {
            warn!(
                image_id = image.id,
                size_t = image.size_t,
                existing = records.len(),
                "Existing PlaneInfo count differs from sizeT, updating in place"
            );
        }

        for info in &mut records {
            let delta_t = elapsed_time(info.the_t, self.interval);
            trace!(
                image_id = image.id,
                the_t = info.the_t,
                the_z = info.the_z,
                delta_t = %delta_t,
                "updated PlaneInfo"
            );
            info.delta_t = Some(delta_t);
        }

        records
    }
}
