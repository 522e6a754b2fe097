//! Run statistics
//!
//! Per-owner and per-image outcomes are folded into a `RunSummary` that is
//! logged at the end of the run.

use crate::error::{LookupTarget, SyncError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of reconciling one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageOutcome {
    /// CREATE path: `records` built, `written` saved
    Created { records: usize, written: usize },
    /// UPDATE path: `records` rewritten, `written` saved
    Updated { records: usize, written: usize },
}

impl ImageOutcome {
    pub fn written(&self) -> usize {
        match self {
            ImageOutcome::Created { written, .. } | ImageOutcome::Updated { written, .. } => {
                *written
            }
        }
    }
}

/// One image of an owner's dataset
#[derive(Debug)]
pub struct ImageReport {
    pub image_id: i64,
    pub result: Result<ImageOutcome, SyncError>,
}

/// Everything that happened for one owner identity
#[derive(Debug)]
pub struct OwnerReport {
    pub owner: String,
    pub dataset_id: Option<i64>,
    pub images: Vec<ImageReport>,
    /// Failure that stopped work for this owner before or between images
    pub error: Option<SyncError>,
}

impl OwnerReport {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            dataset_id: None,
            images: Vec::new(),
            error: None,
        }
    }

    pub fn failed_images(&self) -> usize {
        self.images.iter().filter(|i| i.result.is_err()).count()
    }
}

/// Failure kept for manual follow-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub kind: &'static str,
    pub owner: String,
    pub dataset_id: Option<i64>,
    pub image_id: Option<i64>,
    pub message: String,
}

impl FailureRecord {
    fn from_error(err: &SyncError) -> Self {
        let (dataset_id, image_id) = match err {
            SyncError::AuthenticationFailure { .. } => (None, None),
            SyncError::LookupFailure { target, .. } => match target {
                LookupTarget::Dataset { .. } => (None, None),
                LookupTarget::ImageList { dataset_id } => (Some(*dataset_id), None),
                LookupTarget::Image {
                    dataset_id,
                    image_id,
                } => (Some(*dataset_id), Some(*image_id)),
            },
            SyncError::QueryFailure {
                dataset_id,
                image_id,
                ..
            }
            | SyncError::PersistFailure {
                dataset_id,
                image_id,
                ..
            } => (Some(*dataset_id), Some(*image_id)),
        };

        Self {
            kind: err.kind(),
            owner: err.owner().to_string(),
            dataset_id,
            image_id,
            message: err.to_string(),
        }
    }
}

/// Aggregate over a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub owners_attempted: usize,
    /// Owners without an owner-level failure, even if some of their images failed
    pub owners_succeeded: usize,
    pub owners_failed: usize,
    pub images_created: usize,
    pub images_updated: usize,
    pub images_failed: usize,
    pub records_written: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, dry_run: bool) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            owners_attempted: 0,
            owners_succeeded: 0,
            owners_failed: 0,
            images_created: 0,
            images_updated: 0,
            images_failed: 0,
            records_written: 0,
            failures: Vec::new(),
        }
    }

    /// Fold one owner's report into the totals
    pub fn record_owner(&mut self, report: &OwnerReport) {
        self.owners_attempted += 1;

        match &report.error {
            Some(err) => {
                self.owners_failed += 1;
                self.failures.push(FailureRecord::from_error(err));
            }
            None => self.owners_succeeded += 1,
        }

        for image in &report.images {
            match &image.result {
                Ok(outcome) => {
                    match outcome {
                        ImageOutcome::Created { .. } => self.images_created += 1,
                        ImageOutcome::Updated { .. } => self.images_updated += 1,
                    }
                    self.records_written += outcome.written();
                }
                Err(err) => {
                    self.images_failed += 1;
                    self.failures.push(FailureRecord::from_error(err));
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} owners ({} succeeded, {} failed), images: {} created, {} updated, {} failed, \
             {} records written{}",
            self.owners_attempted,
            self.owners_succeeded,
            self.owners_failed,
            self.images_created,
            self.images_updated,
            self.images_failed,
            self.records_written,
            if self.dry_run { " (dry run)" } else { "" }
        )
    }
}
