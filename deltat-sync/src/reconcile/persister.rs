//! Batch persister: one atomic save per image

use super::ImageContext;
use crate::error::SyncError;
use crate::model::PlaneInfo;
use crate::remote::RemoteSession;
use tracing::{debug, info};

/// Save the reconciled records of one image as a single batch
///
/// Returns the number of records written. An empty set is not sent.
///
/// # Errors
/// `SyncError::PersistFailure` if the batch write fails. The records are
/// dropped by the caller; nothing is retried.
pub async fn persist_plane_infos<S>(
    session: &mut S,
    ctx: &ImageContext,
    records: &[PlaneInfo],
) -> Result<usize, SyncError>
where
    S: RemoteSession + ?Sized,
{
    if records.is_empty() {
        debug!(image_id = ctx.image_id, "No PlaneInfo records to save");
        return Ok(0);
    }

    info!(image_id = ctx.image_id, records = records.len(), "Saving PlaneInfo records");

    session
        .save_plane_infos(records)
        .await
        .map_err(|source| SyncError::PersistFailure {
            owner: ctx.owner.clone(),
            dataset_id: ctx.dataset_id,
            image_id: ctx.image_id,
            records: records.len(),
            source,
        })?;

    Ok(records.len())
}
