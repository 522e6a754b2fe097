//! Metadata locator: existing PlaneInfo records at z=0, c=0

use super::ImageContext;
use crate::error::SyncError;
use crate::model::{Image, PlaneInfo, PLANE_C, PLANE_Z};
use crate::remote::RemoteSession;
use tracing::{debug, warn};

/// Fetch the z=0, c=0 PlaneInfo records of an image's pixels
///
/// Read-only. Records the service returns outside the requested scope are
/// dropped with a warning so they can never be rewritten.
///
/// # Errors
/// `SyncError::QueryFailure` if the remote query fails. Not retried.
pub async fn locate_plane_infos<S>(
    session: &mut S,
    ctx: &ImageContext,
    image: &Image,
) -> Result<Vec<PlaneInfo>, SyncError>
where
    S: RemoteSession + ?Sized,
{
    let records = session
        .query_plane_infos(image.pixels_id, PLANE_Z, PLANE_C)
        .await
        .map_err(|source| SyncError::QueryFailure {
            owner: ctx.owner.clone(),
            dataset_id: ctx.dataset_id,
            image_id: ctx.image_id,
            source,
        })?;

    let returned = records.len();
    let records: Vec<PlaneInfo> = records
        .into_iter()
        .filter(|info| {
            info.pixels_id == image.pixels_id && info.the_z == PLANE_Z && info.the_c == PLANE_C
        })
        .collect();

    if records.len() != returned {
        warn!(
            image_id = ctx.image_id,
            pixels_id = image.pixels_id,
            dropped = returned - records.len(),
            "Ignoring PlaneInfo records outside z=0/c=0 of this pixels"
        );
    }

    debug!(
        image_id = ctx.image_id,
        pixels_id = image.pixels_id,
        found = records.len(),
        "Located PlaneInfo records"
    );

    Ok(records)
}
