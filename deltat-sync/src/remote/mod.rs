//! Remote metadata service contract
//!
//! `Connector` opens sessions; `RemoteSession` carries every query and write
//! for one owner identity. Sessions are passed explicitly to each call, there
//! is no process-wide connection.

pub mod gateway;

use crate::error::RemoteError;
use crate::model::{Credentials, Dataset, Image, PlaneInfo};
use async_trait::async_trait;

pub use gateway::{GatewayConnector, GatewaySession};

/// Opens authenticated sessions against the metadata service
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: RemoteSession;

    /// Establish a session for one owner identity
    ///
    /// # Errors
    /// `RemoteError::Unauthorized` for rejected credentials, `NetworkError`
    /// when the host is unreachable.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Self::Session, RemoteError>;
}

/// Authenticated session; every call is issued serially
#[async_trait]
pub trait RemoteSession: Send {
    /// Datasets named `name` owned by `owner` (possibly empty)
    async fn find_datasets(
        &mut self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<Dataset>, RemoteError>;

    /// Ids of images linked to a dataset
    async fn list_image_ids(&mut self, dataset_id: i64) -> Result<Vec<i64>, RemoteError>;

    /// Image with pixel-plane id and number of timepoints
    async fn get_image(&mut self, image_id: i64) -> Result<Image, RemoteError>;

    /// PlaneInfo records of one pixel-plane restricted to `the_z` / `the_c`
    async fn query_plane_infos(
        &mut self,
        pixels_id: i64,
        the_z: u32,
        the_c: u32,
    ) -> Result<Vec<PlaneInfo>, RemoteError>;

    /// Save records as one atomic batch
    async fn save_plane_infos(&mut self, records: &[PlaneInfo]) -> Result<(), RemoteError>;

    /// Release the server-side session
    async fn close(&mut self) -> Result<(), RemoteError>;
}
