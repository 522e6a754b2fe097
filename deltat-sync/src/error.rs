//! Error types for deltat-sync
//!
//! `RemoteError` describes what went wrong talking to the metadata service.
//! `SyncError` places that failure in the unit of work it aborted (one owner
//! identity or one image) so it can be reported and the run can continue.

use thiserror::Error;

/// Remote metadata service errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Failure of one unit of work during a synchronisation run
///
/// Owner-level kinds abort the remaining work for that owner; image-level
/// kinds abort only the image.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Session could not be established for an owner identity
    #[error("Authentication failed for {owner}: {source}")]
    AuthenticationFailure {
        owner: String,
        #[source]
        source: RemoteError,
    },

    /// Dataset or image not found
    #[error("Lookup failed for {owner} ({target}): {source}")]
    LookupFailure {
        owner: String,
        target: LookupTarget,
        #[source]
        source: RemoteError,
    },

    /// Temporal metadata query failed
    #[error("Query failed for {owner} dataset {dataset_id} image {image_id}: {source}")]
    QueryFailure {
        owner: String,
        dataset_id: i64,
        image_id: i64,
        #[source]
        source: RemoteError,
    },

    /// Batch write failed
    #[error("Save of {records} records failed for {owner} dataset {dataset_id} image {image_id}: {source}")]
    PersistFailure {
        owner: String,
        dataset_id: i64,
        image_id: i64,
        records: usize,
        #[source]
        source: RemoteError,
    },
}

/// What a `LookupFailure` was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    Dataset { name: String },
    ImageList { dataset_id: i64 },
    Image { dataset_id: i64, image_id: i64 },
}

impl std::fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupTarget::Dataset { name } => write!(f, "dataset '{}'", name),
            LookupTarget::ImageList { dataset_id } => {
                write!(f, "images of dataset {}", dataset_id)
            }
            LookupTarget::Image {
                dataset_id,
                image_id,
            } => write!(f, "dataset {} image {}", dataset_id, image_id),
        }
    }
}

impl SyncError {
    /// Owner identity the failed unit of work belonged to
    pub fn owner(&self) -> &str {
        match self {
            SyncError::AuthenticationFailure { owner, .. }
            | SyncError::LookupFailure { owner, .. }
            | SyncError::QueryFailure { owner, .. }
            | SyncError::PersistFailure { owner, .. } => owner,
        }
    }

    /// Short kind label for logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::AuthenticationFailure { .. } => "authentication",
            SyncError::LookupFailure { .. } => "lookup",
            SyncError::QueryFailure { .. } => "query",
            SyncError::PersistFailure { .. } => "persist",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failure_message_carries_context() {
        let err = SyncError::QueryFailure {
            owner: "user-7".to_string(),
            dataset_id: 51,
            image_id: 1204,
            source: RemoteError::ApiError(503, "unavailable".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("user-7"));
        assert!(message.contains("dataset 51"));
        assert!(message.contains("image 1204"));
        assert_eq!(err.kind(), "query");
        assert_eq!(err.owner(), "user-7");
    }

    #[test]
    fn test_lookup_target_display() {
        let target = LookupTarget::Dataset {
            name: "Condensation".to_string(),
        };
        assert_eq!(target.to_string(), "dataset 'Condensation'");
    }

    #[test]
    fn test_source_is_exposed() {
        use std::error::Error as _;
        let err = SyncError::AuthenticationFailure {
            owner: "user-2".to_string(),
            source: RemoteError::Unauthorized("bad password".to_string()),
        };
        assert!(err.source().is_some());
    }
}
