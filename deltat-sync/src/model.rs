//! Entities read from and written to the remote metadata service
//!
//! All of these are request-scoped copies. The remote service owns the
//! persistent state.

use deltat_common::ElapsedTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Z index addressed by synchronisation
pub const PLANE_Z: u32 = 0;

/// Channel index addressed by synchronisation
pub const PLANE_C: u32 = 0;

/// Login for one owner identity
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Named, owner-scoped collection of images
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Image with the handle to its pixel data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Image {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Pixel-plane identifier temporal metadata attaches to
    pub pixels_id: i64,
    /// Number of timepoints
    pub size_t: u32,
}

/// Elapsed time at one (z, c, t) coordinate of an image's pixels ("PlaneInfo")
///
/// Fields this tool does not interpret are carried in `extra` so an updated
/// record is written back with everything except `delta_t` untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaneInfo {
    /// Remote identity; `None` until the record has been saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub pixels_id: i64,
    pub the_z: u32,
    pub the_c: u32,
    pub the_t: u32,
    #[serde(default)]
    pub delta_t: Option<ElapsedTime>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlaneInfo {
    /// Unsaved record for timepoint `the_t` at z=0, c=0
    pub fn new(pixels_id: i64, the_t: u32, delta_t: ElapsedTime) -> Self {
        Self {
            id: None,
            pixels_id,
            the_z: PLANE_Z,
            the_c: PLANE_C,
            the_t,
            delta_t: Some(delta_t),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltat_common::TimeUnit;
    use serde_json::json;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("user-3", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user-3"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_new_plane_info_is_unsaved_origin_plane() {
        let info = PlaneInfo::new(88, 4, ElapsedTime::seconds(1200.0));
        assert_eq!(info.id, None);
        assert_eq!((info.the_z, info.the_c, info.the_t), (0, 0, 4));
        assert_eq!(info.delta_t, Some(ElapsedTime::seconds(1200.0)));
    }

    #[test]
    fn test_unknown_plane_info_fields_survive_round_trip() {
        let raw = json!({
            "id": 9001,
            "pixels_id": 88,
            "the_z": 0,
            "the_c": 0,
            "the_t": 2,
            "delta_t": { "value": 10.0, "unit": "SECOND" },
            "exposure_time": { "value": 0.05, "unit": "SECOND" },
            "position_x": 12.5
        });
        let info: PlaneInfo = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(info.id, Some(9001));
        assert_eq!(info.extra.len(), 2);
        assert_eq!(serde_json::to_value(&info).unwrap(), raw);
    }

    #[test]
    fn test_plane_info_with_non_second_delta_t() {
        let info: PlaneInfo = serde_json::from_value(json!({
            "id": 1, "pixels_id": 2, "the_z": 0, "the_c": 0, "the_t": 1,
            "delta_t": { "value": 10000.0, "unit": "MILLISECOND" }
        }))
        .unwrap();
        let delta_t = info.delta_t.unwrap();
        assert_eq!(delta_t.value, 10000.0);
        assert_eq!(delta_t.unit, TimeUnit::Millisecond);
    }

    #[test]
    fn test_plane_info_without_delta_t() {
        let info: PlaneInfo = serde_json::from_value(json!({
            "id": 1, "pixels_id": 2, "the_z": 0, "the_c": 0, "the_t": 0
        }))
        .unwrap();
        assert!(info.delta_t.is_none());
    }
}
