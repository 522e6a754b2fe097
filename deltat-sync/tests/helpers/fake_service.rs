//! In-memory metadata service
//!
//! Implements `Connector`/`RemoteSession` over shared state so tests can seed
//! datasets, images and PlaneInfo records, inject failures, and inspect what
//! was saved and which sessions were closed.

use async_trait::async_trait;
use deltat_common::ElapsedTime;
use deltat_sync::model::{Credentials, Dataset, Image, PlaneInfo};
use deltat_sync::remote::{Connector, RemoteSession};
use deltat_sync::RemoteError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeState {
    pub users: HashSet<String>,
    pub password: String,
    pub datasets: Vec<Dataset>,
    pub links: HashMap<i64, Vec<i64>>,
    pub images: HashMap<i64, Image>,
    pub plane_infos: Vec<PlaneInfo>,
    pub next_id: i64,
    pub fail_query_pixels: HashSet<i64>,
    pub fail_save_pixels: HashSet<i64>,
    pub fail_close: bool,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub save_calls: usize,
}

#[derive(Clone)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

pub fn image(id: i64, pixels_id: i64, size_t: u32) -> Image {
    Image {
        id,
        name: Some(format!("image-{}", id)),
        pixels_id,
        size_t,
    }
}

/// Saved record at z=0/c=0 with an arbitrary old deltaT
pub fn stale_plane_info(id: i64, pixels_id: i64, the_t: u32, seconds: f64) -> PlaneInfo {
    let mut info = PlaneInfo::new(pixels_id, the_t, ElapsedTime::seconds(seconds));
    info.id = Some(id);
    info
}

impl FakeConnector {
    pub fn new(password: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                password: password.to_string(),
                next_id: 10_000,
                ..Default::default()
            })),
        }
    }

    pub fn add_user(&self, owner: &str) -> &Self {
        self.state.lock().unwrap().users.insert(owner.to_string());
        self
    }

    pub fn add_dataset(
        &self,
        owner: &str,
        dataset_id: i64,
        name: &str,
        images: Vec<Image>,
    ) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.users.insert(owner.to_string());
        state.datasets.push(Dataset {
            id: dataset_id,
            name: name.to_string(),
            owner: Some(owner.to_string()),
        });
        let ids = images.iter().map(|i| i.id).collect();
        state.links.insert(dataset_id, ids);
        for image in images {
            state.images.insert(image.id, image);
        }
        self
    }

    /// Link an image id that has no image behind it
    pub fn add_dangling_link(&self, dataset_id: i64, image_id: i64) -> &Self {
        self.state
            .lock()
            .unwrap()
            .links
            .entry(dataset_id)
            .or_default()
            .push(image_id);
        self
    }

    pub fn add_plane_infos(&self, records: Vec<PlaneInfo>) -> &Self {
        self.state.lock().unwrap().plane_infos.extend(records);
        self
    }

    pub fn fail_query(&self, pixels_id: i64) -> &Self {
        self.state.lock().unwrap().fail_query_pixels.insert(pixels_id);
        self
    }

    pub fn fail_save(&self, pixels_id: i64) -> &Self {
        self.state.lock().unwrap().fail_save_pixels.insert(pixels_id);
        self
    }

    /// Every logout is counted but answered with a transport error
    pub fn fail_close(&self) -> &Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    /// Stored records of one pixels, ordered by time index
    pub fn stored(&self, pixels_id: i64) -> Vec<PlaneInfo> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<PlaneInfo> = state
            .plane_infos
            .iter()
            .filter(|r| r.pixels_id == pixels_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.the_t);
        records
    }

    /// deltaT values of one pixels, ordered by time index
    pub fn stored_deltas(&self, pixels_id: i64) -> Vec<f64> {
        self.stored(pixels_id)
            .iter()
            .map(|r| r.delta_t.map(|d| d.value).unwrap_or(f64::NAN))
            .collect()
    }

    pub fn sessions(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.sessions_opened, state.sessions_closed)
    }

    pub fn save_calls(&self) -> usize {
        self.state.lock().unwrap().save_calls
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn authenticate(&self, credentials: &Credentials) -> Result<FakeSession, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains(&credentials.username) || state.password != credentials.password {
            return Err(RemoteError::Unauthorized(credentials.username.clone()));
        }
        state.sessions_opened += 1;
        Ok(FakeSession {
            state: Arc::clone(&self.state),
            closed: false,
        })
    }
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    closed: bool,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn find_datasets(
        &mut self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<Dataset>, RemoteError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .datasets
            .iter()
            .filter(|d| d.name == name && d.owner.as_deref() == Some(owner))
            .cloned()
            .collect())
    }

    async fn list_image_ids(&mut self, dataset_id: i64) -> Result<Vec<i64>, RemoteError> {
        let state = self.state.lock().unwrap();
        Ok(state.links.get(&dataset_id).cloned().unwrap_or_default())
    }

    async fn get_image(&mut self, image_id: i64) -> Result<Image, RemoteError> {
        let state = self.state.lock().unwrap();
        state
            .images
            .get(&image_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("/images/{}", image_id)))
    }

    async fn query_plane_infos(
        &mut self,
        pixels_id: i64,
        the_z: u32,
        the_c: u32,
    ) -> Result<Vec<PlaneInfo>, RemoteError> {
        let state = self.state.lock().unwrap();
        if state.fail_query_pixels.contains(&pixels_id) {
            return Err(RemoteError::ApiError(503, "query service unavailable".to_string()));
        }
        Ok(state
            .plane_infos
            .iter()
            .filter(|r| r.pixels_id == pixels_id && r.the_z == the_z && r.the_c == the_c)
            .cloned()
            .collect())
    }

    async fn save_plane_infos(&mut self, records: &[PlaneInfo]) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.save_calls += 1;
        if records
            .iter()
            .any(|r| state.fail_save_pixels.contains(&r.pixels_id))
        {
            return Err(RemoteError::ApiError(500, "update service failed".to_string()));
        }

        for record in records {
            let mut record = record.clone();
            match record.id {
                Some(id) => {
                    let existing = state.plane_infos.iter_mut().find(|r| r.id == Some(id));
                    if let Some(existing) = existing {
                        *existing = record;
                    } else {
                        state.plane_infos.push(record);
                    }
                }
                None => {
                    state.next_id += 1;
                    record.id = Some(state.next_id);
                    state.plane_infos.push(record);
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RemoteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut state = self.state.lock().unwrap();
        state.sessions_closed += 1;
        if state.fail_close {
            return Err(RemoteError::NetworkError("connection reset".to_string()));
        }
        Ok(())
    }
}
