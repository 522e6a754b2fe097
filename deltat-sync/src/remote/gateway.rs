//! HTTP/JSON gateway client for the metadata service
//!
//! Routes (all JSON, session key in the `X-Session-Key` header):
//! - `POST   /api/v1/session`                        login
//! - `GET    /api/v1/datasets?owner=&name=`           dataset lookup
//! - `GET    /api/v1/datasets/{id}/images`            linked image ids
//! - `GET    /api/v1/images/{id}`                     image with pixels id and sizeT
//! - `GET    /api/v1/pixels/{pid}/planeinfos?the_z=&the_c=`
//! - `POST   /api/v1/planeinfos`                      atomic batch save
//! - `DELETE /api/v1/session`                         logout

use super::{Connector, RemoteSession};
use crate::error::RemoteError;
use crate::model::{Credentials, Dataset, Image, PlaneInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_PREFIX: &str = "/api/v1";
const USER_AGENT: &str = concat!("deltat-sync/", env!("CARGO_PKG_VERSION"));

/// Header carrying the session key on every authenticated request
pub const SESSION_HEADER: &str = "X-Session-Key";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    session_key: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    data: &'a [PlaneInfo],
}

/// Build `<scheme>://<host>:<port>`
pub fn base_url(scheme: &str, host: &str, port: u16) -> String {
    format!("{}://{}:{}", scheme, host, port)
}

/// Opens sessions against the gateway
pub struct GatewayConnector {
    http_client: reqwest::Client,
    base_url: String,
}

impl GatewayConnector {
    /// Create a connector; `timeout` of `None` leaves requests unbounded
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        let base_url: String = base_url.into();
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Connector for GatewayConnector {
    type Session = GatewaySession;

    async fn authenticate(&self, credentials: &Credentials) -> Result<GatewaySession, RemoteError> {
        let url = format!("{}{}/session", self.base_url, API_PREFIX);
        tracing::debug!(username = %credentials.username, url = %url, "Opening session");

        let response = self
            .http_client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        let response = check_status(response, &credentials.username).await?;
        let login: LoginResponse = parse_json(response).await?;

        Ok(GatewaySession {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            session_key: login.session_key,
            closed: false,
        })
    }
}

/// Authenticated gateway session
pub struct GatewaySession {
    http_client: reqwest::Client,
    base_url: String,
    session_key: String,
    closed: bool,
}

impl GatewaySession {
    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let url = self.url(path);
        tracing::trace!(url = %url, "GET");

        let response = self
            .http_client
            .get(&url)
            .header(SESSION_HEADER, &self.session_key)
            .query(query)
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        parse_json(check_status(response, path).await?).await
    }
}

#[async_trait]
impl RemoteSession for GatewaySession {
    async fn find_datasets(
        &mut self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<Dataset>, RemoteError> {
        let envelope: DataEnvelope<Dataset> = self
            .get_json(
                "/datasets",
                &[("owner", owner.to_string()), ("name", name.to_string())],
            )
            .await?;
        Ok(envelope.data)
    }

    async fn list_image_ids(&mut self, dataset_id: i64) -> Result<Vec<i64>, RemoteError> {
        let envelope: DataEnvelope<i64> = self
            .get_json(&format!("/datasets/{}/images", dataset_id), &[])
            .await?;
        Ok(envelope.data)
    }

    async fn get_image(&mut self, image_id: i64) -> Result<Image, RemoteError> {
        self.get_json(&format!("/images/{}", image_id), &[]).await
    }

    async fn query_plane_infos(
        &mut self,
        pixels_id: i64,
        the_z: u32,
        the_c: u32,
    ) -> Result<Vec<PlaneInfo>, RemoteError> {
        let envelope: DataEnvelope<PlaneInfo> = self
            .get_json(
                &format!("/pixels/{}/planeinfos", pixels_id),
                &[("the_z", the_z.to_string()), ("the_c", the_c.to_string())],
            )
            .await?;
        Ok(envelope.data)
    }

    async fn save_plane_infos(&mut self, records: &[PlaneInfo]) -> Result<(), RemoteError> {
        let url = self.url("/planeinfos");
        tracing::debug!(url = %url, records = records.len(), "Saving PlaneInfo batch");

        let response = self
            .http_client
            .post(&url)
            .header(SESSION_HEADER, &self.session_key)
            .json(&SaveRequest { data: records })
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        check_status(response, "/planeinfos").await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RemoteError> {
        if self.closed {
            return Ok(());
        }
        // The key is unusable after a logout attempt either way
        self.closed = true;
        let url = self.url("/session");

        let response = self
            .http_client
            .delete(&url)
            .header(SESSION_HEADER, &self.session_key)
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        check_status(response, "/session").await?;
        Ok(())
    }
}

async fn check_status(
    response: reqwest::Response,
    subject: &str,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(RemoteError::Unauthorized(subject.to_string()));
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(subject.to_string()));
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(RemoteError::ApiError(status.as_u16(), error_text));
    }

    Ok(response)
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    response
        .json()
        .await
        .map_err(|e| RemoteError::ParseError(e.to_string()))
}
