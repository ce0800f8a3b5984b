//! REST resource client

use super::{HttpConfig, MEMBERSHIP_HEADER, REST_API_VERSION};
use crate::domain::model::{CapacityPool, VolumeFlavor};
use crate::domain::ports::ResourceClient;
use crate::domain::remote::{
    ErrorBody, NewVolume, NewVolumeAttachment, RemoteVolume, RemoteVolumeAttachment,
};
use crate::domain::session::Session;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// Body the service sends instead of JSON once a token lapses
const TOKEN_EXPIRED_BODY: &str = "Token is expired";

const VOLUMES: &str = "volumes";
const VOLUME_ATTACHMENTS: &str = "volume-attachments";
const VOLUME_FLAVORS: &str = "volume-flavors";
const CAPACITY_POOLS: &str = "capacity-pools";

/// Map a raw response onto success or a classified error.
///
/// Expiry is recognised before the status code is considered, so an
/// expired token never surfaces as a generic remote failure.
pub fn classify_response(operation: &str, status: u16, body: &str) -> Result<()> {
    if body.trim() == TOKEN_EXPIRED_BODY || status == StatusCode::UNAUTHORIZED.as_u16() {
        return Err(Error::TokenExpired);
    }

    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("status code {}", status)
                } else {
                    trimmed.to_string()
                }
            });
        return Err(Error::RemoteCall {
            operation: operation.to_string(),
            status,
            message,
        });
    }

    Ok(())
}

/// Decode a success body; an undecodable one is a session failure
pub fn decode_body<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        debug!("{}: undecodable response: {}", operation, e);
        Error::UndefinedResponse {
            operation: operation.to_string(),
        }
    })
}

/// [`ResourceClient`] over HTTPS
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
}

impl RestClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    fn url(session: &Session, collection: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!(
                "{}{}/{}/{}",
                session.base_url,
                REST_API_VERSION,
                collection,
                urlencoding::encode(id)
            ),
            None => format!("{}{}/{}", session.base_url, REST_API_VERSION, collection),
        }
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        operation: &str,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<String> {
        let token = session.bearer()?;
        debug!("{} {} {}", operation, method, url);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header(MEMBERSHIP_HEADER, &session.membership_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("{} failed to reach {}: {}", operation, url, e);
            Error::Transport(e)
        })?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        classify_response(operation, status, &text)?;
        Ok(text)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &Session,
        operation: &str,
        url: String,
    ) -> Result<T> {
        let body = self
            .call::<()>(session, operation, Method::GET, url, None)
            .await?;
        decode_body(operation, &body)
    }
}

#[async_trait]
impl ResourceClient for RestClient {
    async fn create_volume(&self, session: &Session, volume: &NewVolume) -> Result<RemoteVolume> {
        let operation = "Create volume";
        let url = Self::url(session, VOLUMES, None);
        let body = self
            .call(session, operation, Method::POST, url, Some(volume))
            .await?;
        decode_body(operation, &body)
    }

    async fn get_volume(&self, session: &Session, volume_id: &str) -> Result<RemoteVolume> {
        self.fetch(session, "Get volume", Self::url(session, VOLUMES, Some(volume_id)))
            .await
    }

    async fn delete_volume(&self, session: &Session, volume_id: &str) -> Result<()> {
        let url = Self::url(session, VOLUMES, Some(volume_id));
        self.call::<()>(session, "Delete volume", Method::DELETE, url, None)
            .await
            .map(|_| ())
    }

    async fn list_volumes(&self, session: &Session) -> Result<Vec<RemoteVolume>> {
        self.fetch(session, "List volumes", Self::url(session, VOLUMES, None))
            .await
    }

    async fn create_volume_attachment(
        &self,
        session: &Session,
        attachment: &NewVolumeAttachment,
    ) -> Result<RemoteVolumeAttachment> {
        let operation = "Create volume attachment";
        let url = Self::url(session, VOLUME_ATTACHMENTS, None);
        let body = self
            .call(session, operation, Method::POST, url, Some(attachment))
            .await?;
        decode_body(operation, &body)
    }

    async fn get_volume_attachment(
        &self,
        session: &Session,
        attachment_id: &str,
    ) -> Result<RemoteVolumeAttachment> {
        let url = Self::url(session, VOLUME_ATTACHMENTS, Some(attachment_id));
        self.fetch(session, "Get volume attachment", url).await
    }

    async fn delete_volume_attachment(&self, session: &Session, attachment_id: &str) -> Result<()> {
        let url = Self::url(session, VOLUME_ATTACHMENTS, Some(attachment_id));
        self.call::<()>(session, "Delete volume attachment", Method::DELETE, url, None)
            .await
            .map(|_| ())
    }

    async fn list_volume_attachments(
        &self,
        session: &Session,
    ) -> Result<Vec<RemoteVolumeAttachment>> {
        let url = Self::url(session, VOLUME_ATTACHMENTS, None);
        self.fetch(session, "List volume attachments", url).await
    }

    async fn list_volume_flavors(&self, session: &Session) -> Result<Vec<VolumeFlavor>> {
        let url = Self::url(session, VOLUME_FLAVORS, None);
        self.fetch(session, "List volume flavors", url).await
    }

    async fn list_capacity_pools(&self, session: &Session) -> Result<Vec<CapacityPool>> {
        let url = Self::url(session, CAPACITY_POOLS, None);
        self.fetch(session, "List capacity pools", url).await
    }

    async fn get_capacity_pool(&self, session: &Session, pool_id: &str) -> Result<CapacityPool> {
        let url = Self::url(session, CAPACITY_POOLS, Some(pool_id));
        self.fetch(session, "Get capacity pool", url).await
    }
}
