use std::path::Path;

use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verdict for one uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoResult {
    /// Worker status code.
    pub response: u8,
    /// Name to pass to [`GatewayClient::fetch_photo`].
    pub output: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("photo {0:?} not found")]
    NotFound(String),

    #[error("gateway returned error status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self::with_client(Client::new(), gateway_url)
    }

    pub fn with_client(client: Client, gateway_url: &str) -> Self {
        Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a file from disk.
    pub async fn send_photo(&self, path: &Path, mode: &str) -> Result<PhotoResult, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo")
            .to_string();
        self.send_photo_bytes(bytes, &file_name, mode).await
    }

    /// Upload in-memory image bytes.
    pub async fn send_photo_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mode: &str,
    ) -> Result<PhotoResult, ClientError> {
        let form = multipart::Form::new()
            .text("type", mode.to_string())
            .part("photo", multipart::Part::bytes(bytes).file_name(file_name.to_string()));

        let resp = self
            .client
            .post(format!("{}/send_photo", self.gateway_url))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(resp.json::<PhotoResult>().await?)
    }

    /// Download a processed photo.
    pub async fn fetch_photo(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .client
            .get(format!("{}/photo/{}", self.gateway_url, name))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(name.to_string())),
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                Err(ClientError::Status { status, body })
            }
            _ => Ok(resp.bytes().await?.to_vec()),
        }
    }
}
