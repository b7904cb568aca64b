//! Panel screenshot acquisition: fetch a rendered image from Grafana,
//! push it to the chat backend and resolve a publicly reachable URL for it.
//!
//! None of the outbound calls are idempotent (every upload creates a new
//! remote file), so callers must not blindly retry a failed resolution.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, multipart};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{GrafanaConfig, SLACK_API_BASE, Secret};
use crate::html;

const IMAGE_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("render fetch failed: status {status}")]
    RenderFetchFailed { status: u16 },
    #[error("upload failed, image: {file_name}, reason: {reason}")]
    UploadFailed { file_name: String, reason: String },
    #[error("share failed: {reason}")]
    ShareFailed { reason: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Remote handle of an uploaded image file.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub id: String,
    pub name: String,
}

/// File hosting side of the chat backend. Keeping it behind a trait keeps
/// the backend a swappable collaborator of the resolver.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads image bytes under `file_name` and returns the remote handle.
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str)
    -> Result<UploadedImage, ImageError>;

    /// Makes the uploaded file public and returns its share-page URL.
    async fn shared_public_url(&self, image: &UploadedImage) -> Result<String, ImageError>;
}

#[derive(Debug, Deserialize)]
struct SlackFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    permalink_public: String,
}

#[derive(Debug, Deserialize)]
struct SlackFileResponse {
    ok: bool,
    #[serde(default)]
    error: String,
    file: Option<SlackFile>,
}

/// Slack file host speaking the `files.upload` / `files.sharedPublicURL`
/// Web API endpoints directly.
pub struct SlackImageHost {
    client: Client,
    api_base: String,
    token: Secret,
}

impl SlackImageHost {
    pub fn new(token: Secret) -> Self {
        Self::with_api_base(token, SLACK_API_BASE)
    }

    pub fn with_api_base(token: Secret, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            token,
        }
    }
}

#[async_trait]
impl ImageHost for SlackImageHost {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadedImage, ImageError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("filename", file_name.to_string())
            .text("filetype", IMAGE_EXTENSION);

        let response = self
            .client
            .post(format!("{}/files.upload", self.api_base))
            .bearer_auth(self.token.expose())
            .multipart(form)
            .send()
            .await?;
        let body: SlackFileResponse = response.json().await?;

        if !body.ok {
            // Report the partial remote name when the API returned one.
            let partial = body.file.map(|f| f.name).unwrap_or_default();
            return Err(ImageError::UploadFailed {
                file_name: if partial.is_empty() {
                    file_name.to_string()
                } else {
                    partial
                },
                reason: body.error,
            });
        }
        let file = body.file.ok_or_else(|| ImageError::UploadFailed {
            file_name: file_name.to_string(),
            reason: "response carried no file object".to_string(),
        })?;
        Ok(UploadedImage {
            id: file.id,
            name: file.name,
        })
    }

    async fn shared_public_url(&self, image: &UploadedImage) -> Result<String, ImageError> {
        let response = self
            .client
            .post(format!("{}/files.sharedPublicURL", self.api_base))
            .bearer_auth(self.token.expose())
            .json(&serde_json::json!({ "file": image.id }))
            .send()
            .await?;
        let body: SlackFileResponse = response.json().await?;

        if !body.ok {
            return Err(ImageError::ShareFailed { reason: body.error });
        }
        let permalink = body.file.map(|f| f.permalink_public).unwrap_or_default();
        if permalink.is_empty() {
            return Err(ImageError::ShareFailed {
                reason: "response carried no public permalink".to_string(),
            });
        }
        Ok(permalink)
    }
}

/// Resolves a render URL into a publicly shareable image URL.
pub struct ImageResolver {
    client: Client,
    host: Box<dyn ImageHost>,
    render_token: Secret,
}

impl ImageResolver {
    /// Builds a resolver for the configured Slack workspace and Grafana
    /// instance.
    pub fn from_config(config: &GrafanaConfig) -> Result<Self, ImageError> {
        if config.slack_token.is_empty() {
            return Err(ImageError::InvalidConfiguration(
                "slack upload token is empty".to_string(),
            ));
        }
        let host = SlackImageHost::with_api_base(
            config.slack_token.clone(),
            config.slack_api_base.clone(),
        );
        Self::with_host(Box::new(host), config.grafana_token.clone())
    }

    /// Builds a resolver over an arbitrary image host.
    pub fn with_host(host: Box<dyn ImageHost>, render_token: Secret) -> Result<Self, ImageError> {
        if render_token.is_empty() {
            return Err(ImageError::InvalidConfiguration(
                "grafana render token is empty".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            host,
            render_token,
        })
    }

    /// Fetches the rendered panel, uploads it and scrapes the share page
    /// for the public image URL.
    ///
    /// `Ok("")` means the share page exposed no image; the caller is
    /// expected to drop the image block rather than fail the message.
    pub async fn resolve_image(&self, render_url: &str) -> Result<String, ImageError> {
        let response = self
            .client
            .get(render_url)
            .bearer_auth(self.render_token.expose())
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(ImageError::RenderFetchFailed {
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?.to_vec();

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), IMAGE_EXTENSION);
        let uploaded = self.host.upload_image(bytes, &file_name).await?;
        tracing::debug!(file = %uploaded.name, "uploaded rendered panel");

        let share_url = self.host.shared_public_url(&uploaded).await?;

        let page = self.client.get(&share_url).send().await?;
        if page.status() != StatusCode::OK {
            tracing::warn!(status = %page.status(), "share page returned non-200");
        }
        let body = page.text().await?;
        Ok(html::find_meta_content(&body, "og:image").unwrap_or_default())
    }
}
