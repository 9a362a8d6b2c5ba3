use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CloudinaryConfig, Config};
use crate::error::{Error, Result};
use crate::utils::validation::sanitize_file_name;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Where an image ends up and how the host should resize it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    CarImage,
    ProfileImage,
}

impl UploadTarget {
    pub fn folder(&self) -> &'static str {
        match self {
            UploadTarget::CarImage => "car-rental",
            UploadTarget::ProfileImage => "car-rental/profiles",
        }
    }

    pub fn transformation(&self) -> &'static str {
        match self {
            UploadTarget::CarImage => "c_limit,h_300,w_500",
            UploadTarget::ProfileImage => "c_fill,h_500,w_500",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the image and returns the public URL clients should use.
    async fn upload(&self, target: UploadTarget, image: UploadedImage) -> Result<String>;

    /// Removes a previously uploaded image. Unknown URLs are ignored.
    async fn destroy(&self, url: &str) -> Result<()>;
}

pub fn media_store_from_config(config: &Config) -> Arc<dyn MediaStore> {
    match &config.cloudinary {
        Some(cloudinary) => {
            info!(cloud = %cloudinary.cloud_name, "Using Cloudinary media store");
            Arc::new(CloudinaryMedia::new(cloudinary.clone()))
        }
        None => {
            info!(dir = %config.uploads_dir, "Cloudinary not configured, storing images on disk");
            Arc::new(LocalMedia::new(
                config.uploads_dir.clone(),
                config.public_base_url.clone(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

#[derive(Clone)]
pub struct CloudinaryMedia {
    client: Client,
    config: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryMedia {
    pub fn new(config: CloudinaryConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: format!("https://api.cloudinary.com/v1_1/{}", config.cloud_name),
            config,
        }
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    async fn error_message(resp: reqwest::Response) -> String {
        let status = resp.status();
        match resp.json::<CloudinaryErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("unexpected status {}", status),
        }
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as a
/// query string, suffixed with the API secret, hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// `https://res.cloudinary.com/demo/image/upload/v1712/car-rental/abc.jpg`
/// -> `car-rental/abc`
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/upload/")?;
    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .first()
        .is_some_and(|s| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit()))
    {
        segments.remove(0);
    }
    let last = segments.pop()?;
    let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
    segments.push(stem);
    Some(segments.join("/"))
}

#[async_trait]
impl MediaStore for CloudinaryMedia {
    async fn upload(&self, target: UploadTarget, image: UploadedImage) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let folder = target.folder();
        let transformation = target.transformation();
        let signature = self.sign(&[
            ("folder", folder),
            ("timestamp", &timestamp),
            ("transformation", transformation),
        ]);

        let mut file_part =
            multipart::Part::bytes(image.data.to_vec()).file_name(image.file_name.clone());
        if let Some(mime) = image.content_type.as_deref() {
            file_part = file_part.mime_str(mime)?;
        }

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("transformation", transformation)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let resp = self
            .client
            .post(format!("{}/image/upload", self.api_base))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = Self::error_message(resp).await;
            warn!(file = %image.file_name, "Cloudinary upload rejected: {}", message);
            return Err(Error::MediaHost(message));
        }

        let body: CloudinaryUploadResponse = resp.json().await?;
        info!(url = %body.secure_url, "Uploaded image to Cloudinary");
        Ok(body.secure_url)
    }

    async fn destroy(&self, url: &str) -> Result<()> {
        let Some(public_id) = public_id_from_url(url) else {
            warn!(url, "Not a Cloudinary URL, skipping destroy");
            return Ok(());
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", &public_id), ("timestamp", &timestamp)]);

        let resp = self
            .client
            .post(format!("{}/image/destroy", self.api_base))
            .form(&[
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::MediaHost(Self::error_message(resp).await));
        }

        let body: CloudinaryDestroyResponse = resp.json().await?;
        info!(public_id = %public_id, result = %body.result, "Destroyed Cloudinary image");
        Ok(())
    }
}

/// Stores uploads under `root` and hands out `/uploads/...` URLs, which the
/// router serves statically.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    root: PathBuf,
    base_url: String,
}

impl LocalMedia {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let (_, relative) = url.split_once("/uploads/")?;
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMedia {
    async fn upload(&self, target: UploadTarget, image: UploadedImage) -> Result<String> {
        let folder = target.folder();
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            &uuid::Uuid::new_v4().simple().to_string()[..8],
            sanitize_file_name(&image.file_name)
        );
        tokio::fs::write(dir.join(&file_name), &image.data).await?;

        Ok(format!("{}/uploads/{}/{}", self.base_url, folder, file_name))
    }

    async fn destroy(&self, url: &str) -> Result<()> {
        let Some(path) = self.path_for_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
