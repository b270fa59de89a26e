use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::user_service::CandidateAsset;
use crate::utils::time::{key_stamp, now};

const MIB: usize = 1024 * 1024;

/// Where uploaded bytes end up. Returns the public URL of the stored object.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;
}

/// Files on local disk, served back by the HTTP layer under `public_base_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create {}: {}", parent.display(), e)))?;
        }
        fs::write(&path, &data).await.map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to write upload");
            Error::Storage(format!("write {}: {}", path.display(), e))
        })?;
        Ok(format!("{}/{}", self.public_base_url.trim_end_matches('/'), key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Resume,
}

impl FromStr for UploadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "photo" => Ok(UploadKind::Photo),
            "resume" => Ok(UploadKind::Resume),
            other => Err(Error::BadRequest(format!(
                "Invalid upload type '{}'; expected photo or resume",
                other
            ))),
        }
    }
}

impl UploadKind {
    fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Photo => &["image/jpeg", "image/png", "image/webp"],
            UploadKind::Resume => &["application/pdf"],
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::Photo => 5 * MIB,
            UploadKind::Resume => 10 * MIB,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            UploadKind::Photo => "photos",
            UploadKind::Resume => "resumes",
        }
    }

    pub fn asset(&self) -> CandidateAsset {
        match self {
            UploadKind::Photo => CandidateAsset::Photo,
            UploadKind::Resume => CandidateAsset::Resume,
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "pdf",
    }
}

/// The declared type has to match what the bytes actually start with.
fn content_matches(content_type: &str, data: &[u8]) -> bool {
    match content_type {
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "image/webp" => data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP",
        "application/pdf" => data.starts_with(b"%PDF"),
        _ => false,
    }
}

pub fn validate_upload(kind: UploadKind, content_type: &str, data: &[u8]) -> Result<()> {
    if !kind.allowed_types().contains(&content_type) {
        return Err(Error::BadRequest(format!(
            "Unsupported file type {}; allowed: {}",
            content_type,
            kind.allowed_types().join(", ")
        )));
    }
    if data.is_empty() {
        return Err(Error::BadRequest("File is empty".into()));
    }
    if data.len() > kind.max_bytes() {
        return Err(Error::BadRequest(format!(
            "File is too large; the limit is {} MiB",
            kind.max_bytes() / MIB
        )));
    }
    if !content_matches(content_type, data) {
        return Err(Error::BadRequest(format!(
            "File content is not a valid {}",
            content_type
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredAsset {
    pub key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Validates and stores the file. Nothing reaches the store if validation fails.
    pub async fn store(
        &self,
        user_id: Uuid,
        kind: UploadKind,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredAsset> {
        validate_upload(kind, content_type, &data)?;

        let key = format!(
            "{}/{}-{}.{}",
            kind.prefix(),
            user_id,
            key_stamp(now()),
            extension_for(content_type)
        );
        let size = data.len();
        let url = self.store.put(&key, data, content_type).await?;
        tracing::info!(user_id = %user_id, key = %key, size, "upload stored");
        Ok(StoredAsset { key, url })
    }
}
