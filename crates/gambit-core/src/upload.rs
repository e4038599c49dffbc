//! Gallery uploads and removals
//!
//! Files are checked against an [`UploadPolicy`] before any request is made.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use gambit_types::FileDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::{GambitError, Result};
use crate::gallery::{cache_token, with_cache_token};
use crate::storage::{join_path, normalize_folder, ObjectStore};

/// Default upper bound for a single upload (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Content types accepted by default
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_types() -> Vec<String> {
    DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect()
}

/// Which files may be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_types: default_allowed_types(),
        }
    }
}

/// Media type without parameters, lowercased
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl UploadPolicy {
    pub fn allows(&self, content_type: &str) -> bool {
        let wanted = essence(content_type);
        self.allowed_types.iter().any(|t| essence(t) == wanted)
    }

    /// Check type and size of a file about to be uploaded
    pub fn validate(&self, content_type: &str, size: u64) -> Result<()> {
        if !self.allows(content_type) {
            return Err(GambitError::UnsupportedFileType(content_type.to_string()));
        }
        if size > self.max_bytes {
            return Err(GambitError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Unique object path for an uploaded file: `<folder>/<millis>-<id>.<ext>`
pub fn object_path(folder: Option<&str>, file_name: &str, now: DateTime<Utc>) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let stem = format!("{}-{}", now.timestamp_millis(), &id[..8]);

    let name = match std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext.to_ascii_lowercase()),
        _ => stem,
    };

    join_path(folder.unwrap_or_default(), &name)
}

/// Validates and stores gallery files
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, policy: UploadPolicy) -> Self {
        Self { store, policy }
    }

    /// Upload a file under `folder` and describe the stored object
    pub async fn upload(
        &self,
        bucket: &str,
        folder: Option<&str>,
        file_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<FileDescriptor> {
        self.policy.validate(content_type, data.len() as u64)?;

        let now = Utc::now();
        let folder = folder.map(normalize_folder).unwrap_or_default();
        let path = object_path(Some(folder), file_name, now);

        let stored = self.store.upload(bucket, &path, data, content_type).await?;
        info!("Uploaded '{}' to bucket '{}' as '{}'", file_name, bucket, stored);

        let name = stored.rsplit('/').next().unwrap_or(&stored).to_string();
        let url = with_cache_token(&self.store.public_url(bucket, &stored), &cache_token(now));

        Ok(FileDescriptor {
            name,
            folder: folder.to_string(),
            path: stored,
            url,
            created_at: now,
        })
    }

    /// Delete objects from `bucket`
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Err(GambitError::Validation(
                "No files selected for removal".to_string(),
            ));
        }

        self.store.remove(bucket, paths).await?;
        info!("Removed {} file(s) from bucket '{}'", paths.len(), bucket);
        Ok(())
    }
}
