//! Object storage abstraction
//!
//! The backoffice keeps lesson media and gallery images in a hosted object
//! store. Everything above this module talks to [`ObjectStore`]; the CLI
//! provides the HTTP implementation and [`MemoryStore`] backs tests.

pub mod memory;

pub use memory::{MemoryStore, StoredObject};

use async_trait::async_trait;
use bytes::Bytes;
use gambit_types::{SortBy, StorageEntry};

use crate::error::Result;

/// Page size used for a single folder listing
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Options for a single folder listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub sort_by: SortBy,
}

impl ListOptions {
    /// Newest entries first, at most `limit` of them
    pub fn newest_first(limit: usize) -> Self {
        Self {
            limit,
            sort_by: SortBy::newest_first(),
        }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::newest_first(DEFAULT_LIST_LIMIT)
    }
}

/// Object storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the direct children of `folder` (empty string for the bucket root).
    ///
    /// Subfolders are returned as entries without an id.
    async fn list(
        &self,
        bucket: &str,
        folder: &str,
        options: &ListOptions,
    ) -> Result<Vec<StorageEntry>>;

    /// Publicly resolvable URL of an object. Does not touch the network.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Store `data` at `path` and return the stored path
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String>;

    /// Delete the given object paths
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;
}

/// Strip leading and trailing slashes from a folder path
pub fn normalize_folder(folder: &str) -> &str {
    folder.trim_matches('/')
}

/// Join a folder and an entry name, yielding the bare name at the root
pub fn join_path(folder: &str, name: &str) -> String {
    let folder = normalize_folder(folder);
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}
