//! Gallery indexing over object storage
//!
//! Produces a flat list of files in a bucket, newest first. With a folder the
//! listing is limited to that folder; without one the whole bucket tree is
//! walked depth-first. Requests are issued one at a time and any failure
//! aborts the whole listing.

use chrono::{DateTime, Utc};
use gambit_types::{FileDescriptor, StorageEntry};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::{join_path, normalize_folder, ListOptions, ObjectStore, DEFAULT_LIST_LIMIT};

/// Query parameter appended to public URLs so replaced files are refetched
pub fn cache_token(now: DateTime<Utc>) -> String {
    format!("t={}", now.timestamp_millis())
}

/// Append a cache-busting token to `url`
pub fn with_cache_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, token)
}

/// Sort descriptors by creation time, newest first
pub fn sort_newest_first(files: &mut [FileDescriptor]) {
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Lists gallery files of a bucket
pub struct GalleryIndexer {
    store: Arc<dyn ObjectStore>,
    limit: usize,
}

impl GalleryIndexer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Page size for each folder listing. Folders holding more entries are truncated.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// List files of `bucket`, restricted to `folder` when given
    pub async fn list(&self, bucket: &str, folder: Option<&str>) -> Result<Vec<FileDescriptor>> {
        let token = cache_token(Utc::now());

        let mut files = match folder {
            Some(folder) => self.list_folder(bucket, normalize_folder(folder), &token).await?,
            None => self.list_tree(bucket, &token).await?,
        };
        sort_newest_first(&mut files);

        info!(
            "Indexed {} file(s) in bucket '{}'{}",
            files.len(),
            bucket,
            folder.map(|f| format!(" folder '{}'", f)).unwrap_or_default()
        );

        Ok(files)
    }

    async fn list_folder(
        &self,
        bucket: &str,
        folder: &str,
        token: &str,
    ) -> Result<Vec<FileDescriptor>> {
        let entries = self.fetch(bucket, folder).await?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_folder())
            .map(|entry| self.descriptor(bucket, folder, entry, token))
            .collect())
    }

    async fn list_tree(&self, bucket: &str, token: &str) -> Result<Vec<FileDescriptor>> {
        let mut pending = vec![String::new()];
        let mut files = Vec::new();

        while let Some(folder) = pending.pop() {
            let entries = self.fetch(bucket, &folder).await?;

            let mut subfolders = Vec::new();
            for entry in entries {
                if entry.is_folder() {
                    subfolders.push(join_path(&folder, &entry.name));
                } else {
                    files.push(self.descriptor(bucket, &folder, entry, token));
                }
            }

            // Reversed so subfolders are visited in listing order
            pending.extend(subfolders.into_iter().rev());
        }

        Ok(files)
    }

    async fn fetch(&self, bucket: &str, folder: &str) -> Result<Vec<StorageEntry>> {
        debug!("Listing '{}' in bucket '{}'", folder, bucket);

        let entries = self
            .store
            .list(bucket, folder, &ListOptions::newest_first(self.limit))
            .await?;

        if entries.len() >= self.limit {
            warn!(
                "Folder '{}' in bucket '{}' returned {} entries, listing may be truncated",
                folder,
                bucket,
                entries.len()
            );
        }

        Ok(entries)
    }

    fn descriptor(
        &self,
        bucket: &str,
        folder: &str,
        entry: StorageEntry,
        token: &str,
    ) -> FileDescriptor {
        let path = join_path(folder, &entry.name);
        let url = with_cache_token(&self.store.public_url(bucket, &path), token);

        FileDescriptor {
            name: entry.name,
            folder: folder.to_string(),
            path,
            url,
            created_at: entry.created_at.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GambitError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn png(store: &MemoryStore, path: &str, day: u32) {
        store.insert("gallery", path, Bytes::from_static(b"png"), "image/png", at(day));
    }

    fn three_level_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        png(&store, "cover.png", 3);
        png(&store, "openings/italian.png", 5);
        png(&store, "openings/gambits/evans.png", 1);
        png(&store, "openings/gambits/kings.png", 7);
        png(&store, "endgames/lucena.png", 4);
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_recursive_listing_flattens_tree() {
        let indexer = GalleryIndexer::new(three_level_store());
        let files = indexer.list("gallery", None).await.unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "openings/gambits/kings.png",
                "openings/italian.png",
                "endgames/lucena.png",
                "cover.png",
                "openings/gambits/evans.png",
            ]
        );

        let evans = files.iter().find(|f| f.name == "evans.png").unwrap();
        assert_eq!(evans.folder, "openings/gambits");
        assert!(evans
            .url
            .starts_with("memory://gallery/openings/gambits/evans.png?t="));

        let cover = files.iter().find(|f| f.name == "cover.png").unwrap();
        assert_eq!(cover.folder, "");
    }

    #[tokio::test]
    async fn test_scoped_listing_skips_folders() {
        let indexer = GalleryIndexer::new(three_level_store());
        let files = indexer.list("gallery", Some("openings")).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "openings/italian.png");
        assert_eq!(files[0].created_at, at(5));
    }

    #[tokio::test]
    async fn test_scoped_listing_sorted_newest_first() {
        let store = MemoryStore::new();
        png(&store, "boards/a.png", 2);
        png(&store, "boards/b.png", 9);
        png(&store, "boards/c.png", 5);
        let indexer = GalleryIndexer::new(Arc::new(store));

        let files = indexer.list("gallery", Some("/boards/")).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "c.png", "a.png"]);
    }

    #[tokio::test]
    async fn test_error_aborts_recursive_listing() {
        let store = three_level_store();
        store.fail_on_folder("gallery", "openings/gambits", "storage unavailable");
        let indexer = GalleryIndexer::new(store);

        let err = indexer.list("gallery", None).await.unwrap_err();
        match err {
            GambitError::Backend { message, .. } => assert_eq!(message, "storage unavailable"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_limit_truncates_folder() {
        let store = MemoryStore::new();
        for day in 1..=5 {
            png(&store, &format!("boards/{}.png", day), day);
        }
        let indexer = GalleryIndexer::new(Arc::new(store)).with_limit(3);

        let files = indexer.list("gallery", Some("boards")).await.unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].name, "5.png");
    }

    #[test]
    fn test_cache_token_separator() {
        assert_eq!(with_cache_token("https://cdn/x.png", "t=1"), "https://cdn/x.png?t=1");
        assert_eq!(
            with_cache_token("https://cdn/x.png?download=1", "t=1"),
            "https://cdn/x.png?download=1&t=1"
        );
        assert_eq!(cache_token(Utc.timestamp_opt(1, 5_000_000).unwrap()), "t=1005");
    }

    /// Store with a fixed listing that counts requests
    struct CountingStore {
        calls: AtomicUsize,
        entries: Vec<StorageEntry>,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn list(
            &self,
            _bucket: &str,
            folder: &str,
            _options: &ListOptions,
        ) -> Result<Vec<StorageEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(folder, "scans");
            Ok(self.entries.clone())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("https://cdn.example.com/{}/{}?v=2", bucket, path)
        }

        async fn upload(&self, _: &str, path: &str, _: Bytes, _: &str) -> Result<String> {
            Ok(path.to_string())
        }

        async fn remove(&self, _: &str, _: &[String]) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_scoped_listing_issues_one_request() {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            entries: vec![
                StorageEntry::folder("nested"),
                StorageEntry::file("old.jpg", "1", at(1)),
                StorageEntry {
                    created_at: None,
                    ..StorageEntry::file("undated.jpg", "2", at(1))
                },
                StorageEntry::file("new.jpg", "3", at(8)),
            ],
        });
        let indexer = GalleryIndexer::new(store.clone());

        let files = indexer.list("archive", Some("scans")).await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new.jpg", "old.jpg", "undated.jpg"]);
        assert!(files[0]
            .url
            .starts_with("https://cdn.example.com/archive/scans/new.jpg?v=2&t="));
    }
}
