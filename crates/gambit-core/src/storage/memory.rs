//! In-memory object store using DashMap

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gambit_types::{SortOrder, StorageEntry};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{normalize_folder, ListOptions, ObjectStore};
use crate::error::{GambitError, Result};

/// Object held by [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub data: Bytes,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Object store kept entirely in memory, keyed by bucket and path
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<(String, String), StoredObject>,
    failures: DashMap<(String, String), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object with an explicit creation time
    pub fn insert(
        &self,
        bucket: &str,
        path: &str,
        data: impl Into<Bytes>,
        content_type: &str,
        created_at: DateTime<Utc>,
    ) {
        self.objects.insert(
            (bucket.to_string(), path.trim_matches('/').to_string()),
            StoredObject {
                id: uuid::Uuid::new_v4().to_string(),
                data: data.into(),
                content_type: content_type.to_string(),
                created_at,
            },
        );
    }

    /// Get an object
    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .get(&(bucket.to_string(), path.trim_matches('/').to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Number of objects in a bucket
    pub fn len(&self, bucket: &str) -> usize {
        self.objects.iter().filter(|e| e.key().0 == bucket).count()
    }

    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    /// Make every listing of `folder` fail with `message`
    pub fn fail_on_folder(&self, bucket: &str, folder: &str, message: &str) {
        self.failures.insert(
            (bucket.to_string(), normalize_folder(folder).to_string()),
            message.to_string(),
        );
    }
}

fn compare_entries(a: &StorageEntry, b: &StorageEntry, column: &str) -> Ordering {
    match column {
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.name.cmp(&b.name),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(
        &self,
        bucket: &str,
        folder: &str,
        options: &ListOptions,
    ) -> Result<Vec<StorageEntry>> {
        let folder = normalize_folder(folder);

        if let Some(message) = self
            .failures
            .get(&(bucket.to_string(), folder.to_string()))
        {
            return Err(GambitError::Backend {
                status: Some(500),
                message: message.value().clone(),
            });
        }

        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{}/", folder)
        };

        let mut subfolders = BTreeSet::new();
        let mut files = Vec::new();

        for entry in self.objects.iter() {
            let (entry_bucket, path) = entry.key();
            if entry_bucket != bucket {
                continue;
            }
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((subfolder, _)) => {
                    subfolders.insert(subfolder.to_string());
                }
                None => {
                    let object = entry.value();
                    files.push(StorageEntry::file(
                        rest,
                        object.id.clone(),
                        object.created_at,
                    ));
                }
            }
        }

        files.sort_by(|a, b| {
            let ordering = compare_entries(a, b, &options.sort_by.column);
            match options.sort_by.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let mut entries: Vec<StorageEntry> =
            subfolders.into_iter().map(StorageEntry::folder).collect();
        entries.extend(files);
        entries.truncate(options.limit);

        Ok(entries)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String> {
        let path = path.trim_matches('/').to_string();
        let key = (bucket.to_string(), path.clone());

        if self.objects.contains_key(&key) {
            return Err(GambitError::Backend {
                status: Some(409),
                message: format!("The resource already exists: {}", path),
            });
        }

        self.objects.insert(
            key,
            StoredObject {
                id: uuid::Uuid::new_v4().to_string(),
                data,
                content_type: content_type.to_string(),
                created_at: Utc::now(),
            },
        );

        Ok(path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        for path in paths {
            self.objects
                .remove(&(bucket.to_string(), path.trim_matches('/').to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gambit_types::SortBy;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_list_direct_children() {
        let store = MemoryStore::new();
        store.insert("media", "logo.png", vec![1u8], "image/png", at(1));
        store.insert("media", "boards/a.png", vec![2u8], "image/png", at(2));
        store.insert("media", "boards/deep/b.png", vec![3u8], "image/png", at(3));
        store.insert("other", "boards/c.png", vec![4u8], "image/png", at(4));

        let root = store.list("media", "", &ListOptions::default()).await.unwrap();
        assert_eq!(root.len(), 2);
        assert!(root[0].is_folder());
        assert_eq!(root[0].name, "boards");
        assert_eq!(root[1].name, "logo.png");

        let boards = store
            .list("media", "/boards/", &ListOptions::default())
            .await
            .unwrap();
        let names: Vec<_> = boards.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["deep", "a.png"]);
    }

    #[tokio::test]
    async fn test_list_sort_and_limit() {
        let store = MemoryStore::new();
        store.insert("media", "b.png", Bytes::new(), "image/png", at(1));
        store.insert("media", "a.png", Bytes::new(), "image/png", at(3));
        store.insert("media", "c.png", Bytes::new(), "image/png", at(2));

        let newest = store
            .list("media", "", &ListOptions::newest_first(2))
            .await
            .unwrap();
        let names: Vec<_> = newest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);

        let by_name = ListOptions {
            limit: 10,
            sort_by: SortBy::default(),
        };
        let sorted = store.list("media", "", &by_name).await.unwrap();
        let names: Vec<_> = sorted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let store = MemoryStore::new();
        let path = store
            .upload("media", "/boards/a.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        assert_eq!(path, "boards/a.png");
        assert_eq!(store.get("media", "boards/a.png").unwrap().content_type, "image/png");
        assert!(store.get("media", "/boards/a.png").is_some());

        let err = store
            .upload("media", "boards/a.png", Bytes::from_static(b"y"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, GambitError::Backend { status: Some(409), .. }));
    }

    #[tokio::test]
    async fn test_remove_and_failures() {
        let store = MemoryStore::new();
        store.insert("media", "a.png", Bytes::new(), "image/png", at(1));
        store
            .remove("media", &["a.png".to_string(), "missing.png".to_string()])
            .await
            .unwrap();
        assert!(store.is_empty("media"));

        store.fail_on_folder("media", "broken", "permission denied");
        let err = store
            .list("media", "broken", &ListOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Backend error (500): permission denied");
    }
}
