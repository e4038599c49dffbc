//! Object storage types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a storage folder listing
///
/// Folders have no object identity in the backing store, so an entry
/// without an `id` is a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl StorageEntry {
    pub fn file(name: impl Into<String>, id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
            created_at: Some(created_at),
            updated_at: Some(created_at),
            metadata: None,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            created_at: None,
            updated_at: None,
            metadata: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

/// A file found while indexing a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Containing folder, empty at the bucket root
    pub folder: String,
    pub path: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Column and direction a listing is sorted by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub column: String,
    pub order: SortOrder,
}

impl SortBy {
    pub fn newest_first() -> Self {
        Self {
            column: "created_at".to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl Default for SortBy {
    fn default() -> Self {
        Self {
            column: "name".to_string(),
            order: SortOrder::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_id_is_folder() {
        let entry: StorageEntry =
            serde_json::from_str(r#"{"name":"boards","id":null,"created_at":null}"#).unwrap();
        assert!(entry.is_folder());

        let entry: StorageEntry = serde_json::from_str(
            r#"{"name":"a.png","id":"9f1c","created_at":"2024-03-01T10:00:00Z","metadata":{"size":12}}"#,
        )
        .unwrap();
        assert!(!entry.is_folder());
        assert_eq!(entry.metadata.unwrap()["size"], 12);
    }

    #[test]
    fn test_sort_by_serializes_lowercase() {
        let json = serde_json::to_value(SortBy::newest_first()).unwrap();
        assert_eq!(json["column"], "created_at");
        assert_eq!(json["order"], "desc");
    }
}
