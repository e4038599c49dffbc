//! Lesson content types

use serde::{Deserialize, Serialize};

/// Kind of a lesson content block
///
/// Kinds the backoffice does not know about are kept as [`BlockKind::Other`]
/// so that lessons written by newer editors still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Text,
    Image,
    Video,
    Tip,
    Example,
    Other(String),
}

impl BlockKind {
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Tip => "tip",
            BlockKind::Example => "example",
            BlockKind::Other(kind) => kind,
        }
    }
}

impl From<String> for BlockKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => BlockKind::Text,
            "image" => BlockKind::Image,
            "video" => BlockKind::Video,
            "tip" => BlockKind::Tip,
            "example" => BlockKind::Example,
            _ => BlockKind::Other(value),
        }
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One block of a lesson body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Image or video location, when the block embeds media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            title: None,
            media_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A lesson as stored by the backoffice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_block_kind_is_preserved() {
        let block: ContentBlock =
            serde_json::from_str(r#"{"type":"quote","content":"Castle early."}"#).unwrap();
        assert_eq!(block.kind, BlockKind::Other("quote".to_string()));
        assert_eq!(block.title, None);

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "quote");
    }

    #[test]
    fn test_lesson_from_yaml() {
        let yaml = r#"
title: Opening principles
intro: Control the centre.
content:
  - type: text
    content: Develop knights before bishops.
  - type: tip
    title: Remember
    content: Do not move the same piece twice.
"#;
        let lesson: Lesson = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(lesson.content.len(), 2);
        assert_eq!(lesson.content[1].kind, BlockKind::Tip);
        assert_eq!(lesson.content[1].title.as_deref(), Some("Remember"));
        assert!(lesson.summary.is_none());
    }
}
