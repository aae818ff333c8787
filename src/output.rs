//! Conversion results: the Markdown document and its extracted resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an extracted resource is shown inline or linked as a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Image,
    File,
}

impl ResourceKind {
    /// Classify by MIME type: every `image/*` is an image.
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().to_ascii_lowercase().starts_with("image/") {
            ResourceKind::Image
        } else {
            ResourceKind::File
        }
    }

    /// Sub-directory the resource is written to, relative to the note.
    pub fn dir(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::File => "file",
        }
    }

    /// Fallback base name for attachments that declare none.
    pub fn label(self) -> &'static str {
        self.dir()
    }
}

/// A decoded attachment with its two names.
///
/// `file_name` is the physical name on disk, unique by construction
/// (`{position}_{index}{ext}`). `display_name` is the human-facing name used
/// in link text; it is unique within one note through a numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub file_name: String,
    pub display_name: String,
    pub kind: ResourceKind,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Resource {
    /// Path of the resource relative to the Markdown file.
    pub fn link_path(&self) -> String {
        format!("{}/{}", self.kind.dir(), self.file_name)
    }
}

/// Resources keyed by the lowercase hex MD5 of their decoded bytes.
pub type ResourceIndex = BTreeMap<String, Resource>;

/// The result of converting one note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkdownNote {
    pub content: String,
    pub media: ResourceIndex,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl MarkdownNote {
    /// Resources ordered by physical file name.
    pub fn resources(&self) -> Vec<&Resource> {
        let mut v: Vec<&Resource> = self.media.values().collect();
        v.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_mime() {
        assert_eq!(ResourceKind::from_mime("image/png"), ResourceKind::Image);
        assert_eq!(ResourceKind::from_mime(" IMAGE/JPEG"), ResourceKind::Image);
        assert_eq!(ResourceKind::from_mime("application/pdf"), ResourceKind::File);
        assert_eq!(ResourceKind::from_mime(""), ResourceKind::File);
    }

    #[test]
    fn link_path_uses_kind_dir() {
        let r = Resource {
            file_name: "0_1.png".into(),
            display_name: "cat.png".into(),
            kind: ResourceKind::Image,
            content: vec![1, 2, 3],
        };
        assert_eq!(r.link_path(), "image/0_1.png");
    }
}
