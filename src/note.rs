//! Decoded note records: the input side of a conversion.
//!
//! Parsing the export container is somebody else's job; by the time a
//! [`SourceNote`] reaches this crate every field is already populated. The
//! types derive `serde` so notes can also be fed in as JSON.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One exported note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceNote {
    pub title: String,
    /// Raw rich-text markup (ENML-flavoured HTML).
    pub content: String,
    /// Attachments in source order.
    pub resources: Vec<Attachment>,
    /// Creation timestamp, `YYYYMMDDThhmmssZ`.
    pub created: String,
    /// Last update timestamp, `YYYYMMDDThhmmssZ`.
    pub updated: String,
    pub tags: Vec<String>,
    pub attributes: NoteAttributes,
}

/// A binary attachment embedded in a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    /// Base64 payload; line wrapping is tolerated.
    pub data: String,
    pub mime: String,
    /// Declared file name, if the source recorded one.
    pub file_name: Option<String>,
}

impl Attachment {
    pub fn new(data: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// Optional source and geolocation attributes.
///
/// Field names are serialised in `PascalCase` because that is how the
/// front-matter template addresses them (`Attributes.SourceUrl`, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NoteAttributes {
    pub source_url: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub source: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteFile {
    Many(Vec<SourceNote>),
    One(Box<SourceNote>),
}

/// Parse a JSON document holding either one note or an array of notes.
pub fn parse_notes(json: &str) -> Result<Vec<SourceNote>, serde_json::Error> {
    Ok(match serde_json::from_str::<NoteFile>(json)? {
        NoteFile::Many(notes) => notes,
        NoteFile::One(note) => vec![*note],
    })
}

/// Read notes from a JSON file.
pub fn read_notes(path: &Path) -> Result<Vec<SourceNote>, ConversionError> {
    let invalid = |detail: String| ConversionError::InvalidInput {
        path: path.to_path_buf(),
        detail,
    };
    let json = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    parse_notes(&json).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_note_or_array() {
        let one = parse_notes(r#"{"title":"A"}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].title, "A");

        let many = parse_notes(r#"[{"title":"A"},{"title":"B","tags":["x"]}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].tags, vec!["x".to_string()]);

        assert!(parse_notes("42").is_err());
    }

    #[test]
    fn read_notes_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ nope").unwrap();
        match read_notes(&path) {
            Err(ConversionError::InvalidInput { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn deserialises_partial_json() {
        let note: SourceNote = serde_json::from_str(
            r#"{"title":"Trip","content":"<p>hi</p>","attributes":{"SourceUrl":"http://x"}}"#,
        )
        .expect("valid note json");
        assert_eq!(note.title, "Trip");
        assert!(note.resources.is_empty());
        assert_eq!(note.attributes.source_url.as_deref(), Some("http://x"));
        assert_eq!(note.attributes.latitude, None);
    }

    #[test]
    fn attachment_builder() {
        let a = Attachment::new("aGk=", "text/plain").with_file_name("hi.txt");
        assert_eq!(a.file_name.as_deref(), Some("hi.txt"));
    }
}
