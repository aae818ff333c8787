//! Attachment extraction: base64 payload → deduplicated [`Resource`]s.
//!
//! Every attachment ends up with two names:
//!
//! - a **physical** file name, `{position}_{index}{ext}`, unique across all
//!   notes written to the same directory because `position` identifies the
//!   note and `index` the attachment;
//! - a **display** name derived from the declared file name (or the kind),
//!   made unique within the note by a `-N` suffix on repeats.
//!
//! The index is keyed by the MD5 of the decoded bytes, the same digest the
//! note markup uses in `<en-media hash="…">`. Byte-identical attachments
//! therefore collapse into the first entry, and the markup resolves both
//! references to it.

use crate::error::ConversionError;
use crate::note::Attachment;
use crate::output::{Resource, ResourceIndex, ResourceKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use tracing::debug;

/// Decode, classify, name and deduplicate the attachments of one note.
///
/// Attachments are processed in source order so suffix assignment is
/// deterministic. The first undecodable payload aborts the whole mapping;
/// no partial index is returned.
pub fn map_resources(
    attachments: &[Attachment],
    position: usize,
) -> Result<ResourceIndex, ConversionError> {
    let mut index = ResourceIndex::new();
    let mut names: HashMap<String, usize> = HashMap::new();

    for (i, attachment) in attachments.iter().enumerate() {
        let content = decode_payload(&attachment.data)
            .map_err(|detail| ConversionError::ResourceDecode { index: i, detail })?;

        let hash = content_hash(&content);
        if let Some(existing) = index.get(&hash) {
            debug!(
                "Attachment {} duplicates {}, reusing it",
                i, existing.file_name
            );
            continue;
        }

        let kind = ResourceKind::from_mime(&attachment.mime);
        let (mut name, ext) = base_name(kind, attachment.file_name.as_deref(), &attachment.mime);

        let key = format!("{name}{ext}");
        match names.get_mut(&key) {
            Some(count) => {
                name = format!("{name}-{count}");
                *count += 1;
            }
            None => {
                names.insert(key, 1);
            }
        }

        let resource = Resource {
            file_name: format!("{position}_{i}{ext}"),
            display_name: format!("{name}{ext}"),
            kind,
            content,
        };
        debug!(
            "Attachment {} → {} ({}, {} bytes)",
            i,
            resource.file_name,
            resource.display_name,
            resource.content.len()
        );
        index.insert(hash, resource);
    }

    Ok(index)
}

/// Lowercase hex MD5 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Decode a base64 payload, ignoring the line wrapping exporters insert.
fn decode_payload(data: &str) -> Result<Vec<u8>, String> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| e.to_string())
}

/// Derive `(base name, extension)` for an attachment.
///
/// The extension carries its leading dot, or is empty when neither the
/// declared name nor the MIME type yields one.
pub fn base_name(kind: ResourceKind, declared: Option<&str>, mime: &str) -> (String, String) {
    let declared = declared
        .map(|d| d.rsplit(['/', '\\']).next().unwrap_or(d).trim())
        .unwrap_or("");

    let (stem, ext) = match declared.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, format!(".{}", ext.to_ascii_lowercase()))
        }
        _ => (declared, extension_for_mime(mime)),
    };

    let stem = sanitize(stem);
    if stem.is_empty() {
        (kind.label().to_string(), ext)
    } else {
        (stem, ext)
    }
}

/// File extension (with dot) for a MIME type.
pub fn extension_for_mime(mime: &str) -> String {
    let mime = mime.trim().to_ascii_lowercase();
    let preferred = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        "text/plain" => Some("txt"),
        "text/html" => Some("html"),
        "audio/mpeg" => Some("mp3"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/amr" => Some("amr"),
        _ => None,
    };

    preferred
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&mime).and_then(|exts| exts.first().copied())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
