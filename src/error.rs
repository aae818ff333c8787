//! Error types for the note2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConfigError`] (setup time): the configuration itself is broken
//!   (a tag template without exactly one `{{tag}}` token, a front-matter
//!   template that does not compile). Returned from
//!   [`crate::config::ConversionConfigBuilder::build`] before any note is
//!   touched, so a bad template never surfaces halfway through a batch.
//!
//! * [`ConversionError`] (per note): one note could not be converted
//!   (undecodable attachment, renderer failure). It is the sticky error of a
//!   single conversion call and never affects other notes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a [`crate::config::ConversionConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The tag template must contain the substitution token exactly once.
    #[error("Tag template '{template}' must contain exactly one {{{{tag}}}} token, found {occurrences}")]
    InvalidTagTemplate { template: String, occurrences: usize },

    /// The front-matter template failed to compile.
    #[error("Invalid front-matter template: {detail}")]
    InvalidFrontMatterTemplate { detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The first error raised while converting one note.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Note data errors ──────────────────────────────────────────────────
    /// An attachment payload is not valid base64.
    #[error("Attachment {index} could not be decoded: {detail}")]
    ResourceDecode { index: usize, detail: String },

    /// The HTML → Markdown renderer rejected the normalised body.
    #[error("Markdown rendering failed: {detail}")]
    Render { detail: String },

    // ── Misconfiguration detected at conversion time ──────────────────────
    /// The front-matter template compiled but failed to render.
    #[error("Front matter could not be rendered: {detail}")]
    FrontMatter { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read or parse a note input file.
    #[error("Invalid note input '{path}': {detail}")]
    InvalidInput { path: PathBuf, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// `true` when the failure points at the configuration rather than at
    /// the note being converted.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, ConversionError::FrontMatter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_template_display_shows_token() {
        let e = ConfigError::InvalidTagTemplate {
            template: "#tag".into(),
            occurrences: 0,
        };
        let msg = e.to_string();
        assert!(msg.contains("{{tag}}"), "got: {msg}");
        assert!(msg.contains("found 0"), "got: {msg}");
    }

    #[test]
    fn resource_decode_display() {
        let e = ConversionError::ResourceDecode {
            index: 2,
            detail: "Invalid byte 33, offset 0.".into(),
        };
        assert!(e.to_string().contains("Attachment 2"));
        assert!(!e.is_misconfiguration());
    }

    #[test]
    fn front_matter_is_misconfiguration() {
        let e = ConversionError::FrontMatter {
            detail: "unknown filter".into(),
        };
        assert!(e.is_misconfiguration());
        assert!(e.to_string().contains("unknown filter"));
    }
}
