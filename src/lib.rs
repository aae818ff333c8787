//! # note2md
//!
//! Convert exported notes (rich-text HTML body, binary attachments, tags,
//! timestamps) into portable Markdown documents with their media extracted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SourceNote
//!  │
//!  ├─ 1. Resources  decode base64, dedupe by MD5, assign file names
//!  ├─ 2. Rewrite    ordered HTML rules (media, code, divs, formatting, todos)
//!  ├─ 3. Render     HTML → Markdown (htmd)
//!  ├─ 4. Assemble   tag line, title heading, blank-line normalisation
//!  ├─ 5. Dates      parse creation/update timestamps
//!  └─ 6. Header     optional front matter from a template
//! ```
//!
//! A failing stage stops the stages after it; the note's error is reported
//! and a batch carries on with the next note.
//!
//! ## Quick Start
//!
//! ```rust
//! use note2md::{ConversionConfig, Converter, SourceNote};
//!
//! let note = SourceNote {
//!     title: "Hello".into(),
//!     content: "<p>World</p>".into(),
//!     ..Default::default()
//! };
//! let converter = Converter::new(ConversionConfig::default());
//! let doc = converter.convert(&note, 0).unwrap();
//! assert_eq!(doc.content, "# Hello\n\nWorld\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `note2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! note2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod note;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod templates;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{write_note, Conversion, Converter};
pub use error::{ConfigError, ConversionError};
pub use note::{parse_notes, read_notes, Attachment, NoteAttributes, SourceNote};
pub use output::{MarkdownNote, Resource, ResourceIndex, ResourceKind};
pub use pipeline::render::{HtmdRenderer, MarkdownRenderer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_all, convert_batch, convert_batch_with, NoteOutcome, NoteStream};
