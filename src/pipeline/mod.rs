//! Pipeline stages for note-to-Markdown conversion.
//!
//! Each submodule implements one transformation step; [`crate::convert`]
//! sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! resources ──▶ rewrite ──▶ render ──▶ assemble ──▶ front_matter
//! (decode/dedup) (HTML fixes) (htmd)  (title/tags/ws) (dates/header)
//! ```
//!
//! 1. [`resources`]   : decode attachments, dedupe by MD5, assign names
//! 2. [`rewrite`]     : ordered HTML rewrite rules; media references are
//!    resolved here, against the index built in step 1
//! 3. [`render`]      : HTML → Markdown through a [`render::MarkdownRenderer`]
//! 4. [`assemble`]    : tag line, title heading, blank-line normalisation
//! 5. [`front_matter`]: timestamp parsing and the templated metadata header

pub mod assemble;
pub mod front_matter;
pub mod render;
pub mod resources;
pub mod rewrite;
