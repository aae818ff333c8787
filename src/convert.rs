//! Single-note conversion: the pipeline orchestrator.
//!
//! A [`Converter`] holds only immutable configuration and is cheap to clone,
//! so one instance can serve any number of threads. Everything that changes
//! during a conversion (the document buffer, the resource index, the sticky
//! error) lives in a [`ConversionState`] created fresh for every call.
//!
//! ## Stage order
//!
//! ```text
//! 1. map resources      5. prepend title
//! 2. rewrite HTML       6. collapse/trim whitespace
//! 3. render Markdown    7. compute dates
//! 4. prepend tag list   8. prepend front matter (optional)
//! ```
//!
//! Once a stage fails, its error sticks and every later stage is skipped.

use crate::config::ConversionConfig;
use crate::error::ConversionError;
use crate::note::SourceNote;
use crate::output::MarkdownNote;
use crate::pipeline::assemble::{prepend_title, tag_list, trim_spaces, TagTemplate};
use crate::pipeline::front_matter::{parse_note_date, FrontMatterData};
use crate::pipeline::render::{HtmdRenderer, MarkdownRenderer};
use crate::pipeline::resources::map_resources;
use crate::pipeline::rewrite::RewriteChain;
use crate::templates::FRONT_MATTER_TAG_SEPARATOR;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Converts notes to Markdown with one fixed configuration.
#[derive(Clone)]
pub struct Converter {
    config: Arc<ConversionConfig>,
    renderer: Arc<dyn MarkdownRenderer>,
    front_matter_tags: TagTemplate,
}

impl Converter {
    /// A converter using the `htmd` renderer.
    pub fn new(config: ConversionConfig) -> Self {
        Self::with_renderer(config, Arc::new(HtmdRenderer))
    }

    pub fn with_renderer(config: ConversionConfig, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
            front_matter_tags: TagTemplate::front_matter(),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert one note.
    ///
    /// `position` identifies the note among all notes written to the same
    /// directory; it prefixes the physical names of its resources.
    pub fn convert(&self, note: &SourceNote, position: usize) -> Result<MarkdownNote, ConversionError> {
        self.run(note, position).into_result()
    }

    /// Convert one note, keeping the document even when a stage failed.
    ///
    /// The document then reflects the stages that ran before the failure.
    pub fn run(&self, note: &SourceNote, position: usize) -> Conversion {
        info!("Converting note {}: {:?}", position, note.title);
        let mut state = ConversionState::default();

        state.stage("resources", |doc| {
            doc.media = map_resources(&note.resources, position)?;
            Ok(())
        });
        state.stage("rewrite", |doc| {
            doc.content = RewriteChain::standard(&doc.media).apply(&note.content);
            Ok(())
        });
        state.stage("render", |doc| {
            doc.content = self.renderer.render(
                &doc.content,
                self.config.enable_highlights,
                self.config.escape_special_chars,
            )?;
            Ok(())
        });
        state.stage("tags", |doc| {
            let tags = tag_list(
                &note.tags,
                &self.config.tag_template,
                &self.config.tag_separator,
                true,
            );
            doc.content.insert_str(0, &tags);
            Ok(())
        });
        state.stage("title", |doc| {
            doc.content = prepend_title(&note.title, &doc.content);
            Ok(())
        });
        state.stage("whitespace", |doc| {
            doc.content = trim_spaces(&doc.content);
            Ok(())
        });
        state.stage("dates", |doc| {
            doc.created = Some(parse_note_date(&note.created));
            doc.updated = Some(parse_note_date(&note.updated));
            Ok(())
        });
        if self.config.enable_front_matter {
            state.stage("front-matter", |doc| self.add_front_matter(note, doc));
        }

        state.finish()
    }

    fn add_front_matter(&self, note: &SourceNote, doc: &mut MarkdownNote) -> Result<(), ConversionError> {
        let (Some(created), Some(updated)) = (doc.created, doc.updated) else {
            return Err(ConversionError::Internal(
                "front matter requested before dates were computed".into(),
            ));
        };
        let data = FrontMatterData::new(
            created,
            updated,
            &note.title,
            &note.attributes,
            tag_list(
                &note.tags,
                &self.front_matter_tags,
                FRONT_MATTER_TAG_SEPARATOR,
                false,
            ),
        );
        let header = self.config.front_matter_template.render(&data)?;
        doc.content.insert_str(0, &header);
        Ok(())
    }
}

/// Per-call state: the evolving document and the sticky error.
#[derive(Default)]
struct ConversionState {
    doc: MarkdownNote,
    err: Option<ConversionError>,
}

impl ConversionState {
    /// Run `f` unless an earlier stage already failed.
    fn stage<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(&mut MarkdownNote) -> Result<(), ConversionError>,
    {
        if self.err.is_some() {
            debug!("Skipping stage {} after earlier failure", name);
            return;
        }
        if let Err(e) = f(&mut self.doc) {
            warn!("Stage {} failed: {}", name, e);
            self.err = Some(e);
        }
    }

    fn finish(self) -> Conversion {
        Conversion {
            document: self.doc,
            error: self.err,
        }
    }
}

/// Outcome of [`Converter::run`].
#[derive(Debug)]
pub struct Conversion {
    pub document: MarkdownNote,
    /// The first error raised, if any. When set, `document` is incomplete.
    pub error: Option<ConversionError>,
}

impl Conversion {
    pub fn into_result(self) -> Result<MarkdownNote, ConversionError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.document),
        }
    }
}

// ── Output writing ───────────────────────────────────────────────────────────

/// Write a converted note and its resources under `dir`.
///
/// The Markdown goes to `{title}.md` (a numeric suffix avoids clobbering an
/// existing file); resources go to `image/` and `file/`. Every file is
/// written to a temp file first and renamed into place, so readers never see
/// a partial file.
pub fn write_note(title: &str, doc: &MarkdownNote, dir: &Path) -> Result<PathBuf, ConversionError> {
    create_dir(dir)?;
    for res in doc.resources() {
        let media_dir = dir.join(res.kind.dir());
        create_dir(&media_dir)?;
        write_atomic(&media_dir.join(&res.file_name), &res.content)?;
    }

    let path = available_path(dir, &file_stem(title));
    write_atomic(&path, doc.content.as_bytes())?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

fn create_dir(dir: &Path) -> Result<(), ConversionError> {
    fs::create_dir_all(dir).map_err(|e| ConversionError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConversionError> {
    let fail = |e: std::io::Error| ConversionError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// File-system safe stem for a note title.
pub fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim().trim_start_matches('.').trim();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

fn available_path(dir: &Path, stem: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}.md"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{stem}-{n}.md"));
        n += 1;
    }
    path
}
