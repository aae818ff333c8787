//! Configuration types for note-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is validated once, when it
//! is built, and is immutable afterwards: it holds no per-note state, so one
//! instance can be shared by any number of concurrent conversions.
//!
//! Per-note state (the sticky error, the resource index, the document
//! buffer) lives in [`crate::convert`] and is created fresh for every call.

use crate::error::ConfigError;
use crate::pipeline::assemble::TagTemplate;
use crate::pipeline::front_matter::FrontMatterTemplate;
use crate::progress::ProgressCallback;
use crate::templates::{DEFAULT_FRONT_MATTER_TEMPLATE, DEFAULT_TAG_TEMPLATE};
use std::fmt;

/// Configuration for converting notes to Markdown.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use note2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .tag_template("`#{{tag}}`")
///     .enable_front_matter(true)
///     .build()
///     .unwrap();
/// assert!(config.enable_front_matter);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Template applied to each tag in the tag line. Default: `#{{tag}}`.
    pub tag_template: TagTemplate,

    /// Separator placed between rendered tags. Default: a single space.
    pub tag_separator: String,

    /// Render highlighted text as `==text==`. Default: false.
    pub enable_highlights: bool,

    /// Keep the renderer's backslash escapes of Markdown punctuation.
    /// Default: false.
    pub escape_special_chars: bool,

    /// Prepend a front-matter block. Default: false.
    pub enable_front_matter: bool,

    /// Compiled-and-checked front-matter template.
    pub front_matter_template: FrontMatterTemplate,

    /// Notes converted at once by [`crate::stream::convert_batch`]. Default: 4.
    ///
    /// Conversion is CPU-bound (base64, hashing, HTML parsing); there is little
    /// to gain beyond the number of cores.
    pub concurrency: usize,

    /// Optional per-note progress events for batch conversion.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tag_template: TagTemplate::default(),
            tag_separator: " ".to_string(),
            enable_highlights: false,
            escape_special_chars: false,
            enable_front_matter: false,
            front_matter_template: FrontMatterTemplate::default(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("tag_template", &self.tag_template.as_str())
            .field("tag_separator", &self.tag_separator)
            .field("enable_highlights", &self.enable_highlights)
            .field("escape_special_chars", &self.escape_special_chars)
            .field("enable_front_matter", &self.enable_front_matter)
            .field("front_matter_template", &self.front_matter_template.source().len())
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            tag_template: DEFAULT_TAG_TEMPLATE.to_string(),
            front_matter_template: DEFAULT_FRONT_MATTER_TEMPLATE.to_string(),
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
///
/// Templates are kept as raw text until [`build`](Self::build), which is the
/// single place they are validated.
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    tag_template: String,
    front_matter_template: String,
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Tag template; an empty string selects the default.
    pub fn tag_template(mut self, template: impl Into<String>) -> Self {
        self.tag_template = template.into();
        self
    }

    pub fn tag_separator(mut self, sep: impl Into<String>) -> Self {
        self.config.tag_separator = sep.into();
        self
    }

    pub fn enable_highlights(mut self, v: bool) -> Self {
        self.config.enable_highlights = v;
        self
    }

    pub fn escape_special_chars(mut self, v: bool) -> Self {
        self.config.escape_special_chars = v;
        self
    }

    pub fn enable_front_matter(mut self, v: bool) -> Self {
        self.config.enable_front_matter = v;
        self
    }

    pub fn front_matter_template(mut self, template: impl Into<String>) -> Self {
        self.front_matter_template = template.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating both templates.
    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        let mut config = self.config;
        let tag_template = if self.tag_template.is_empty() {
            DEFAULT_TAG_TEMPLATE
        } else {
            self.tag_template.as_str()
        };
        config.tag_template = TagTemplate::new(tag_template)?;
        config.front_matter_template = FrontMatterTemplate::new(self.front_matter_template)?;
        if config.concurrency == 0 {
            return Err(ConfigError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(config)
    }
}
