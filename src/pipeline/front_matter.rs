//! Front matter: timestamp parsing and the templated metadata header.
//!
//! Templates use minijinja syntax. When the configuration is built, each
//! template is compiled and rendered once against a fully populated sample
//! note. Unknown filters and functions only surface at render time, so the
//! trial render is what makes a broken template a [`ConfigError`] at setup
//! rather than a failure on every note of a batch.

use crate::error::{ConfigError, ConversionError};
use crate::note::NoteAttributes;
use crate::templates::{DEFAULT_FRONT_MATTER_TEMPLATE, FRONT_MATTER_DATE_FORMAT};
use chrono::{DateTime, NaiveDateTime, Utc};
use minijinja::{Environment, Value};
use serde::Serialize;
use tracing::warn;

/// Timestamp layout of note records: `20180109T173725Z`.
pub const NOTE_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Values exposed to the front-matter template.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrontMatterData<'a> {
    pub c_time: String,
    pub m_time: String,
    pub title: &'a str,
    pub attributes: &'a NoteAttributes,
    pub tag_list: String,
}

impl<'a> FrontMatterData<'a> {
    pub fn new(
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        title: &'a str,
        attributes: &'a NoteAttributes,
        tag_list: String,
    ) -> Self {
        Self {
            c_time: created.format(FRONT_MATTER_DATE_FORMAT).to_string(),
            m_time: updated.format(FRONT_MATTER_DATE_FORMAT).to_string(),
            title,
            attributes,
            tag_list,
        }
    }
}

/// A front-matter template that is known to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatterTemplate {
    source: String,
}

impl FrontMatterTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let invalid = |detail: String| ConfigError::InvalidFrontMatterTemplate { detail };
        compile(&source).map_err(|e| invalid(e.to_string()))?;
        let template = Self { source };
        let attributes = sample_attributes();
        let sample = FrontMatterData::new(
            DateTime::<Utc>::default(),
            DateTime::<Utc>::default(),
            "Sample",
            &attributes,
            "'sample'".to_string(),
        );
        template.render(&sample).map_err(|e| invalid(e.to_string()))?;
        Ok(template)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, data: &FrontMatterData<'_>) -> Result<String, ConversionError> {
        environment()
            .render_str(&self.source, data)
            .map_err(|e| ConversionError::FrontMatter {
                detail: e.to_string(),
            })
    }
}

impl Default for FrontMatterTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_FRONT_MATTER_TEMPLATE.to_string(),
        }
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_filter("trim", trim);
    env.add_filter("quote", quote);
    env.add_function("trim", trim);
    env.add_function("quote", quote);
    env
}

fn compile(source: &str) -> Result<(), minijinja::Error> {
    let env = environment();
    env.template_from_str(source)?;
    Ok(())
}

/// Every optional field set, so a trial render reaches every branch.
fn sample_attributes() -> NoteAttributes {
    NoteAttributes {
        source_url: Some("https://example.com".into()),
        latitude: Some("0".into()),
        longitude: Some("0".into()),
        altitude: Some("0".into()),
        source: Some("sample".into()),
    }
}

/// Text of a template value; missing values are empty.
fn text(value: &Value) -> String {
    if value.is_none() || value.is_undefined() {
        String::new()
    } else {
        value.to_string()
    }
}

fn trim(value: Value) -> String {
    text(&value).trim().to_string()
}

/// Double-quoted scalar with JSON escapes, valid as a YAML value.
fn quote(value: Value) -> String {
    let text = text(&value);
    serde_json::to_string(&text).unwrap_or_else(|_| format!("{text:?}"))
}

/// Parse a note timestamp, falling back to the current time.
///
/// A bad timestamp never fails the conversion; it is logged and replaced.
pub fn parse_note_date(value: &str) -> DateTime<Utc> {
    match NaiveDateTime::parse_from_str(value.trim(), NOTE_DATE_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(e) => {
            warn!("Could not convert time '{}': {}, using now instead", value, e);
            Utc::now()
        }
    }
}
