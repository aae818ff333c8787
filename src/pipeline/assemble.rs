//! Document assembly: tag line, title heading and blank-line normalisation.

use crate::error::ConfigError;
use crate::templates::{DEFAULT_TAG_TEMPLATE, FRONT_MATTER_TAG_TEMPLATE, TAG_TOKEN};
use once_cell::sync::Lazy;
use regex::Regex;

/// A tag pattern holding exactly one `{{tag}}` token.
///
/// The token count is checked once, in [`TagTemplate::new`], so rendering
/// can never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate(String);

impl TagTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        let occurrences = template.matches(TAG_TOKEN).count();
        if occurrences != 1 {
            return Err(ConfigError::InvalidTagTemplate {
                template,
                occurrences,
            });
        }
        Ok(Self(template))
    }

    /// The quoted form used for the front-matter `TagList`.
    pub fn front_matter() -> Self {
        Self(FRONT_MATTER_TAG_TEMPLATE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, tag: &str) -> String {
        self.0.replacen(TAG_TOKEN, tag, 1)
    }
}

impl Default for TagTemplate {
    fn default() -> Self {
        Self(DEFAULT_TAG_TEMPLATE.to_string())
    }
}

/// Render `tags` through `template`, joined by `separator`.
///
/// Blank tags are skipped. With `block` set, a non-empty list is followed by
/// a blank line so it can be prepended to the document as its own paragraph.
pub fn tag_list(tags: &[String], template: &TagTemplate, separator: &str, block: bool) -> String {
    let rendered: Vec<String> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| template.render(t))
        .collect();
    if rendered.is_empty() {
        return String::new();
    }
    let mut list = rendered.join(separator);
    if block {
        list.push_str("\n\n");
    }
    list
}

/// `# {title}` followed by a blank line, then `content`.
pub fn prepend_title(title: &str, content: &str) -> String {
    format!("# {title}\n\n{content}")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_WHITESPACE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]+$").unwrap());

/// Blank out whitespace-only lines, collapse runs of three or more newlines
/// to two and end the document with exactly one newline.
pub fn trim_spaces(content: &str) -> String {
    let blanked = RE_WHITESPACE_LINE.replace_all(content, "");
    let collapsed = RE_BLANK_LINES.replace_all(&blanked, "\n\n");
    format!("{}\n", collapsed.trim_end_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_template_requires_exactly_one_token() {
        assert!(TagTemplate::new("#{{tag}}").is_ok());
        assert!(TagTemplate::new("[[{{tag}}]]").is_ok());

        let none = TagTemplate::new("#tag").unwrap_err();
        assert_eq!(
            none,
            ConfigError::InvalidTagTemplate {
                template: "#tag".into(),
                occurrences: 0
            }
        );
        assert!(matches!(
            TagTemplate::new("{{tag}}-{{tag}}"),
            Err(ConfigError::InvalidTagTemplate { occurrences: 2, .. })
        ));
    }

    #[test]
    fn tag_list_rendering() {
        let tags = vec!["work".to_string(), " ".to_string(), "todo".to_string()];
        let t = TagTemplate::default();
        assert_eq!(tag_list(&tags, &t, " ", true), "#work #todo\n\n");
        assert_eq!(
            tag_list(&tags, &TagTemplate::front_matter(), ", ", false),
            "'work', 'todo'"
        );
        assert_eq!(tag_list(&[], &t, " ", true), "");
    }

    #[test]
    fn title_is_prepended() {
        assert_eq!(prepend_title("Hello", "World\n"), "# Hello\n\nWorld\n");
    }

    #[test]
    fn trim_spaces_normalises_newlines() {
        assert_eq!(trim_spaces("a\n\n\n\n\nb\n\n\n"), "a\n\nb\n");
        assert_eq!(trim_spaces("a"), "a\n");
        assert_eq!(trim_spaces(""), "\n");
        let out = trim_spaces("x\n\n\ny\n\n\n\nz");
        assert!(!out.contains("\n\n\n"));
        assert!(out.ends_with("z\n"));
    }

    #[test]
    fn trim_spaces_blanks_whitespace_only_lines() {
        assert_eq!(trim_spaces("a\n\n  \n\n  \n\n\t\n\nb\n"), "a\n\nb\n");
        assert_eq!(trim_spaces("hard  \nbreak\n"), "hard  \nbreak\n");
    }
}
