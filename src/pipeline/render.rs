//! HTML → Markdown rendering.
//!
//! The tag-to-markup mapping itself is delegated to `htmd`. This module owns
//! the contract around it: the [`MarkdownRenderer`] seam the converter calls
//! through, the highlight and escaping switches, and the placeholder
//! characters the rewrite chain uses for constructs a generic renderer would
//! escape or drop (task checkboxes, highlights).

use crate::error::ConversionError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder for a checked task box, emitted by the rewrite chain.
pub const TODO_CHECKED: &str = "\u{E000}";
/// Placeholder for an unchecked task box, emitted by the rewrite chain.
pub const TODO_UNCHECKED: &str = "\u{E001}";

const MARK_OPEN: &str = "\u{E002}";
const MARK_CLOSE: &str = "\u{E003}";

/// Converts normalised HTML into Markdown.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `html`.
    ///
    /// * `highlights`: render `<mark>` as `==text==` instead of plain text
    /// * `escape_special_chars`: keep backslash escapes on Markdown
    ///   punctuation that appeared in the source text
    fn render(
        &self,
        html: &str,
        highlights: bool,
        escape_special_chars: bool,
    ) -> Result<String, ConversionError>;
}

/// The default renderer, backed by `htmd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmdRenderer;

static RE_MARK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<mark\b[^>]*>").unwrap());
static RE_MARK_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</mark\s*>").unwrap());
static RE_ESCAPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([\\`*_{}\[\]()#+\-.!|~<>=])").unwrap());

impl MarkdownRenderer for HtmdRenderer {
    fn render(
        &self,
        html: &str,
        highlights: bool,
        escape_special_chars: bool,
    ) -> Result<String, ConversionError> {
        let (open, close) = if highlights {
            (MARK_OPEN, MARK_CLOSE)
        } else {
            ("", "")
        };
        let html = RE_MARK_OPEN.replace_all(html, open);
        let html = RE_MARK_CLOSE.replace_all(&html, close);

        let markdown = htmd::convert(&html).map_err(|e| ConversionError::Render {
            detail: e.to_string(),
        })?;

        let markdown = if escape_special_chars {
            markdown
        } else {
            unescape(&markdown)
        };

        Ok(markdown
            .replace(TODO_CHECKED, "[x] ")
            .replace(TODO_UNCHECKED, "[ ] ")
            .replace(MARK_OPEN, "==")
            .replace(MARK_CLOSE, "=="))
    }
}

/// Strip backslash escapes outside fenced code blocks.
fn unescape(markdown: &str) -> String {
    let mut in_fence = false;
    let mut lines = Vec::new();
    for line in markdown.split('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            lines.push(line.to_string());
        } else if in_fence {
            lines.push(line.to_string());
        } else {
            lines.push(RE_ESCAPED.replace_all(line, "$1").into_owned());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_paragraph() {
        let md = HtmdRenderer.render("<p>World</p>", false, false).unwrap();
        assert_eq!(md.trim(), "World");
    }

    #[test]
    fn highlights_toggle() {
        let html = "<p>a <mark>hot</mark> take</p>";
        let on = HtmdRenderer.render(html, true, false).unwrap();
        assert!(on.contains("==hot=="), "got: {on}");
        let off = HtmdRenderer.render(html, false, false).unwrap();
        assert!(!off.contains("=="), "got: {off}");
        assert!(off.contains("hot"));
    }

    #[test]
    fn todo_placeholders_become_checkboxes() {
        let html = format!("<p>{TODO_CHECKED}done</p><p>{TODO_UNCHECKED}open</p>");
        let md = HtmdRenderer.render(&html, false, false).unwrap();
        assert!(md.contains("[x] done"), "got: {md}");
        assert!(md.contains("[ ] open"), "got: {md}");
    }

    #[test]
    fn unescape_skips_fences() {
        let md = "a \\*b\\*\n```\nx \\* y\n```\n\\# c";
        assert_eq!(unescape(md), "a *b*\n```\nx \\* y\n```\n# c");
    }

    #[test]
    fn code_block_renders_fenced() {
        let md = HtmdRenderer
            .render("<pre><code>let x = 1;</code></pre>", false, false)
            .unwrap();
        assert!(md.contains("let x = 1;"), "got: {md}");
    }
}
