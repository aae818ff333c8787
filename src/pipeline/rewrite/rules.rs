use super::{apply_edits, attr, find_closing, HtmlRewriter};
use crate::pipeline::render::{TODO_CHECKED, TODO_UNCHECKED};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DIV_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*?(/?)>").unwrap());
static RE_SPAN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)span\b[^>]*?(/?)>").unwrap());

// ── Code ─────────────────────────────────────────────────────────────────────

static RE_CODEBLOCK_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*-en-codeblock\s*:\s*true[^>]*>").unwrap());
static RE_CODE_EMPTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*>\s*<br\s*/?>\s*</div>").unwrap());
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_DIV_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</div\s*>").unwrap());
static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Turns editor code blocks (a `<div>` styled `-en-codeblock: true` holding
/// one `<div>` per line) into `<pre><code>`.
pub struct Code;

impl HtmlRewriter for Code {
    fn name(&self) -> &'static str {
        "code"
    }

    fn rewrite(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        while let Some(open) = RE_CODEBLOCK_OPEN.find_at(html, cursor) {
            let Some((close_start, close_end)) = find_closing(html, open.end(), &RE_DIV_TAG)
            else {
                break;
            };
            out.push_str(&html[cursor..open.start()]);
            out.push_str("<pre><code>");
            out.push_str(&code_text(&html[open.end()..close_start]));
            out.push_str("</code></pre>");
            cursor = close_end;
        }
        out.push_str(&html[cursor..]);
        out
    }
}

/// Flatten line divs into newline-separated text, keeping entities.
fn code_text(inner: &str) -> String {
    let s = RE_CODE_EMPTY_LINE.replace_all(inner, "\n");
    let s = RE_BR.replace_all(&s, "\n");
    let s = RE_DIV_CLOSE.replace_all(&s, "\n");
    let s = RE_ANY_TAG.replace_all(&s, "");
    s.trim_end_matches('\n').to_string()
}

// ── ExtraDiv ─────────────────────────────────────────────────────────────────

static RE_CELL_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(li|td|th)\b[^>]*>").unwrap());
static RE_LEADING_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(<div\b[^>]*>)").unwrap());
static RE_LEADING_CELL_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*</(li|td|th)\s*>").unwrap());
static RE_EMPTY_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*>\s*</div\s*>").unwrap());
static RE_BLANK_LINE_DIV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*>\s*<br\s*/?>\s*</div\s*>").unwrap());

/// Removes decorative `<div>` wrappers: a div that is the only child of a
/// list item or table cell is unwrapped, a blank-line div (`<div><br/></div>`)
/// becomes a bare `<br/>`, and empty divs are dropped.
pub struct ExtraDiv;

impl HtmlRewriter for ExtraDiv {
    fn name(&self) -> &'static str {
        "extra-div"
    }

    fn rewrite(&self, html: &str) -> String {
        let mut edits = Vec::new();
        for cell in RE_CELL_OPEN.find_iter(html) {
            let Some(div) = RE_LEADING_DIV
                .captures(&html[cell.end()..])
                .and_then(|caps| caps.get(1))
            else {
                continue;
            };
            let div_start = cell.end() + div.start();
            let div_end = cell.end() + div.end();
            let Some((close_start, close_end)) = find_closing(html, div_end, &RE_DIV_TAG) else {
                continue;
            };
            if !RE_LEADING_CELL_CLOSE.is_match(&html[close_end..]) {
                continue;
            }
            edits.push((div_start, div_end, String::new()));
            edits.push((close_start, close_end, String::new()));
        }
        let unwrapped = apply_edits(html, edits);
        let blank_lines = RE_BLANK_LINE_DIV.replace_all(&unwrapped, "<br/>");
        RE_EMPTY_DIV.replace_all(&blank_lines, "").into_owned()
    }
}

// ── TextFormatter ────────────────────────────────────────────────────────────

static RE_SPAN_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<span\b([^>]*?)>").unwrap());
static RE_LEADING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(b|strong|i|em|s)>(\s+)").unwrap());
static RE_TRAILING_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\s+)</(b|strong|i|em|s)>").unwrap());
static RE_EMPTY_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:b|strong|i|em|s)>\s*</(?:b|strong|i|em|s)>").unwrap());

/// Converts inline-style formatting on `<span>` into semantic tags and
/// moves whitespace outside emphasis tags, where Markdown needs it.
///
/// Highlights (a non-white `background-color` or `-evernote-highlight`)
/// become `<mark>`; the renderer decides how to show them.
pub struct TextFormatter;

impl HtmlRewriter for TextFormatter {
    fn name(&self) -> &'static str {
        "text-formatter"
    }

    fn rewrite(&self, html: &str) -> String {
        let mut edits = Vec::new();
        for caps in RE_SPAN_OPEN.captures_iter(html) {
            let (Some(open), Some(attrs)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if attrs.as_str().trim_end().ends_with('/') {
                continue;
            }
            let tags = style_tags(&attr(attrs.as_str(), "style").unwrap_or_default());
            if tags.is_empty() {
                continue;
            }
            let Some((close_start, close_end)) = find_closing(html, open.end(), &RE_SPAN_TAG)
            else {
                continue;
            };
            let opening: String = tags.iter().map(|t| format!("<{t}>")).collect();
            let closing: String = tags.iter().rev().map(|t| format!("</{t}>")).collect();
            edits.push((open.start(), open.end(), opening));
            edits.push((close_start, close_end, closing));
        }
        let s = apply_edits(html, edits);
        let s = RE_EMPTY_EMPHASIS.replace_all(&s, "");
        let s = RE_LEADING_SPACE.replace_all(&s, "${2}<${1}>");
        RE_TRAILING_SPACE.replace_all(&s, "</${2}>${1}").into_owned()
    }
}

/// Semantic tags implied by an inline style, outermost first.
fn style_tags(style: &str) -> Vec<&'static str> {
    let mut tags = Vec::new();
    let mut highlight = false;
    for decl in style.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value: String = value
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match prop.as_str() {
            "font-weight" if matches!(value.as_str(), "bold" | "bolder" | "700" | "800" | "900") => {
                tags.push("b")
            }
            "font-style" if value == "italic" => tags.push("i"),
            "text-decoration" | "text-decoration-line" if value.contains("line-through") => {
                tags.push("s")
            }
            "-evernote-highlight" if value == "true" => highlight = true,
            "background-color" | "background" if !is_plain_background(&value) => highlight = true,
            _ => {}
        }
    }
    tags.sort_by_key(|t| match *t {
        "b" => 0,
        "i" => 1,
        _ => 2,
    });
    tags.dedup();
    if highlight {
        tags.push("mark");
    }
    tags
}

fn is_plain_background(value: &str) -> bool {
    matches!(
        value,
        "" | "transparent"
            | "none"
            | "inherit"
            | "initial"
            | "white"
            | "#fff"
            | "#ffffff"
            | "rgb(255,255,255)"
            | "rgba(0,0,0,0)"
    )
}

// ── EmptyAnchor ──────────────────────────────────────────────────────────────

static RE_EMPTY_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>\s*</a\s*>").unwrap());

/// Drops anchors with no content (bookmarks, stray editor artefacts).
pub struct EmptyAnchor;

impl HtmlRewriter for EmptyAnchor {
    fn name(&self) -> &'static str {
        "empty-anchor"
    }

    fn rewrite(&self, html: &str) -> String {
        RE_EMPTY_ANCHOR.replace_all(html, "").into_owned()
    }
}

// ── NormalizeTodo ────────────────────────────────────────────────────────────

static RE_TODO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<en-todo\b([^>]*?)/?>(?:\s*</en-todo\s*>)?").unwrap());

/// Replaces `<en-todo>` checkboxes with task markers the renderer turns into
/// `[x] ` / `[ ] `.
pub struct NormalizeTodo;

impl HtmlRewriter for NormalizeTodo {
    fn name(&self) -> &'static str {
        "normalize-todo"
    }

    fn rewrite(&self, html: &str) -> String {
        RE_TODO
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let checked = attr(&caps[1], "checked")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
                if checked {
                    TODO_CHECKED
                } else {
                    TODO_UNCHECKED
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_block_becomes_pre() {
        let html = concat!(
            r#"<p>before</p><div style="box-sizing: border-box; -en-codeblock: true;">"#,
            r#"<div>fn main() {</div><div><br/></div><div>&lt;x&gt;</div></div><p>after</p>"#
        );
        assert_eq!(
            Code.rewrite(html),
            "<p>before</p><pre><code>fn main() {\n\n&lt;x&gt;</code></pre><p>after</p>"
        );
    }

    #[test]
    fn unbalanced_code_block_is_untouched() {
        let html = r#"<div style="-en-codeblock:true"><div>x</div>"#;
        assert_eq!(Code.rewrite(html), html);
    }

    #[test]
    fn extra_div_unwraps_sole_child() {
        let html = "<ul><li><div>one</div></li><li> <div>two</div> </li></ul>";
        assert_eq!(ExtraDiv.rewrite(html), "<ul><li>one</li><li> two </li></ul>");
    }

    #[test]
    fn extra_div_keeps_div_with_siblings() {
        let html = "<ul><li><div>one</div><ul><li>two</li></ul></li></ul>";
        assert_eq!(ExtraDiv.rewrite(html), html);
    }

    #[test]
    fn extra_div_flattens_blank_line_divs() {
        let html = r#"<div>a</div><div><br/></div><div class="x"> <br> </div><div>b</div>"#;
        assert_eq!(
            ExtraDiv.rewrite(html),
            "<div>a</div><br/><br/><div>b</div>"
        );
    }

    #[test]
    fn extra_div_drops_empty_divs() {
        assert_eq!(ExtraDiv.rewrite("<div>a</div><div> </div>"), "<div>a</div>");
    }

    #[test]
    fn text_formatter_maps_styles() {
        let html = r#"<span style="font-weight: bold;">bold</span> <span style="font-style:italic; text-decoration: line-through">gone</span>"#;
        assert_eq!(TextFormatter.rewrite(html), "<b>bold</b> <i><s>gone</s></i>");
    }

    #[test]
    fn text_formatter_marks_highlights() {
        let html = r#"<span style="background-color: rgb(255, 250, 165);">hot</span><span style="background-color:#ffffff">plain</span>"#;
        assert_eq!(
            TextFormatter.rewrite(html),
            r#"<mark>hot</mark><span style="background-color:#ffffff">plain</span>"#
        );
    }

    #[test]
    fn text_formatter_handles_nested_spans() {
        let html = r#"<span style="font-weight:bold">a <span>b</span> c</span>"#;
        assert_eq!(TextFormatter.rewrite(html), "<b>a <span>b</span> c</b>");
    }

    #[test]
    fn text_formatter_moves_whitespace_out() {
        assert_eq!(
            TextFormatter.rewrite("x<b> bold </b>y<i></i>"),
            "x <b>bold</b> y"
        );
    }

    #[test]
    fn empty_anchor_removed() {
        assert_eq!(
            EmptyAnchor.rewrite(r#"<a name="top"></a><a href="x">x</a>"#),
            r#"<a href="x">x</a>"#
        );
    }

    #[test]
    fn todo_markers() {
        let html = r#"<div><en-todo checked="true"/>done</div><div><en-todo/>open</div><div><en-todo checked="false"></en-todo>no</div>"#;
        let out = NormalizeTodo.rewrite(html);
        assert_eq!(
            out,
            format!(
                "<div>{TODO_CHECKED}done</div><div>{TODO_UNCHECKED}open</div><div>{TODO_UNCHECKED}no</div>"
            )
        );
    }
}
