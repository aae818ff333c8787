//! HTML pre-normalisation: an ordered chain of markup rewrite rules.
//!
//! Note bodies carry editor quirks that a generic HTML → Markdown renderer
//! handles badly: proprietary `<en-media>`/`<en-todo>` elements, code blocks
//! expressed as styled `<div>`s, formatting expressed as inline styles. Each
//! quirk gets one [`HtmlRewriter`]; a [`RewriteChain`] applies them in a
//! fixed order, each rule receiving the previous rule's output.
//!
//! ## Rule Order
//!
//! The media resolver runs first so every resource reference is a plain
//! `<img>`/`<a>` before structural rules look at the markup. Code blocks are
//! extracted before the generic div cleanup would flatten their line divs.
//! Inline formatting is fixed before empty anchors are dropped, and todo
//! markers are replaced last, once their surrounding structure is settled.
//!
//! Rules never fail: markup they cannot make sense of is passed through
//! unchanged.

mod media;
mod rules;

pub use media::MediaResolver;
pub use rules::{Code, EmptyAnchor, ExtraDiv, NormalizeTodo, TextFormatter};

use crate::output::ResourceIndex;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// One markup → markup transformation.
pub trait HtmlRewriter {
    /// Short name, used in logs and to check chain order.
    fn name(&self) -> &'static str;

    /// Rewrite the whole document. Must not fail; unparseable fragments
    /// are returned untouched.
    fn rewrite(&self, html: &str) -> String;
}

/// An ordered list of rewrite rules.
#[derive(Default)]
pub struct RewriteChain<'a> {
    rules: Vec<Box<dyn HtmlRewriter + 'a>>,
}

impl<'a> RewriteChain<'a> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard chain, resolving media against `media`.
    pub fn standard(media: &'a ResourceIndex) -> Self {
        Self::new()
            .with_rule(MediaResolver::new(media))
            .with_rule(Code)
            .with_rule(ExtraDiv)
            .with_rule(TextFormatter)
            .with_rule(EmptyAnchor)
            .with_rule(NormalizeTodo)
    }

    /// Append a rule at the end of the chain.
    pub fn with_rule(mut self, rule: impl HtmlRewriter + 'a) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Rule names in application order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn apply(&self, html: &str) -> String {
        self.rules.iter().fold(html.to_string(), |acc, rule| {
            let out = rule.rewrite(&acc);
            debug!("Rewrite {}: {} → {} bytes", rule.name(), acc.len(), out.len());
            out
        })
    }
}

// ── Shared markup helpers ────────────────────────────────────────────────────

static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#).unwrap()
});

/// Value of attribute `name` inside a tag's attribute text.
pub(crate) fn attr(attrs: &str, name: &str) -> Option<String> {
    RE_ATTR.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
    })
}

/// Escape text for use inside a double-quoted attribute or element body.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Find the tag closing the element whose open tag ends at byte `from`.
///
/// `tags` must match both open and close tags of one element type, with
/// capture 1 holding the `/` of a close tag and capture 2 the `/` of a
/// self-closing tag. Returns the byte range of the close tag, or `None`
/// when the markup is unbalanced.
pub(crate) fn find_closing(html: &str, from: usize, tags: &Regex) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    for caps in tags.captures_iter(&html[from..]) {
        let m = caps.get(0)?;
        let closing = caps.get(1).is_some_and(|c| !c.as_str().is_empty());
        let self_closing = caps.get(2).is_some_and(|c| !c.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Some((from + m.start(), from + m.end()));
            }
        } else if !self_closing {
            depth += 1;
        }
    }
    None
}

/// Replace byte ranges of `html`. Edits must not overlap.
pub(crate) fn apply_edits(html: &str, mut edits: Vec<(usize, usize, String)>) -> String {
    edits.sort_by_key(|(start, _, _)| *start);
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        if start < cursor {
            continue;
        }
        out.push_str(&html[cursor..start]);
        out.push_str(&replacement);
        cursor = end;
    }
    out.push_str(&html[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Resource, ResourceKind};

    struct Upper;

    impl HtmlRewriter for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn rewrite(&self, html: &str) -> String {
            html.to_uppercase()
        }
    }

    struct Suffix(&'static str);

    impl HtmlRewriter for Suffix {
        fn name(&self) -> &'static str {
            "suffix"
        }

        fn rewrite(&self, html: &str) -> String {
            format!("{html}{}", self.0)
        }
    }

    #[test]
    fn standard_chain_order() {
        let media = ResourceIndex::new();
        let chain = RewriteChain::standard(&media);
        assert_eq!(
            chain.names(),
            vec![
                "media",
                "code",
                "extra-div",
                "text-formatter",
                "empty-anchor",
                "normalize-todo"
            ]
        );
    }

    #[test]
    fn rules_apply_in_sequence() {
        let a = RewriteChain::new().with_rule(Upper).with_rule(Suffix("x"));
        let b = RewriteChain::new().with_rule(Suffix("x")).with_rule(Upper);
        assert_eq!(a.apply("ab"), "ABx");
        assert_eq!(b.apply("ab"), "ABX");
    }

    #[test]
    fn media_resolved_before_structure_rules() {
        let mut media = ResourceIndex::new();
        media.insert(
            "abc".into(),
            Resource {
                file_name: "0_0.png".into(),
                display_name: "cat.png".into(),
                kind: ResourceKind::Image,
                content: vec![],
            },
        );
        let chain = RewriteChain::standard(&media);
        let out = chain.apply(r#"<ul><li><div><en-media hash="abc" type="image/png"/></div></li></ul>"#);
        assert_eq!(
            out,
            r#"<ul><li><img src="image/0_0.png" alt="cat.png" /></li></ul>"#
        );
    }

    #[test]
    fn attr_reads_all_quote_styles() {
        assert_eq!(attr(r#" hash="a1" type='image/png'"#, "type").as_deref(), Some("image/png"));
        assert_eq!(attr(r#" checked=true"#, "CHECKED").as_deref(), Some("true"));
        assert_eq!(attr(r#" hash="a1""#, "missing"), None);
    }

    #[test]
    fn find_closing_skips_nested() {
        static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*?(/?)>").unwrap());
        let html = "<div>a<div>b</div><div/>c</div>d";
        let (s, e) = find_closing(html, 5, &RE).expect("balanced");
        assert_eq!(&html[s..e], "</div>");
        assert_eq!(&html[e..], "d");
        assert_eq!(find_closing("<div>a<div>b</div>", 5, &RE), None);
    }
}
