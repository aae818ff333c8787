use super::{attr, escape_html, HtmlRewriter};
use crate::output::{ResourceIndex, ResourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_MEDIA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<en-media\b([^>]*?)/?>(?:\s*</en-media>)?").unwrap()
});

/// Resolves `<en-media hash="…">` references against the resource index.
///
/// Images become `<img>` elements, everything else a link whose text is the
/// resource's display name. A hash with no matching resource still yields a
/// reference, pointing at the hash itself.
pub struct MediaResolver<'a> {
    media: &'a ResourceIndex,
}

impl<'a> MediaResolver<'a> {
    pub fn new(media: &'a ResourceIndex) -> Self {
        Self { media }
    }
}

impl HtmlRewriter for MediaResolver<'_> {
    fn name(&self) -> &'static str {
        "media"
    }

    fn rewrite(&self, html: &str) -> String {
        RE_MEDIA
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let Some(hash) = attr(&caps[1], "hash") else {
                    return caps[0].to_string();
                };
                let hash = hash.trim().to_ascii_lowercase();

                let (kind, path, label) = match self.media.get(&hash) {
                    Some(res) => (res.kind, res.link_path(), res.display_name.clone()),
                    None => {
                        warn!("No resource for media reference {}", hash);
                        let mime = attr(&caps[1], "type").unwrap_or_default();
                        (ResourceKind::from_mime(&mime), hash.clone(), hash)
                    }
                };

                match kind {
                    ResourceKind::Image => format!(
                        r#"<img src="{}" alt="{}" />"#,
                        escape_html(&path),
                        escape_html(&label)
                    ),
                    ResourceKind::File => format!(
                        r#"<a href="{}">{}</a>"#,
                        escape_html(&path),
                        escape_html(&label)
                    ),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Resource;

    fn index() -> ResourceIndex {
        let mut media = ResourceIndex::new();
        media.insert(
            "aa11".into(),
            Resource {
                file_name: "2_0.png".into(),
                display_name: "photo.png".into(),
                kind: ResourceKind::Image,
                content: vec![],
            },
        );
        media.insert(
            "bb22".into(),
            Resource {
                file_name: "2_1.pdf".into(),
                display_name: "Q&A.pdf".into(),
                kind: ResourceKind::File,
                content: vec![],
            },
        );
        media
    }

    #[test]
    fn resolves_image_and_file() {
        let media = index();
        let rule = MediaResolver::new(&media);
        let out = rule.rewrite(
            r#"<div><en-media hash="AA11" type="image/png"/></div><en-media type="application/pdf" hash="bb22"></en-media>"#,
        );
        assert_eq!(
            out,
            r#"<div><img src="image/2_0.png" alt="photo.png" /></div><a href="file/2_1.pdf">Q&amp;A.pdf</a>"#
        );
    }

    #[test]
    fn unknown_hash_falls_back_to_identifier() {
        let media = index();
        let rule = MediaResolver::new(&media);
        let out = rule.rewrite(r#"<en-media hash="ffff" type="image/jpeg"/>"#);
        assert_eq!(out, r#"<img src="ffff" alt="ffff" />"#);
    }

    #[test]
    fn media_without_hash_is_untouched() {
        let media = index();
        let rule = MediaResolver::new(&media);
        let html = r#"<en-media type="image/png"/>"#;
        assert_eq!(rule.rewrite(html), html);
    }
}
