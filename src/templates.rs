//! Default templates for tag lists and front matter.
//!
//! Centralising the defaults here keeps one source of truth for the output
//! layout and lets tests inspect them without building a converter. Callers
//! override them through [`crate::config::ConversionConfigBuilder`].

/// Substitution token every tag template must contain exactly once.
pub const TAG_TOKEN: &str = "{{tag}}";

/// Default tag template: one hashtag per tag.
pub const DEFAULT_TAG_TEMPLATE: &str = "#{{tag}}";

/// Template used for the `TagList` value handed to the front matter.
pub const FRONT_MATTER_TAG_TEMPLATE: &str = "'{{tag}}'";

/// Separator between tags inside the front matter `tags: [ … ]` list.
pub const FRONT_MATTER_TAG_SEPARATOR: &str = ", ";

/// Timestamp layout used for `CTime` / `MTime` in the front matter.
pub const FRONT_MATTER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Default front-matter template (minijinja syntax).
///
/// Recognised fields: `CTime`, `MTime`, `Title`, `TagList` and
/// `Attributes.{SourceUrl,Latitude,Longitude,Altitude,Source}`. Helper
/// filters: `trim`, `quote`. Optional lines disappear entirely when their
/// field is empty.
pub const DEFAULT_FRONT_MATTER_TEMPLATE: &str = r#"---
date: '{{ CTime }}'
updated_at: '{{ MTime }}'
title: {{ Title | trim | quote }}
{%- if TagList %}
tags: [ {{ TagList }} ]
{%- endif %}
{%- if Attributes.SourceUrl | trim %}
url: {{ Attributes.SourceUrl | trim }}
{%- endif %}
{%- if Attributes.Latitude | trim %}
latitude: {{ Attributes.Latitude | trim }}
{%- endif %}
{%- if Attributes.Longitude | trim %}
longitude: {{ Attributes.Longitude | trim }}
{%- endif %}
{%- if Attributes.Altitude | trim %}
altitude: {{ Attributes.Altitude | trim }}
{%- endif %}
{%- if Attributes.Source | trim %}
source: {{ Attributes.Source | trim }}
{%- endif %}
---

"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_templates_hold_one_token() {
        assert_eq!(DEFAULT_TAG_TEMPLATE.matches(TAG_TOKEN).count(), 1);
        assert_eq!(FRONT_MATTER_TAG_TEMPLATE.matches(TAG_TOKEN).count(), 1);
    }

    #[test]
    fn front_matter_is_delimited() {
        assert!(DEFAULT_FRONT_MATTER_TEMPLATE.starts_with("---\n"));
        assert!(DEFAULT_FRONT_MATTER_TEMPLATE.ends_with("---\n\n"));
    }
}
