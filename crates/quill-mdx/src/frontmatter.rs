//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// Parsed frontmatter from a post.
///
/// `reading_time` and `slug` are derived fields filled in by
/// [`enrich`](crate::enrich::enrich); any other keys the author wrote are kept
/// in `extra` and serialized back at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    /// Post title (required)
    pub title: String,

    /// Publication date (required)
    pub date: PostDate,

    /// Drafts are compiled but never listed
    #[serde(default, skip_serializing_if = "is_false")]
    pub draft: bool,

    /// Short summary shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    /// Reading-time estimate, e.g. `"5 min "`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<String>,

    /// File stem of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Author-supplied keys with no special meaning
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
    })
}

impl Frontmatter {
    /// Build typed frontmatter from a raw header mapping.
    pub fn from_mapping(mapping: Mapping) -> Result<Self, FrontmatterError> {
        for field in ["title", "date"] {
            if !mapping.contains_key(field) {
                return Err(FrontmatterError::MissingField(field));
            }
        }

        serde_yaml::from_value(Value::Mapping(mapping))
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))
    }
}

/// A post date: the string the author wrote plus the instant it denotes.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and offset-less date-times
/// (`YYYY-MM-DDTHH:MM[:SS]`, read as UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDate {
    raw: String,
    instant: DateTime<Utc>,
}

impl PostDate {
    pub fn parse(raw: &str) -> Result<Self, FrontmatterError> {
        let raw = raw.trim();
        let instant =
            parse_instant(raw).ok_or_else(|| FrontmatterError::InvalidDate(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    /// The date as written in the frontmatter.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl fmt::Display for PostDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PostDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PostDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PostDate::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Split a document into its raw header mapping and body.
///
/// The header sits between two lines consisting solely of `---`. Without a
/// header the mapping is empty and the body is the whole input.
pub fn extract_frontmatter(source: &str) -> Result<(Mapping, &str), FrontmatterError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);
    let trimmed = text.trim_start_matches(['\n', '\r']);

    let mut lines = trimmed.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((Mapping::new(), source));
    };
    if first.trim_end() != "---" {
        return Ok((Mapping::new(), source));
    }

    let header_start = first.len();
    let mut offset = header_start;

    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &trimmed[header_start..offset];
            let body = &trimmed[offset + line.len()..];
            return Ok((parse_header(yaml)?, body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed)
}

fn parse_header(yaml: &str) -> Result<Mapping, FrontmatterError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Extract and validate the frontmatter of a post.
pub fn parse_document(source: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let (mapping, body) = extract_frontmatter(source)?;
    Ok((Frontmatter::from_mapping(mapping)?, body))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter must be a mapping of keys to values")]
    NotAMapping,

    #[error("Missing required frontmatter field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid date in frontmatter: {0}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_valid_frontmatter() {
        let source = r#"---
title: Hello
description: A first post
date: 2024-01-01
tags: [rust, blog]
---

# Hello World
"#;

        let (fm, body) = parse_document(source).unwrap();

        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.description.as_deref(), Some("A first post"));
        assert_eq!(fm.date.as_str(), "2024-01-01");
        assert_eq!(fm.tags, vec!["rust", "blog"]);
        assert!(!fm.draft);
        assert!(body.trim_start().starts_with("# Hello World"));
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter here.";

        let (mapping, body) = extract_frontmatter(source).unwrap();

        assert!(mapping.is_empty());
        assert_eq!(body, source);
    }

    #[test]
    fn tolerates_bom_and_trailing_spaces() {
        let source = "\u{feff}---  \ntitle: Spaces\ndate: 2024-03-01\n---   \nbody";

        let (fm, body) = parse_document(source).unwrap();

        assert_eq!(fm.title, "Spaces");
        assert_eq!(body, "body");
    }

    #[test]
    fn keeps_unknown_keys() {
        let source = "---\ntitle: T\ndate: 2024-01-01\ncover: /img/a.png\nseries:\n  - one\n---\n";

        let (fm, _) = parse_document(source).unwrap();

        assert_eq!(
            fm.extra.get("cover"),
            Some(&Value::String("/img/a.png".to_string()))
        );
        assert!(fm.extra.contains_key("series"));
    }

    #[test]
    fn accepts_single_tag() {
        let source = "---\ntitle: T\ndate: 2024-01-01\ntags: rust\n---\n";

        let (fm, _) = parse_document(source).unwrap();

        assert_eq!(fm.tags, vec!["rust"]);
    }

    #[test]
    fn reads_draft_flag() {
        let source = "---\ntitle: T\ndate: 2024-01-01\ndraft: true\n---\n";

        let (fm, _) = parse_document(source).unwrap();

        assert!(fm.draft);
    }

    #[test]
    fn parses_date_formats() {
        let day = PostDate::parse("2024-06-01").unwrap();
        let stamp = PostDate::parse("2024-06-01T12:30:00+02:00").unwrap();
        let naive = PostDate::parse("2024-06-01T12:30").unwrap();

        assert!(stamp.instant() > day.instant());
        assert!(naive.instant() > stamp.instant());
        assert!(PostDate::parse("June 1st").is_err());
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let source = "---\ntitle: Test\n# No closing";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let source = "---\ntitle: [invalid yaml\n---\n";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }

    #[test]
    fn errors_on_scalar_header() {
        let source = "---\njust a string\n---\n";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::NotAMapping)));
    }

    #[test]
    fn errors_on_missing_title() {
        let source = "---\ndate: 2024-01-01\n---\n";

        let result = parse_document(source);

        assert!(matches!(result, Err(FrontmatterError::MissingField("title"))));
    }

    #[test]
    fn errors_on_bad_date() {
        let source = "---\ntitle: T\ndate: yesterday\n---\n";

        let result = parse_document(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }
}
