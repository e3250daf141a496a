//! Derived frontmatter fields: reading time and slug.

use std::path::Path;

use unicode_segmentation::UnicodeSegmentation;

use crate::frontmatter::Frontmatter;

/// Reading speed used for estimates.
pub const WORDS_PER_MINUTE: f64 = 200.0;

/// File suffix of post sources.
pub const SOURCE_EXTENSION: &str = ".mdx";

/// Fill in `reading_time` and `slug` on a post's frontmatter.
///
/// Pure and idempotent: enriching already-enriched frontmatter with the same
/// body and slug yields an equal value.
pub fn enrich(mut frontmatter: Frontmatter, body: &str, slug: &str) -> Frontmatter {
    frontmatter.reading_time = Some(reading_time(body));
    frontmatter.slug = Some(slug.to_string());
    frontmatter
}

/// Count the words of a document body.
///
/// Words are Unicode word segments; ideographic scripts count one word per
/// character.
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Reading-time text with the trailing `read` dropped, e.g. `"5 min "`.
pub fn reading_time(body: &str) -> String {
    let minutes = word_count(body) as f64 / WORDS_PER_MINUTE;
    // round to two decimals before taking the ceiling so 2.001 reads as 2
    let displayed = ((minutes * 100.0).round() / 100.0).ceil() as u64;
    let text = format!("{} min read", displayed);

    match text.split_once("read") {
        Some((prefix, _)) => prefix.to_string(),
        None => text,
    }
}

/// Derive a post slug from its source path: the last path segment without
/// the `.mdx` suffix.
pub fn slug_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(SOURCE_EXTENSION).unwrap_or(name);

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_document;
    use std::path::PathBuf;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn estimates_reading_time() {
        assert_eq!(reading_time(&words(400)), "2 min ");
        assert_eq!(reading_time(&words(250)), "2 min ");
        assert_eq!(reading_time(&words(200)), "1 min ");
        assert_eq!(reading_time(&words(1)), "1 min ");
        assert_eq!(reading_time(""), "0 min ");
    }

    #[test]
    fn ignores_markup_symbols() {
        let body = "# Title\n\n```\n---\n```\n\n- one\n- two";
        assert_eq!(word_count(body), 3);
    }

    #[test]
    fn derives_slug_from_path() {
        assert_eq!(
            slug_from_path(&PathBuf::from("posts/2024/hello-world.mdx")),
            Some("hello-world".to_string())
        );
        assert_eq!(
            slug_from_path(&PathBuf::from("a.b.mdx")),
            Some("a.b".to_string())
        );
        assert_eq!(slug_from_path(&PathBuf::from(".mdx")), None);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let body = "Some words to read.";
        let (fm, _) = parse_document("---\ntitle: T\ndate: 2024-01-01\n---\n").unwrap();

        let once = enrich(fm, body, "t");
        let twice = enrich(once.clone(), body, "t");

        assert_eq!(once, twice);
        assert_eq!(once.slug.as_deref(), Some("t"));
        assert_eq!(once.reading_time.as_deref(), Some("1 min "));
    }
}
