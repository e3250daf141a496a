//! Heading slug generation.

use std::collections::HashMap;

/// Convert heading text to a URL-safe slug.
///
/// Lowercases, drops punctuation and symbols, and turns spaces into hyphens.
/// Letters and digits of any script are kept.
///
/// ```
/// use quill_mdx::slug::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("What's new?"), "whats-new");
/// ```
pub fn slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Generates unique slugs within one document.
///
/// Repeated headings get `-1`, `-2`, ... suffixes in order of appearance.
#[derive(Debug, Default)]
pub struct Slugger {
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`, unique among the slugs this slugger returned so far.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();

        while let Some(count) = self.occurrences.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{}-{}", base, count);
        }

        self.occurrences.insert(candidate.clone(), 0);
        candidate
    }

    /// Reserve a slug that is already present in the document.
    pub fn reserve(&mut self, slug: &str) {
        self.occurrences.entry(slug.to_string()).or_insert(0);
    }
}
