//! Code fence info string parsing.

/// Language reported for code blocks that declare none.
pub const PLAIN_TEXT: &str = "plaintext";

/// What a code fence's info string declares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FenceInfo {
    /// Declared language, as written (e.g. `ts`)
    pub language: Option<String>,

    /// Optional title, from `title="..."` or `filename="..."`
    pub title: Option<String>,
}

impl FenceInfo {
    /// Parse a code fence info string such as `ts title="index.ts"`.
    pub fn parse(info: &str) -> Self {
        let language = info
            .split_whitespace()
            .next()
            .filter(|token| !token.contains('='))
            .map(|token| token.trim_start_matches('{').trim_end_matches('}'))
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        let title = extract_attribute(info, "title").or_else(|| extract_attribute(info, "filename"));

        Self { language, title }
    }
}

/// Extract a `key="value"` or `key=value` attribute from an info string.
fn extract_attribute(info: &str, key: &str) -> Option<String> {
    let quoted = format!("{}=\"", key);
    if let Some(start) = find_attribute(info, &quoted) {
        let rest = &info[start + quoted.len()..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    let bare = format!("{}=", key);
    if let Some(start) = find_attribute(info, &bare) {
        let rest = &info[start + bare.len()..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let value = rest[..end].trim_matches('"');
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

/// Find `needle` at the start of a whitespace-separated token.
fn find_attribute(info: &str, needle: &str) -> Option<usize> {
    info.match_indices(needle)
        .map(|(i, _)| i)
        .find(|&i| i == 0 || info[..i].ends_with(char::is_whitespace))
}
