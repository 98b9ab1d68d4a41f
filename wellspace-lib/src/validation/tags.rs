//! Tag input parsing

use super::schemas::MAX_TAGS;

/// Parses comma-separated tag input.
///
/// Entries are trimmed, empty ones dropped, and only the first
/// [`MAX_TAGS`] kept. Duplicates are preserved.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

/// Trims tags and drops blank ones, without enforcing any limit.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
