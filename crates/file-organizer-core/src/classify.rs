use crate::config::Category;

/// Pick the category for a lowercase compound extension.
///
/// Longer suffixes win: for `.backup.tar.gz` the candidates `.backup.tar.gz`,
/// `.tar.gz` and `.gz` are tried in that order, each against the table in
/// declaration order. Falls back to `fallback` when nothing matches.
pub fn classify<'a>(extension: &str, categories: &'a [Category], fallback: &'a str) -> &'a str {
    suffix_candidates(extension)
        .find_map(|candidate| {
            categories
                .iter()
                .find(|category| category.extensions.iter().any(|e| e == candidate))
        })
        .map(|category| category.name.as_str())
        .unwrap_or(fallback)
}

/// Suffixes of a compound extension, longest first
fn suffix_candidates(extension: &str) -> impl Iterator<Item = &str> {
    extension
        .char_indices()
        .filter(|&(_, c)| c == '.')
        .map(move |(idx, _)| &extension[idx..])
}
