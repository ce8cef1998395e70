//! Genre lists are persisted as a single comma-joined column. Every read and
//! write goes through [`split`] and [`join`] so the two directions agree.

const SEPARATOR: char = ',';

/// Split a stored genre column into its tags, trimming whitespace and
/// dropping empty entries.
pub fn split(stored: &str) -> Vec<String> {
    stored
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags into the stored form. Tags are trimmed, empty ones dropped and
/// embedded separators removed so `split(&join(x))` returns the cleaned tags.
pub fn join<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|g| g.as_ref().replace(SEPARATOR, " "))
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
