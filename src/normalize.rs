/// Canonical form of a single column label: surrounding whitespace removed,
/// upper-cased.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Normalizes every column label of a header row.
///
/// Total and idempotent; the loader calls it exactly once, right after
/// parsing the header, so every later lookup sees canonical names only.
///
/// # Examples
/// ```
/// use dashboard::normalize::normalize_headers;
///
/// let headers = normalize_headers([" region", "Sold Units "]);
/// assert_eq!(headers, vec!["REGION", "SOLD UNITS"]);
/// ```
pub fn normalize_headers<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| normalize_label(label.as_ref()))
        .collect()
}
