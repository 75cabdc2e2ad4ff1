/// Fold a subject name into the key space shared by the roster and the prediction table.
///
/// Invisible marks are removed, internal whitespace collapsed to single spaces, and the
/// result upper-cased with full Unicode case mapping so accented names match.
pub(crate) fn normalize_subject(value: &str) -> String {
    let cleaned = strip_invisible(value);
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_uppercase()
}

pub(crate) fn strip_invisible(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "")
}
