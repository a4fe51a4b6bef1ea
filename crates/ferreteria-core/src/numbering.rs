//! Sequential document numbers: prefix + 6 zero-padded digits.

/// Width of the numeric part of a generated document number.
pub const NUMBER_DIGITS: usize = 6;

/// Returns the number following the highest existing number with `prefix`.
///
/// Numbers that don't match `prefix` followed only by digits are ignored,
/// so hand-typed numbers never break the sequence.
///
/// ## Example
/// ```rust
/// use ferreteria_core::numbering::next_document_number;
///
/// assert_eq!(next_document_number("P", ["P000007", "P000002", "MANUAL-1"]), "P000008");
/// assert_eq!(next_document_number("F", Vec::<&str>::new()), "F000001");
/// ```
pub fn next_document_number<I, S>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let last = existing
        .into_iter()
        .filter_map(|number| sequence_of(prefix, number.as_ref()))
        .max()
        .unwrap_or(0);

    format!("{}{:0width$}", prefix, last.saturating_add(1), width = NUMBER_DIGITS)
}

fn sequence_of(prefix: &str, number: &str) -> Option<u64> {
    let digits = number.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
