use std::ops::Range;

use serde_json::Value;

/// Case-insensitive substring test used by `<field>_like` filters.
///
/// Both sides are lower-cased, then the term must occur as a contiguous
/// substring. An empty term matches any text.
pub fn contains_ci(text: &str, term: &str) -> bool {
    text.to_lowercase().contains(&term.to_lowercase())
}

/// Apply a `_like` term to a JSON field value. Non-string values never match.
pub fn matches_like(value: Option<&Value>, term: &str) -> bool {
    match value {
        Some(Value::String(s)) => contains_ci(s, term),
        _ => false,
    }
}

/// All `(field, term)` pairs must match (logical AND).
pub fn matches_all_like(item: &Value, terms: &[(String, String)]) -> bool {
    terms
        .iter()
        .all(|(field, term)| matches_like(item.get(field), term))
}

/// Byte ranges of every case-insensitive occurrence of `term` in `text`, for
/// highlighting. Returns nothing when lower-casing changes byte offsets.
pub fn match_spans(text: &str, term: &str) -> Vec<Range<usize>> {
    if term.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    let needle = term.to_lowercase();
    if haystack.len() != text.len() {
        return Vec::new();
    }
    haystack
        .match_indices(&needle)
        .map(|(start, m)| start..start + m.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substring_examples() {
        assert!(contains_ci("Product A", "Pro"));
        assert!(!contains_ci("Product A", "xyz"));
        assert!(contains_ci("Product A", ""));
        assert!(contains_ci("", ""));
    }

    #[test]
    fn substring_is_case_insensitive() {
        assert!(contains_ci("Laptop Pro 14", "LAPTOP"));
        assert!(contains_ci("LAPTOP", "lap"));
        assert!(contains_ci("Überzug", "über"));
    }

    #[test]
    fn substring_must_be_contiguous() {
        assert!(!contains_ci("Laptop", "lpt"));
    }

    #[test]
    fn non_string_fields_never_match() {
        assert!(!matches_like(Some(&json!(300)), "3"));
        assert!(!matches_like(Some(&json!(null)), ""));
        assert!(!matches_like(None, ""));
        assert!(matches_like(Some(&json!("300")), "3"));
    }

    #[test]
    fn like_filters_combine_with_and() {
        let item = json!({"name": "Laptop Pro", "sku": "LP-14"});
        let both = vec![
            ("name".to_string(), "pro".to_string()),
            ("sku".to_string(), "lp".to_string()),
        ];
        assert!(matches_all_like(&item, &both));
        let one_fails = vec![
            ("name".to_string(), "pro".to_string()),
            ("sku".to_string(), "zz".to_string()),
        ];
        assert!(!matches_all_like(&item, &one_fails));
        assert!(matches_all_like(&item, &[]));
    }

    #[test]
    fn spans_for_highlighting() {
        assert_eq!(match_spans("Lap lap LAP", "lap"), vec![0..3, 4..7, 8..11]);
        assert!(match_spans("Laptop", "").is_empty());
        assert!(match_spans("Laptop", "zz").is_empty());
    }
}
