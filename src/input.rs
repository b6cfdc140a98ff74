//! Normalisation of pasted log text into ingestible lines.

/// Split raw text into trimmed, non-empty lines, preserving paste order.
///
/// Total over all inputs; an empty result is the caller's signal to reject the submission.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(normalize_lines("").is_empty());
        assert!(normalize_lines("  \n\n  ").is_empty());
        assert!(normalize_lines("\t\r\n \r\n").is_empty());
    }

    #[test]
    fn single_line_passes_through() {
        let line = "2025-12-05 10:15:30 ERROR OrderService - DB down";
        assert_eq!(normalize_lines(line), vec![line.to_string()]);
    }

    #[test]
    fn trims_and_drops_blank_lines_in_order() {
        let raw = "  first  \n\n\tsecond\r\n   \nthird";
        assert_eq!(normalize_lines(raw), vec!["first", "second", "third"]);
    }

    #[test]
    fn interior_whitespace_is_kept() {
        assert_eq!(
            normalize_lines("  a   b  \n"),
            vec!["a   b".to_string()]
        );
    }
}
