//! Substring renaming inside string literals and comment tokens.

use quill_core::TextRange;

/// Result of one token's substitution: the new rendered text and the
/// token-relative ranges that were replaced. An unchanged token returns the
/// input byte-identical with no match ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub text: String,
    pub replaced: Vec<TextRange>,
}

impl SubstitutionResult {
    pub fn changed(&self) -> bool {
        !self.replaced.is_empty()
    }
}

/// Replace `pattern` with `replacement` inside `original`, restricted to the
/// supplied sorted token-relative `sub_spans` when present, else by full
/// substring scan.
pub fn replace_matching_substrings(
    original: &str,
    pattern: &str,
    replacement: &str,
    sub_spans: Option<&[TextRange]>,
) -> SubstitutionResult {
    if pattern.is_empty() || pattern == replacement {
        return SubstitutionResult {
            text: original.to_string(),
            replaced: Vec::new(),
        };
    }

    let matches: Vec<TextRange> = match sub_spans {
        Some(spans) => spans
            .iter()
            .filter(|span| {
                original
                    .get(span.start as usize..span.end as usize)
                    .is_some_and(|slice| slice == pattern)
            })
            .copied()
            .collect(),
        None => original
            .match_indices(pattern)
            .map(|(idx, _)| TextRange::at(idx as u32, pattern.len() as u32))
            .collect(),
    };

    if matches.is_empty() {
        return SubstitutionResult {
            text: original.to_string(),
            replaced: Vec::new(),
        };
    }

    let mut text = String::with_capacity(original.len());
    let mut cursor = 0usize;
    for span in &matches {
        text.push_str(&original[cursor..span.start as usize]);
        text.push_str(replacement);
        cursor = span.end as usize;
    }
    text.push_str(&original[cursor..]);

    SubstitutionResult {
        text,
        replaced: matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scan_replaces_every_match() {
        let result = replace_matching_substrings("// count = count + 1", "count", "total", None);
        assert_eq!(result.text, "// total = total + 1");
        assert_eq!(result.replaced.len(), 2);
        assert_eq!(result.replaced[0], TextRange::new(3, 8));
    }

    #[test]
    fn sub_spans_restrict_the_matches() {
        let original = "\"count then count\"";
        let spans = [TextRange::new(1, 6)];
        let result = replace_matching_substrings(original, "count", "total", Some(&spans));
        assert_eq!(result.text, "\"total then count\"");
        assert_eq!(result.replaced, vec![TextRange::new(1, 6)]);
    }

    #[test]
    fn sub_spans_that_do_not_match_are_ignored() {
        let spans = [TextRange::new(0, 5)];
        let result = replace_matching_substrings("other", "count", "total", Some(&spans));
        assert!(!result.changed());
        assert_eq!(result.text, "other");
    }

    #[test]
    fn no_op_is_byte_identical() {
        let result = replace_matching_substrings("nothing here", "count", "total", None);
        assert!(!result.changed());
        assert_eq!(result.text, "nothing here");
    }
}
