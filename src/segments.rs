//! # Segment Parser
//!
//! Splits a string into alternating literal and expression runs. An expression
//! run is everything between an outermost `{` and its matching `}`; braces nested
//! inside an open expression are kept as part of the expression text.
//!
//! The same grammar is shared by template text, attribute values and route
//! templates, so `/article/{slug}` and `<p>{ 1 + 1 }</p>` go through the exact
//! same scanner.
//!
//! ```rust
//! use keml::segments::{parse, Segment};
//!
//! let segments = parse("/users/{id}/posts");
//! assert_eq!(
//!     segments,
//!     vec![
//!         Segment::literal("/users/"),
//!         Segment::expression("id"),
//!         Segment::literal("/posts"),
//!     ]
//! );
//! ```

/// A literal or expression run produced by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `true` when `text` is an expression to evaluate
    pub expression: bool,
    /// Run contents, without the outermost delimiting braces
    pub text: String,
}

impl Segment {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            expression: false,
            text: text.into(),
        }
    }

    pub fn expression(text: impl Into<String>) -> Self {
        Self {
            expression: true,
            text: text.into(),
        }
    }
}

/// Parse `template` into strictly alternating literal/expression segments.
///
/// Never fails: an unmatched `}` at depth zero is kept as a literal character,
/// and an unterminated `{` leaves a trailing expression segment.
#[must_use]
pub fn parse(template: &str) -> Vec<Segment> {
    let mut depth: usize = 0;
    let mut results: Vec<Segment> = Vec::new();

    for ch in template.chars() {
        let inside = depth > 0;
        if ch == '{' {
            depth += 1;
            if !inside {
                continue;
            }
        }
        if ch == '}' {
            depth = depth.saturating_sub(1);
            if inside && depth == 0 {
                continue;
            }
        }
        let inside = depth > 0;
        match results.last_mut() {
            Some(last) if last.expression == inside => last.text.push(ch),
            _ => results.push(Segment {
                expression: inside,
                text: ch.to_string(),
            }),
        }
    }

    results
}

/// Trimmed text of every expression segment, in order.
///
/// For route templates these are the capture names.
#[must_use]
pub fn extract_names(segments: &[Segment]) -> Vec<String> {
    segments
        .iter()
        .filter(|s| s.expression)
        .map(|s| s.text.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_literal() {
        assert_eq!(parse("/about"), vec![Segment::literal("/about")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("{}").is_empty());
    }

    #[test]
    fn test_expression_between_literals() {
        assert_eq!(
            parse("<p>{ 1 + 1 }</p>"),
            vec![
                Segment::literal("<p>"),
                Segment::expression(" 1 + 1 "),
                Segment::literal("</p>"),
            ]
        );
    }

    #[test]
    fn test_nested_braces_kept_in_expression() {
        assert_eq!(
            parse("a{ {1} }b"),
            vec![
                Segment::literal("a"),
                Segment::expression(" {1} "),
                Segment::literal("b"),
            ]
        );
    }

    #[test]
    fn test_unmatched_close_is_literal() {
        assert_eq!(parse("a}b"), vec![Segment::literal("a}b")]);
        assert_eq!(
            parse("}{x}"),
            vec![Segment::literal("}"), Segment::expression("x")]
        );
    }

    #[test]
    fn test_unterminated_open_is_expression() {
        assert_eq!(
            parse("hello {name"),
            vec![Segment::literal("hello "), Segment::expression("name")]
        );
    }

    #[test]
    fn test_adjacent_expressions_merge() {
        // Two back-to-back expressions share a tag, so they collapse into one run.
        assert_eq!(parse("{a}{b}"), vec![Segment::expression("ab")]);
    }

    #[test]
    fn test_extract_names_trims() {
        let segments = parse("/profile/{ slug }/{page}");
        assert_eq!(extract_names(&segments), vec!["slug", "page"]);
    }

    fn delimiter_count(s: &str) -> usize {
        let mut depth = 0usize;
        let mut consumed = 0usize;
        for ch in s.chars() {
            match ch {
                '{' => {
                    if depth == 0 {
                        consumed += 1;
                    }
                    depth += 1;
                }
                '}' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        consumed += 1;
                    }
                }
                _ => {}
            }
        }
        consumed
    }

    proptest! {
        #[test]
        fn prop_segments_alternate(s in "[a-c{} ]{0,40}") {
            let segments = parse(&s);
            for pair in segments.windows(2) {
                prop_assert_ne!(pair[0].expression, pair[1].expression);
            }
        }

        #[test]
        fn prop_length_consistent(s in "[a-c{} ]{0,40}") {
            let total: usize = parse(&s).iter().map(|seg| seg.text.chars().count()).sum();
            prop_assert_eq!(total + delimiter_count(&s), s.chars().count());
        }

        #[test]
        fn prop_no_braces_is_identity(s in "[a-z/ ]{1,40}") {
            prop_assert_eq!(parse(&s), vec![Segment::literal(s.clone())]);
        }
    }
}
