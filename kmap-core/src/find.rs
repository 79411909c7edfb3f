//! Search term matching for find-in-map.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Node};
use crate::{MapError, MapResult};

/// Options for [`compile_find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOptions {
    /// Only match terms on word boundaries.
    pub whole_word: bool,
    /// Treat `*` and `?` as word-character wildcards.
    pub keep_search_special_chars: bool,
}

/// A compiled set of search terms. Matches when any term matches.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Option<Regex>,
}

impl Matcher {
    /// Test a piece of text.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }

    /// Test a node's display name and detail.
    #[must_use]
    pub fn matches_node(&self, node: &Node) -> bool {
        self.is_match(&node.search_text())
    }

    /// Test an edge's label and detail.
    #[must_use]
    pub fn matches_edge(&self, edge: &Edge) -> bool {
        self.is_match(&edge.search_text())
    }

    /// The combined pattern, if any terms were given.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

fn term_pattern(term: &str, options: FindOptions) -> String {
    let mut pattern = regex::escape(term);
    if options.keep_search_special_chars {
        pattern = pattern.replace(r"\*", r"\w*").replace(r"\?", r"\w?");
    }
    let pattern = pattern.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" +");
    if options.whole_word {
        format!(r"\b{pattern}\b")
    } else {
        pattern
    }
}

/// Compile search terms into a case-insensitive matcher.
///
/// An empty term list matches nothing.
///
/// # Errors
///
/// Returns an error if the combined pattern cannot be compiled.
pub fn compile_find<S: AsRef<str>>(terms: &[S], options: FindOptions) -> MapResult<Matcher> {
    let patterns: Vec<String> = terms
        .iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| term_pattern(t, options))
        .collect();

    if patterns.is_empty() {
        return Ok(Matcher { pattern: None });
    }

    let pattern = RegexBuilder::new(&patterns.join("|"))
        .case_insensitive(true)
        .build()
        .map_err(|e| MapError::InvalidPattern(e.to_string()))?;

    Ok(Matcher {
        pattern: Some(pattern),
    })
}

/// Split a query into terms on spaces, keeping double-quoted phrases together.
#[must_use]
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut term = String::new();
    let mut quoted = false;

    for c in query.chars() {
        match c {
            '"' => quoted = !quoted,
            ' ' if !quoted => {}
            _ => {
                term.push(c);
                continue;
            }
        }
        let trimmed = term.trim();
        if !trimmed.is_empty() {
            terms.push(trimmed.to_string());
        }
        term.clear();
    }

    let trimmed = term.trim();
    if !trimmed.is_empty() {
        terms.push(trimmed.to_string());
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_terms_any_match() {
        let matcher = compile_find(&["insulin", "glucose"], FindOptions::default()).unwrap();
        assert!(matcher.is_match("blood glucose level"));
        assert!(matcher.is_match("INSULIN"));
        assert!(!matcher.is_match("glycogen"));
    }

    #[test]
    fn test_special_chars_escaped() {
        let matcher = compile_find(&["a.b"], FindOptions::default()).unwrap();
        assert!(matcher.is_match("xa.by"));
        assert!(!matcher.is_match("axb"));
    }

    #[test]
    fn test_whole_word() {
        let options = FindOptions {
            whole_word: true,
            ..FindOptions::default()
        };
        let matcher = compile_find(&["gene"], options).unwrap();
        assert!(matcher.is_match("a gene here"));
        assert!(!matcher.is_match("genetics"));
    }

    #[test]
    fn test_wildcards() {
        let options = FindOptions {
            keep_search_special_chars: true,
            ..FindOptions::default()
        };
        let matcher = compile_find(&["gen*s"], options).unwrap();
        assert!(matcher.is_match("genetics"));
        let matcher = compile_find(&["c?t"], options).unwrap();
        assert!(matcher.is_match("cat"));
        assert!(matcher.is_match("ct"));

        let literal = compile_find(&["c?t"], FindOptions::default()).unwrap();
        assert!(!literal.is_match("cat"));
        assert!(literal.is_match("c?t"));
    }

    #[test]
    fn test_spaces_match_runs() {
        let matcher = compile_find(&["tumor necrosis"], FindOptions::default()).unwrap();
        assert!(matcher.is_match("tumor    necrosis factor"));
    }

    #[test]
    fn test_empty_terms_match_nothing() {
        let matcher = compile_find::<&str>(&[], FindOptions::default()).unwrap();
        assert!(!matcher.is_match("anything"));
        assert!(matcher.pattern().is_none());
    }

    #[test]
    fn test_entity_text() {
        let matcher = compile_find(&["detail"], FindOptions::default()).unwrap();
        let node = Node::new("a", "note", "Title", 0.0, 0.0).with_detail("Some Detail");
        assert!(matcher.matches_node(&node));
        assert!(!matcher.matches_edge(&Edge::new("a", "b", "unrelated")));
    }

    #[test]
    fn test_tokenize_query() {
        assert_eq!(
            tokenize_query(r#"insulin "blood sugar"  x"#),
            vec!["insulin", "blood sugar", "x"]
        );
        assert!(tokenize_query("   ").is_empty());
    }
}
