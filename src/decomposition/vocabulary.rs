// Vocabulary construction shared by the engines.
//
// Terms are separator-delimited tokens of at least two characters, deduplicated and
// sorted, so a term's index only depends on the corpus contents.

use std::collections::BTreeSet;

use crate::corpus::is_separator;

/// Shortest token kept as a vocabulary term.
pub const MIN_TERM_CHARS: usize = 2;

/// Split a normalized document into candidate terms.
pub fn tokenize(document: &str) -> impl Iterator<Item = &str> {
    document
        .split(is_separator)
        .filter(|token| token.chars().count() >= MIN_TERM_CHARS)
}

/// Build the sorted, duplicate-free vocabulary of a set of documents.
pub fn build_vocabulary(documents: &[String]) -> Vec<String> {
    documents
        .iter()
        .flat_map(|doc| tokenize(doc))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
