// Corpus validator — decodes an uploaded payload into a validated corpus.
//
// One document candidate per line. Validation is all-or-nothing: a payload
// either yields a corpus of at least MIN_DOCUMENTS documents or an error.

use serde::Serialize;

use super::normalize::{is_separator, normalize_line};
use crate::error::AxisError;

/// Minimum number of documents needed for a meaningful decomposition.
pub const MIN_DOCUMENTS: usize = 10;

/// A validated, normalized sequence of documents in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Corpus {
    documents: Vec<String>,
}

impl Corpus {
    /// Decode a raw payload as UTF-8 and validate it.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, AxisError> {
        let text = std::str::from_utf8(payload)?;
        Self::from_text(text)
    }

    /// Split text into lines, normalize each, and validate the result.
    pub fn from_text(text: &str) -> Result<Self, AxisError> {
        let documents: Vec<String> = text
            .lines()
            .map(|line| line.trim_matches(is_separator))
            .filter(|line| !line.is_empty())
            .filter_map(normalize_line)
            .collect();

        if documents.is_empty() {
            return Err(AxisError::EmptyCorpus);
        }
        if documents.len() < MIN_DOCUMENTS {
            return Err(AxisError::insufficient_data(MIN_DOCUMENTS, documents.len()));
        }

        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
