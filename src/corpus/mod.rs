// Corpus ingestion — per-line normalization and all-or-nothing validation.

pub mod normalize;
pub mod validate;

pub use normalize::{is_separator, normalize_line};
pub use validate::{Corpus, MIN_DOCUMENTS};
