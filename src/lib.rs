// Semaxis: semantic axis discovery for small text corpora
//
// This is the library root. A corpus flows through corpus (validation and
// normalization), decomposition (vocabulary and axis weights), axes
// (summaries, labels and plot reduction), and session (the current model).

pub mod axes;
pub mod config;
pub mod corpus;
pub mod decomposition;
pub mod error;
pub mod output;
pub mod session;

#[cfg(feature = "web")]
pub mod web;
