// Error kinds surfaced to callers of the train and visualize operations.
//
// Engine internals and CLI plumbing use anyhow; everything that crosses the
// request boundary is converted into one of these variants first.

use thiserror::Error;

/// Errors returned by corpus validation, training and axis queries.
#[derive(Debug, Error)]
pub enum AxisError {
    /// No payload or file was supplied.
    #[error("No file supplied. Upload a text file with one document per line.")]
    MissingInput,

    /// The payload is not valid UTF-8 text.
    #[error("Error reading file: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// Nothing survived normalization.
    #[error("No valid text found after preprocessing. Please check your input.")]
    EmptyCorpus,

    /// Fewer documents than the minimum viable corpus.
    #[error(
        "Please provide at least {required} documents (lines) for meaningful analysis \
         (found {actual})."
    )]
    InsufficientData {
        /// Minimum number of documents
        required: usize,
        /// Documents left after normalization
        actual: usize,
    },

    /// A query was issued before any successful training.
    #[error("Model not trained yet")]
    ModelNotTrained,

    /// Axis index outside `[0, axis_count)`.
    #[error("Axis {axis} is out of range (model has {axis_count} axes)")]
    InvalidAxis {
        /// The requested index as received
        axis: i64,
        /// Number of axes in the current model
        axis_count: usize,
    },

    /// The decomposition engine failed or produced an unusable result.
    #[error("Training failed: {0}")]
    TrainingFailure(String),
}

impl AxisError {
    /// Create an InsufficientData error.
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Create an InvalidAxis error.
    pub fn invalid_axis(axis: i64, axis_count: usize) -> Self {
        Self::InvalidAxis { axis, axis_count }
    }

    /// Wrap an engine error, keeping its full context chain in the message.
    pub fn training_failure(err: &anyhow::Error) -> Self {
        Self::TrainingFailure(format!("{err:#}"))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::Decode(_) => "decode_error",
            Self::EmptyCorpus => "empty_corpus",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::ModelNotTrained => "model_not_trained",
            Self::InvalidAxis { .. } => "invalid_axis",
            Self::TrainingFailure(_) => "training_failure",
        }
    }

    /// True for errors caused by the caller's input rather than the engine.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::TrainingFailure(_))
    }
}
