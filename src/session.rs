// Session — holds the most recently trained model.
//
// Training is serialized through a mutex and the finished model is swapped
// in with a single write, so readers see either the previous model or the
// new one, never a partial result. A failed training run leaves the previous
// model in place. Nothing is persisted; a restart starts untrained.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::axes::{
    reduce_for_plot, resolve_axis, summarize_axes, AxisSummary, PlotData, MAX_PLOT_TERMS,
    TOP_TERMS,
};
use crate::corpus::Corpus;
use crate::decomposition::{Decomposition, DecompositionEngine, DecompositionParams};
use crate::error::AxisError;

/// The immutable output of one successful training run.
#[derive(Debug)]
pub struct TrainedModel {
    corpus: Corpus,
    decomposition: Decomposition,
    engine: String,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    /// Name of the engine that produced this model.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

/// Response body of a successful training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub message: String,
    pub n_documents: usize,
    pub vocabulary_size: usize,
    pub topics: Vec<AxisSummary>,
}

/// Snapshot of what the session currently holds.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub trained: bool,
    pub engine: Option<String>,
    pub trained_at: Option<String>,
    pub n_documents: Option<usize>,
    pub vocabulary_size: Option<usize>,
    pub axis_count: Option<usize>,
}

/// Holder of at most one trained model.
pub struct Session {
    current: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
    params: DecompositionParams,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DecompositionParams::default())
    }
}

impl Session {
    pub fn new(params: DecompositionParams) -> Self {
        Self {
            current: RwLock::new(None),
            training: Mutex::new(()),
            params,
        }
    }

    pub fn params(&self) -> &DecompositionParams {
        &self.params
    }

    /// Validate an uploaded payload and train on it.
    pub async fn train(
        &self,
        engine: &dyn DecompositionEngine,
        payload: &[u8],
    ) -> Result<TrainReport, AxisError> {
        let corpus = Corpus::from_bytes(payload)?;
        self.train_corpus(engine, corpus).await
    }

    /// Train on an already validated corpus and make the result current.
    pub async fn train_corpus(
        &self,
        engine: &dyn DecompositionEngine,
        corpus: Corpus,
    ) -> Result<TrainReport, AxisError> {
        let _guard = self.training.lock().await;

        info!(
            documents = corpus.len(),
            engine = engine.name(),
            axes = self.params.n_axes,
            "Training started"
        );

        let decomposition = engine
            .decompose(&corpus, &self.params)
            .await
            .map_err(|e| {
                error!(error = %e, engine = engine.name(), "Decomposition failed");
                AxisError::training_failure(&e)
            })?;

        if decomposition.axis_count() != self.params.n_axes {
            error!(
                expected = self.params.n_axes,
                actual = decomposition.axis_count(),
                "Engine returned the wrong number of axes"
            );
            return Err(AxisError::TrainingFailure(format!(
                "Engine returned {} axes, expected {}",
                decomposition.axis_count(),
                self.params.n_axes
            )));
        }

        let topics = summarize_axes(&decomposition, TOP_TERMS);
        let model = Arc::new(TrainedModel {
            corpus,
            decomposition,
            engine: engine.name().to_string(),
            trained_at: Utc::now(),
        });

        let report = TrainReport {
            message: "Model trained successfully".to_string(),
            n_documents: model.corpus.len(),
            vocabulary_size: model.decomposition.vocabulary().len(),
            topics,
        };

        *self.current.write().await = Some(Arc::clone(&model));

        info!(
            documents = report.n_documents,
            terms = report.vocabulary_size,
            "Model trained successfully"
        );

        Ok(report)
    }

    /// The current model, or `ModelNotTrained` before the first training.
    pub async fn current(&self) -> Result<Arc<TrainedModel>, AxisError> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(AxisError::ModelNotTrained)
    }

    /// Scatter dataset for two axes of the current model.
    pub async fn visualize(&self, axis_x: i64, axis_y: i64) -> Result<PlotData, AxisError> {
        self.visualize_limited(axis_x, axis_y, MAX_PLOT_TERMS).await
    }

    /// Like `visualize`, with a caller-chosen term limit.
    pub async fn visualize_limited(
        &self,
        axis_x: i64,
        axis_y: i64,
        limit: usize,
    ) -> Result<PlotData, AxisError> {
        let model = self.current().await?;
        let decomposition = model.decomposition();
        let x = resolve_axis(axis_x, decomposition.axis_count())?;
        let y = resolve_axis(axis_y, decomposition.axis_count())?;
        reduce_for_plot(decomposition, x, y, limit)
    }

    pub async fn status(&self) -> SessionStatus {
        match self.current().await {
            Ok(model) => SessionStatus {
                trained: true,
                engine: Some(model.engine().to_string()),
                trained_at: Some(model.trained_at().to_rfc3339()),
                n_documents: Some(model.corpus().len()),
                vocabulary_size: Some(model.decomposition().vocabulary().len()),
                axis_count: Some(model.decomposition().axis_count()),
            },
            Err(_) => SessionStatus {
                trained: false,
                engine: None,
                trained_at: None,
                n_documents: None,
                vocabulary_size: None,
                axis_count: None,
            },
        }
    }
}
