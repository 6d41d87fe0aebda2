// Session tests — train/visualize lifecycle against stub and real engines.
//
// Stub engines return fixed matrices so the session's own rules can be
// checked in isolation: atomic replacement, failure leaves the previous
// model, queries before training fail. The LSA engine is exercised end to
// end on a small corpus.

use anyhow::Result;
use async_trait::async_trait;

use semaxis::axes::TOP_TERMS;
use semaxis::corpus::Corpus;
use semaxis::decomposition::vocabulary::build_vocabulary;
use semaxis::decomposition::{
    Decomposition, DecompositionEngine, DecompositionParams, LatentSemanticEngine, N_AXES,
};
use semaxis::error::AxisError;
use semaxis::session::Session;

/// Deterministic weights over the corpus vocabulary.
struct StubEngine;

#[async_trait]
impl DecompositionEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn decompose(
        &self,
        corpus: &Corpus,
        params: &DecompositionParams,
    ) -> Result<Decomposition> {
        let vocabulary = build_vocabulary(corpus.documents());
        let weights = (0..params.n_axes)
            .map(|a| {
                (0..vocabulary.len())
                    .map(|t| (((a + 1) * (t + 3)) % 11) as f64 - 5.0)
                    .collect()
            })
            .collect();
        Decomposition::new(vocabulary, weights)
    }
}

struct FailingEngine;

#[async_trait]
impl DecompositionEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    async fn decompose(&self, _: &Corpus, _: &DecompositionParams) -> Result<Decomposition> {
        anyhow::bail!("solver did not converge")
    }
}

/// Returns fewer axes than requested.
struct ShortEngine;

#[async_trait]
impl DecompositionEngine for ShortEngine {
    fn name(&self) -> &str {
        "short"
    }

    async fn decompose(&self, corpus: &Corpus, _: &DecompositionParams) -> Result<Decomposition> {
        let vocabulary = build_vocabulary(corpus.documents());
        let weights = vec![vec![1.0; vocabulary.len()]; 3];
        Decomposition::new(vocabulary, weights)
    }
}

const SMALL_CORPUS: &str = "\
The cat sat on the mat and purred at the dog
Dogs and cats are common household pets
Stock markets fell sharply after the announcement
Investors worry about inflation and interest rates
The recipe calls for flour butter and sugar
Bake the bread at a high temperature for an hour
The team won the championship after extra time
Fans celebrated the victory in the streets
Rain is expected across the region tomorrow
A storm front brings wind and heavy rain
The new phone has a faster processor and better camera
Software updates improve battery life on older phones
";

fn seeded() -> DecompositionParams {
    DecompositionParams {
        seed: Some(7),
        ..DecompositionParams::default()
    }
}

fn other_corpus() -> Vec<u8> {
    (0..15)
        .map(|i| format!("alpha beta gamma delta line {i}\n"))
        .collect::<String>()
        .into_bytes()
}

// ============================================================
// Lifecycle
// ============================================================

#[tokio::test]
async fn visualize_before_training_fails() {
    let session = Session::default();
    assert!(matches!(
        session.visualize(0, 1).await,
        Err(AxisError::ModelNotTrained)
    ));
    assert!(!session.status().await.trained);
}

#[tokio::test]
async fn train_reports_counts_and_topics() {
    let session = Session::new(seeded());
    let report = session
        .train(&StubEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.message, "Model trained successfully");
    assert_eq!(report.n_documents, 12);
    assert_eq!(report.topics.len(), N_AXES);
    assert!(report.vocabulary_size > TOP_TERMS);
    for (i, topic) in report.topics.iter().enumerate() {
        assert_eq!(topic.id, i);
        assert_eq!(topic.name, format!("Axis {i}"));
        assert_eq!(topic.positive.len(), TOP_TERMS);
        assert_eq!(topic.negative.len(), TOP_TERMS);
    }

    let status = session.status().await;
    assert!(status.trained);
    assert_eq!(status.engine.as_deref(), Some("stub"));
    assert_eq!(status.n_documents, Some(12));
    assert_eq!(status.axis_count, Some(N_AXES));
    let trained_at = status.trained_at.expect("timestamp once trained");
    let trained_at = chrono::DateTime::parse_from_rfc3339(&trained_at).unwrap();
    assert!(trained_at <= chrono::Utc::now());
}

#[tokio::test]
async fn insufficient_corpus_leaves_session_untrained() {
    let session = Session::default();
    let five = "one two\nthree four\nfive six\nseven eight\nnine ten\n";
    assert!(matches!(
        session.train(&StubEngine, five.as_bytes()).await,
        Err(AxisError::InsufficientData { actual: 5, .. })
    ));
    assert!(matches!(
        session.current().await,
        Err(AxisError::ModelNotTrained)
    ));
}

#[tokio::test]
async fn invalid_utf8_is_a_decode_error() {
    let session = Session::default();
    let err = session
        .train(&StubEngine, &[0xff, 0xfe, b'a', b'\n'])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode_error");
}

#[tokio::test]
async fn failed_training_keeps_previous_model() {
    let session = Session::new(seeded());
    session
        .train(&StubEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();
    let before = session.current().await.unwrap();

    let err = session
        .train(&FailingEngine, &other_corpus())
        .await
        .unwrap_err();
    assert!(matches!(err, AxisError::TrainingFailure(_)));
    assert!(err.to_string().contains("solver did not converge"));

    let after = session.current().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(after.engine(), "stub");
}

#[tokio::test]
async fn wrong_axis_count_is_a_training_failure() {
    let session = Session::default();
    let err = session
        .train(&ShortEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, AxisError::TrainingFailure(_)));
    assert!(!session.status().await.trained);
}

#[tokio::test]
async fn retraining_replaces_the_model() {
    let session = Session::new(seeded());
    session
        .train(&StubEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();
    let report = session.train(&StubEngine, &other_corpus()).await.unwrap();

    assert_eq!(report.n_documents, 15);
    let model = session.current().await.unwrap();
    assert_eq!(model.corpus().len(), 15);
    assert!(model
        .decomposition()
        .vocabulary()
        .iter()
        .any(|t| t == "gamma"));
}

#[tokio::test]
async fn unicode_whitespace_keeps_words_apart() {
    let session = Session::new(seeded());
    let text = (0..12)
        .map(|i| format!("hello\u{a0}world tab\u{2003}separated line{i}\n"))
        .collect::<String>();
    session.train(&StubEngine, text.as_bytes()).await.unwrap();

    let model = session.current().await.unwrap();
    let vocabulary = model.decomposition().vocabulary();
    for term in ["hello", "world", "tab", "separated"] {
        assert!(vocabulary.iter().any(|t| t == term), "missing {term}");
    }
    assert!(!vocabulary.iter().any(|t| t == "helloworld"));
    assert!(!vocabulary.iter().any(|t| t == "tabseparated"));
}

// ============================================================
// Visualization through the session
// ============================================================

#[tokio::test]
async fn visualize_rejects_out_of_range_axes() {
    let session = Session::default();
    session
        .train(&StubEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();

    for (x, y) in [(-1, 0), (0, 20), (25, 1)] {
        assert!(matches!(
            session.visualize(x, y).await,
            Err(AxisError::InvalidAxis { .. })
        ));
    }
}

#[tokio::test]
async fn visualize_limited_caps_points() {
    let session = Session::default();
    session
        .train(&StubEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();
    let plot = session.visualize_limited(0, 1, 5).await.unwrap();
    assert_eq!(plot.plot_data.len(), 5);
}

// ============================================================
// End to end with the latent semantic engine
// ============================================================

#[tokio::test]
async fn lsa_end_to_end_on_small_corpus() {
    let session = Session::new(seeded());
    let report = session
        .train(&LatentSemanticEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.n_documents, 12);
    assert_eq!(report.topics.len(), N_AXES);

    let model = session.current().await.unwrap();
    let vocabulary_size = model.decomposition().vocabulary().len();
    assert_eq!(report.vocabulary_size, vocabulary_size);

    let plot = session.visualize(0, 1).await.unwrap();
    assert_eq!(plot.plot_data.len(), vocabulary_size.min(200));
    assert!(plot.axis_x_label.contains(" vs. "));
    assert!(plot.axis_y_label.contains(" vs. "));

    // Axes past the corpus rank still answer queries.
    let tail = session.visualize(18, 19).await.unwrap();
    assert!(tail.axis_x_label.contains(" vs. "));
}

#[tokio::test]
async fn lsa_seeded_training_is_reproducible() {
    let a = Session::new(seeded());
    let b = Session::new(seeded());
    let ra = a
        .train(&LatentSemanticEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();
    let rb = b
        .train(&LatentSemanticEngine, SMALL_CORPUS.as_bytes())
        .await
        .unwrap();

    let names = |r: &semaxis::session::TrainReport| {
        r.topics
            .iter()
            .map(|t| (t.positive.clone(), t.negative.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&ra), names(&rb));
}
