// Local sentence encoder for the signal separation engine.
//
// all-MiniLM-L6-v2 exported to ONNX. Documents and single vocabulary terms
// go through the same encoder so both land in one 384-dim space. Token
// vectors are averaged over real (unpadded) positions.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};
use tracing::debug;

use super::download::{missing_files, ONNX_FILE, TOKENIZER_FILE};

pub const EMBEDDING_DIM: usize = 384;

/// Texts per inference call; vocabularies are embedded term by term.
const EMBED_BATCH_SIZE: usize = 128;

struct Encoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

/// Cheap to clone; clones share the loaded model.
#[derive(Clone)]
pub struct SentenceEmbedder {
    inner: Arc<Encoder>,
}

impl SentenceEmbedder {
    /// Load from a directory holding `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let missing = missing_files(model_dir);
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            anyhow::bail!(
                "Sentence model incomplete, missing {}. Run `semaxis download-model` first.",
                names.join(", ")
            );
        }

        let onnx = model_dir.join(ONNX_FILE);
        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&onnx)
            .with_context(|| format!("Failed to load {}", onnx.display()))?;
        let tokenizer = Tokenizer::from_file(model_dir.join(TOKENIZER_FILE))
            .map_err(|e| anyhow::anyhow!("Failed to load {TOKENIZER_FILE}: {e}"))?;

        debug!(dir = %model_dir.display(), "Sentence model loaded");

        Ok(Self {
            inner: Arc::new(Encoder {
                session: Mutex::new(session),
                tokenizer,
            }),
        })
    }

    /// One embedding per text, same order. Inference runs on a blocking thread.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            texts
                .chunks(EMBED_BATCH_SIZE)
                .map(|chunk| encoder.encode_chunk(chunk))
                .collect::<Result<Vec<_>>>()
                .map(|parts| parts.into_iter().flatten().collect())
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

impl Encoder {
    fn encode_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        let encodings = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenizing {t:?} failed: {e}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = PaddedBatch::new(&encodings);
        if batch.width == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch.rows]);
        }

        let shape = [batch.rows as i64, batch.width as i64];
        let ids = Tensor::from_array((shape, batch.ids.clone())).context("input_ids tensor")?;
        let mask =
            Tensor::from_array((shape, batch.mask.clone())).context("attention_mask tensor")?;
        let types = Tensor::from_array((shape, vec![0i64; batch.ids.len()]))
            .context("token_type_ids tensor")?;

        let hidden = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("ONNX session lock poisoned: {e}"))?;
            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => ids,
                    "attention_mask" => mask,
                    "token_type_ids" => types
                })
                .context("Sentence model inference failed")?;
            let (_, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Unexpected sentence model output")?;
            data.to_vec()
        };

        let expected = batch.rows * batch.width * EMBEDDING_DIM;
        if hidden.len() != expected {
            anyhow::bail!(
                "Sentence model returned {} values, expected {expected} ({} x {} x {EMBEDDING_DIM})",
                hidden.len(),
                batch.rows,
                batch.width
            );
        }
        Ok(batch.mean_pool(&hidden))
    }
}

/// Token ids and attention mask right-padded to the longest encoding.
#[derive(Debug)]
struct PaddedBatch {
    rows: usize,
    width: usize,
    ids: Vec<i64>,
    mask: Vec<i64>,
}

impl PaddedBatch {
    fn new(encodings: &[Encoding]) -> Self {
        Self::from_parts(encodings.iter().map(|e| (e.get_ids(), e.get_attention_mask())))
    }

    fn from_parts<'a>(parts: impl Iterator<Item = (&'a [u32], &'a [u32])> + Clone) -> Self {
        let rows = parts.clone().count();
        let width = parts.clone().map(|(ids, _)| ids.len()).max().unwrap_or(0);
        let mut ids = vec![0i64; rows * width];
        let mut mask = vec![0i64; rows * width];
        for (row, (row_ids, row_mask)) in parts.enumerate() {
            let start = row * width;
            for (slot, &id) in ids[start..].iter_mut().zip(row_ids) {
                *slot = i64::from(id);
            }
            for (slot, &m) in mask[start..].iter_mut().zip(row_mask) {
                *slot = i64::from(m);
            }
        }
        Self {
            rows,
            width,
            ids,
            mask,
        }
    }

    /// Mask-weighted average of `hidden` ([rows, width, EMBEDDING_DIM]) per row.
    fn mean_pool(&self, hidden: &[f32]) -> Vec<Vec<f64>> {
        hidden
            .chunks(self.width * EMBEDDING_DIM)
            .zip(self.mask.chunks(self.width))
            .map(|(tokens, mask)| {
                let mut pooled = vec![0.0_f64; EMBEDDING_DIM];
                let mut weight = 0.0;
                for (token, &m) in tokens.chunks(EMBEDDING_DIM).zip(mask) {
                    if m == 0 {
                        continue;
                    }
                    weight += m as f64;
                    for (acc, &x) in pooled.iter_mut().zip(token) {
                        *acc += f64::from(x) * m as f64;
                    }
                }
                if weight > 0.0 {
                    pooled.iter_mut().for_each(|x| *x /= weight);
                }
                pooled
            })
            .collect()
    }
}

/// Column mean of equal-length vectors; empty input gives an empty vector.
pub fn mean_embedding(embeddings: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = embeddings.first() else {
        return Vec::new();
    };
    let mut mean = vec![0.0; first.len()];
    for row in embeddings {
        for (acc, x) in mean.iter_mut().zip(row) {
            *acc += x;
        }
    }
    let n = embeddings.len() as f64;
    mean.iter_mut().for_each(|x| *x /= n);
    mean
}
