// Model download for the signal separation engine.
//
// The sentence model lives under the platform data directory
// (~/.local/share/semaxis/models/all-MiniLM-L6-v2 on Linux). Each file is
// streamed to `<name>.part` and renamed into place once complete, so a
// present file is always a whole one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Directory name of the sentence model under the model root.
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Local file names the embedder loads.
pub const ONNX_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

const HF_BASE_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// One file of the model: where it lives upstream and what it is called here.
#[derive(Debug, Clone, Copy)]
pub struct ModelFile {
    pub remote: &'static str,
    pub local: &'static str,
    /// Rough size shown before large downloads; small files get no bar.
    pub size_hint: Option<&'static str>,
}

/// Everything the embedder needs, smallest first.
pub const MODEL_FILES: [ModelFile; 2] = [
    ModelFile {
        remote: "tokenizer.json",
        local: TOKENIZER_FILE,
        size_hint: None,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: ONNX_FILE,
        size_hint: Some("~90 MB"),
    },
];

pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("semaxis")
        .join("models")
}

/// Where the sentence model sits under a model root.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(MODEL_NAME)
}

/// Model files absent from `model_dir` (the sentence model's own directory).
pub fn missing_files(model_dir: &Path) -> Vec<PathBuf> {
    MODEL_FILES
        .iter()
        .map(|file| model_dir.join(file.local))
        .filter(|path| !path.exists())
        .collect()
}

pub fn embedding_files_present(base: &Path) -> bool {
    missing_files(&embedding_model_dir(base)).is_empty()
}

/// Fetch every model file not already on disk.
pub async fn download_model(base: &Path) -> Result<()> {
    let target = embedding_model_dir(base);
    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    println!("\nSentence embedding model ({MODEL_NAME}) -> {}", target.display());

    let client = reqwest::Client::new();
    for file in &MODEL_FILES {
        let dest = target.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Model file present, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }

        match file.size_hint {
            Some(size) => println!("  Downloading {} ({size})...", file.local),
            None => println!("  Downloading {}...", file.local),
        }
        let url = format!("{HF_BASE_URL}/{}", file.remote);
        fetch(&client, &url, &dest, file.size_hint.is_some()).await?;
    }

    Ok(())
}

/// Stream `url` into `dest` via a sibling `.part` file.
async fn fetch(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;
    if !response.status().is_success() {
        anyhow::bail!("{url} returned {}", response.status());
    }

    let bar = if show_progress {
        Some(progress_bar(response.content_length())?)
    } else {
        None
    };

    let partial = partial_path(dest);
    let mut out = tokio::fs::File::create(&partial)
        .await
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {url} interrupted"))?
    {
        out.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        written += chunk.len() as u64;
        if let Some(bar) = &bar {
            bar.set_position(written);
        }
    }
    out.flush().await?;
    drop(out);

    tokio::fs::rename(&partial, dest)
        .await
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    info!(url, bytes = written, dest = %dest.display(), "Downloaded model file");
    Ok(())
}

/// Byte bar when the size is known, a spinner otherwise.
fn progress_bar(content_length: Option<u64>) -> Result<ProgressBar> {
    let bar = match content_length {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::default_bar()
                .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .context("Invalid progress template")?
                .progress_chars("=> "),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .template("    {spinner} {bytes}")
                .context("Invalid progress template")?,
        ),
    };
    Ok(bar)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
