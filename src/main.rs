use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use semaxis::config::Config;
use semaxis::decomposition::build_engine;
use semaxis::session::{Session, TrainReport};

/// Semaxis: discover the semantic axes of a text corpus.
///
/// Upload one document per line; get back twenty axes, each labelled by the
/// terms at its two extremes, and a 2-D scatter of the vocabulary along any
/// pair of them.
#[derive(Parser)]
#[command(name = "semaxis", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (overrides SEMAXIS_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Interface to bind (overrides SEMAXIS_BIND)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Train on a corpus file and print every axis
    Analyze {
        /// UTF-8 text file, one document per line
        file: PathBuf,
    },

    /// Train on a corpus file and plot two axes against each other
    Plot {
        /// UTF-8 text file, one document per line
        file: PathBuf,

        /// Axis for the horizontal coordinate
        #[arg(long, default_value = "0")]
        x: i64,

        /// Axis for the vertical coordinate
        #[arg(long, default_value = "1")]
        y: i64,

        /// Number of terms to plot (default: 200)
        #[arg(long, default_value = "200")]
        limit: usize,

        /// Number of terms listed under the plot (default: 15)
        #[arg(long, default_value = "15")]
        rows: usize,
    },

    /// Download the sentence embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("semaxis=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let mut config = Config::load()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let engine = build_engine(&config)?;
            semaxis::web::run_server(config, engine).await?;
        }

        Commands::Analyze { file } => {
            let config = Config::load()?;
            let (_, report) = train_from_file(&config, &file).await?;
            semaxis::output::terminal::display_training_report(&report);
        }

        Commands::Plot {
            file,
            x,
            y,
            limit,
            rows,
        } => {
            let config = Config::load()?;
            let (session, _) = train_from_file(&config, &file).await?;
            let plot = session.visualize_limited(x, y, limit).await?;
            semaxis::output::terminal::display_plot(&plot, rows);
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading sentence embedding model...");
            println!("  Destination: {}", model_dir.display());

            semaxis::decomposition::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("Training now uses the embedding engine unless SEMAXIS_ENGINE=lsa.");
        }
    }

    Ok(())
}

/// Read a corpus file and train a fresh session on it.
async fn train_from_file(config: &Config, file: &Path) -> Result<(Session, TrainReport)> {
    let payload =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let engine = build_engine(config)?;
    let session = Session::new(config.decomposition_params());

    println!("Training on {}...", file.display());
    let report = session.train(engine.as_ref(), &payload).await?;
    info!(
        documents = report.n_documents,
        terms = report.vocabulary_size,
        engine = engine.name(),
        "Corpus analyzed"
    );

    Ok((session, report))
}
