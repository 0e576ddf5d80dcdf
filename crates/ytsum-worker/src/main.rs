//! ytsum binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytsum_llm::{EnvCredentials, ProviderCombination, ProviderRegistry, ProviderSettings};
use ytsum_media::TracingProgress;
use ytsum_worker::{Pipeline, PipelineConfig};

/// Download, transcribe and summarize a YouTube video
#[derive(Parser, Debug)]
#[command(name = "ytsum")]
#[command(version)]
struct Args {
    /// Video URL or bare video ID
    #[arg(env = "YTSUM_DEFAULT_REFERENCE")]
    reference: Option<String>,

    /// Video URL, takes precedence over the positional argument
    #[arg(long)]
    url: Option<String>,

    /// Provider combinations, e.g. `openai,anthropic:keypoints`
    #[arg(short, long, default_value = "openai", env = "YTSUM_PROVIDERS")]
    providers: String,

    /// Output directory for transcripts and summaries
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl Args {
    /// `--url` wins over the positional reference and its env default.
    fn video_reference(&self) -> Option<&str> {
        self.url.as_deref().or(self.reference.as_deref())
    }
}

fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("ytsum=info".parse()?)
        .add_directive("ytsum_worker=info".parse()?)
        .add_directive("ytsum_media=info".parse()?)
        .add_directive("ytsum_llm=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // reqwest's rustls needs a process-wide crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    init_tracing()?;
    let args = Args::parse();

    let reference = match args.video_reference() {
        Some(reference) => reference.to_string(),
        None => bail!("no video reference given (pass a URL or set YTSUM_DEFAULT_REFERENCE)"),
    };

    let combinations = ProviderCombination::parse_list(&args.providers)
        .with_context(|| format!("invalid provider list {:?}", args.providers))?;
    if combinations.is_empty() {
        bail!("no summarization providers selected");
    }

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    info!(?config, "Starting ytsum");

    let pipeline = Pipeline::from_config(&config);
    let mut registry =
        ProviderRegistry::with_defaults(ProviderSettings::from_env(), Arc::new(EnvCredentials));

    println!("{reference}");
    let outcomes = pipeline
        .run_batch(&reference, &combinations, &mut registry, Arc::new(TracingProgress))
        .await;

    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                println!(
                    "\nProcessing completed in {}s",
                    report.elapsed.as_secs_f64().round()
                );
                println!("\nSummary ({}):", report.provider);
                println!("{}", report.summary);
                println!("\nSaved to {}", report.summary_path.display());
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error ({}, {}): {}", outcome.combination, e.stage(), e);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} runs failed", outcomes.len());
    }
    Ok(())
}
