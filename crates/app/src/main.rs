use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use voicemark_audio::{fetch_clip, Normalizer, NormalizerConfig, VoiceClip};
use voicemark_foundation::{PipelineConfig, PipelineError};
use voicemark_stt::scoring::dice_score;
use voicemark_stt::{
    Aggregator, BackendRegistry, ExpectedCommand, Pipeline, RecognitionConfig,
};
use voicemark_stt_gcloud::GcloudBackendFactory;
use voicemark_stt_vosk::VoskBackendFactory;
use voicemark_stt_whisper::WhisperBackendFactory;

#[derive(Parser)]
#[command(name = "voicemark", about = "Voice-command recognition pipeline", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = "voicemark.toml", env = "VOICEMARK_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline on one clip and print the winner.
    Recognize {
        /// Local file path or HTTPS URL of the compressed clip.
        #[arg(long)]
        input: String,
        /// Expected command tag, e.g. "cut_advance".
        #[arg(long)]
        tag: String,
        /// Expected command description the recording should match.
        #[arg(long)]
        description: String,
    },
    /// Score a transcript against an expected description.
    Score {
        #[arg(long)]
        recognized: String,
        #[arg(long)]
        expected: String,
    },
    /// List registered backends and their availability.
    Backends,
}

fn init_logging() -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "voicemark.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

fn build_registry(config: &PipelineConfig) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(Box::new(WhisperBackendFactory::new()));
    registry.register(Box::new(VoskBackendFactory::new()));
    registry.register(Box::new(GcloudBackendFactory::new(
        config.gcloud.api_key_env.clone(),
    )));
    registry
}

fn recognition_config(config: &PipelineConfig, backend_id: &str) -> RecognitionConfig {
    let model_path = match backend_id {
        "vosk" => config.vosk.model_path.clone().unwrap_or_default(),
        "whisper" => config.whisper.model_path.clone().unwrap_or_default(),
        _ => String::new(),
    };
    RecognitionConfig {
        language: config.language.clone(),
        model_path,
        sample_rate_hz: config.sample_rate_hz,
        beam_size: config.whisper.beam_size,
    }
}

async fn build_pipeline(config: &PipelineConfig) -> anyhow::Result<Pipeline> {
    let registry = build_registry(config);
    let backends = registry
        .resolve(&config.backends, |id| recognition_config(config, id))
        .await;

    if backends.is_empty() {
        bail!(
            "none of the configured backends ({}) could be initialized",
            config.backends.join(", ")
        );
    }

    let normalizer = Normalizer::new(NormalizerConfig {
        sample_rate_hz: config.sample_rate_hz,
        ..Default::default()
    });
    let aggregator = Aggregator::new(backends, Duration::from_millis(config.backend_timeout_ms));
    Ok(Pipeline::new(normalizer, aggregator))
}

async fn load_clip(input: &str) -> anyhow::Result<VoiceClip> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let client = reqwest::Client::new();
        Ok(fetch_clip(&client, input).await?)
    } else {
        let path = PathBuf::from(input);
        if !path.exists() {
            bail!("input file '{input}' does not exist");
        }
        Ok(VoiceClip::from_path(path))
    }
}

async fn recognize(
    config: &PipelineConfig,
    input: &str,
    tag: &str,
    description: &str,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let clip = load_clip(input).await?;
    let expected = ExpectedCommand::new(tag, description);

    match pipeline.run(&clip, &expected).await {
        Ok(recognition) => {
            println!(
                "winner: {} (score {})",
                recognition.winner.backend, recognition.winner.score
            );
            println!("transcript: {}", recognition.winner.text);
            println!();
            for result in &recognition.results {
                match (&result.text, &result.error) {
                    (Some(text), _) => println!("  {:<10} ok    {text}", result.backend),
                    (None, Some(error)) => println!("  {:<10} fail  {error}", result.backend),
                    (None, None) => println!("  {:<10} fail", result.backend),
                }
            }
            Ok(())
        }
        Err(PipelineError::NoTranscript { attempted }) => {
            bail!("no transcript available ({attempted} backend(s) tried); please re-record")
        }
        Err(e) => Err(e).context("recognition failed"),
    }
}

fn list_backends(config: &PipelineConfig) {
    let registry = build_registry(config);
    println!("{:<10} {:<24} {:<9} {}", "id", "name", "local", "status");
    for (info, available) in registry.registered() {
        let status = if available { "available" } else { "unavailable" };
        let local = if info.is_local { "local" } else { "cloud" };
        println!("{:<10} {:<24} {:<9} {status}", info.id, info.name, local);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = PipelineConfig::load(&cli.config)?;
    tracing::info!(
        backends = ?config.backends,
        language = %config.language,
        "voicemark starting"
    );

    match cli.command {
        Command::Recognize {
            input,
            tag,
            description,
        } => recognize(&config, &input, &tag, &description).await,
        Command::Score {
            recognized,
            expected,
        } => {
            println!("{}", dice_score(&recognized, &expected));
            Ok(())
        }
        Command::Backends => {
            list_backends(&config);
            Ok(())
        }
    }
}
