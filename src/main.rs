use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use speech_relay::synthesis::{
    AudioFormat, SilentSynthesizer, SpeechSynthesizer, SynthesisWorkerPool,
};
use speech_relay::timeline::{run_batch, write_wav, DubSegment};
use speech_relay::{create_router, AppState, Config, NatsClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "speech-relay", version, about = "Ordered speech synthesis relay")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/speech-relay")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API and NATS pipeline
    Serve,

    /// Synthesize a segment manifest into one dubbed track
    Dub {
        /// JSON array of segments ({"text", "start", "duration", "original"})
        #[arg(long)]
        manifest: PathBuf,

        /// Output WAV file
        #[arg(long)]
        out: PathBuf,

        /// Output SRT file
        #[arg(long)]
        srt: Option<PathBuf>,

        /// Synthesize silence instead of calling the synthesis service
        #[arg(long)]
        dry_run: bool,

        /// Concurrent synthesis calls
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Pad the track to at least this many seconds
        #[arg(long, default_value_t = 0.0)]
        min_total_secs: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Speech Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Dub {
            manifest,
            out,
            srt,
            dry_run,
            workers,
            min_total_secs,
        } => dub(cfg, manifest, out, srt, dry_run, workers, min_total_secs).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let nats = match NatsClient::connect(cfg.nats.clone()).await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("NATS unavailable ({:#}), sessions will synthesize silence", e);
            None
        }
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let app = create_router(AppState::new(cfg, nats));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn dub(
    cfg: Config,
    manifest: PathBuf,
    out: PathBuf,
    srt: Option<PathBuf>,
    dry_run: bool,
    workers: usize,
    min_total_secs: f64,
) -> Result<()> {
    let raw = std::fs::read(&manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let segments: Vec<DubSegment> =
        serde_json::from_slice(&raw).context("Manifest is not a segment list")?;

    let format = AudioFormat {
        sample_rate: cfg.timeline.sample_rate,
        ..AudioFormat::default()
    };

    let mut timeout = None;
    let synthesizer: Arc<dyn SpeechSynthesizer> = if dry_run {
        Arc::new(SilentSynthesizer::new(format))
    } else {
        timeout = Some(Duration::from_millis(cfg.nats.request_timeout_ms));
        let client = NatsClient::connect(cfg.nats.clone()).await?;
        Arc::new(client.synthesizer())
    };

    let mut pool = SynthesisWorkerPool::new(synthesizer, workers);
    if let Some(timeout) = timeout {
        pool = pool.with_timeout(timeout);
    }

    let output = run_batch(segments, &pool, &cfg.voice, &cfg.timeline, min_total_secs).await;

    write_wav(&out, &output.samples, cfg.timeline.sample_rate)?;
    info!("Wrote {}", out.display());

    if let Some(path) = srt {
        std::fs::write(&path, &output.srt)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    if output.failed > 0 {
        warn!("{} segments could not be synthesized", output.failed);
    }

    Ok(())
}
