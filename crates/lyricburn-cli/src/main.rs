mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config::Environment;
use lyricburn_core::segment::Segment;
use lyricburn_core::style::{StyleDescriptor, StyleRequest};
use lyricburn_media::{BurnRequest, Orchestrator, OrchestratorConfig, Prober};
use lyricburn_store::Store;

const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_IOERR: u8 = 74;

#[derive(Parser)]
#[command(name = "lyricburn", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: store segments, probe, build, burn.
    Burn {
        #[arg(long)]
        video: String,
        #[arg(long)]
        owner_key: String,
        #[arg(long)]
        segments: PathBuf,
        #[arg(long)]
        style: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Direct segment store access.
    Segments {
        #[command(subcommand)]
        action: SegmentsAction,
    },
    /// Render only the ASS document, to stdout.
    BuildAss {
        #[arg(long)]
        segments: PathBuf,
        #[arg(long)]
        style: Option<PathBuf>,
        #[arg(long, value_parser = parse_resolution)]
        play_res: (u32, u32),
    },
}

#[derive(Subcommand)]
enum SegmentsAction {
    List {
        #[arg(long)]
        video: String,
        #[arg(long)]
        owner_key: String,
    },
    Replace {
        #[arg(long)]
        video: String,
        #[arg(long)]
        owner_key: String,
        #[arg(long)]
        segments: PathBuf,
    },
}

fn parse_resolution(raw: &str) -> Result<(u32, u32), String> {
    let (w, h) = raw
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got {raw:?}"))?;
    let width = w.parse().map_err(|_| format!("bad width in {raw:?}"))?;
    let height = h.parse().map_err(|_| format!("bad height in {raw:?}"))?;
    Ok((width, height))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(error) => {
            tracing::error!(%error, "failed to start async runtime");
            return ExitCode::from(EX_IOERR);
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(message)) => {
            eprintln!("usage error: {message}");
            ExitCode::from(EX_USAGE)
        }
        Err(CliError::Data(message)) => {
            eprintln!("data error: {message}");
            ExitCode::from(EX_DATAERR)
        }
        Err(CliError::Io(message)) => {
            eprintln!("io error: {message}");
            ExitCode::from(EX_IOERR)
        }
    }
}

enum CliError {
    Usage(String),
    Data(String),
    Io(String),
}

impl From<lyricburn_core::Error> for CliError {
    fn from(error: lyricburn_core::Error) -> Self {
        use lyricburn_core::Error as E;
        match error {
            E::InvalidInput { .. } | E::InvalidColor(_) => Self::Data(error.to_string()),
            E::Unauthorized | E::Forbidden | E::NotFound(_) | E::Conflict(_) => {
                Self::Data(error.to_string())
            }
            E::RenderFailed { stderr_tail } => Self::Io(format!("encoder failed: {stderr_tail}")),
            E::Timeout | E::Cancelled => Self::Io(error.to_string()),
            E::Io(inner) => Self::Io(inner.to_string()),
            E::Db(inner) => Self::Io(format!("database error: {inner}")),
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    let env = Environment::from_env().map_err(|e| CliError::Io(e.to_string()))?;

    match command {
        Command::Burn {
            video,
            owner_key,
            segments,
            style,
            out,
        } => run_burn(&env, &video, &owner_key, &segments, style.as_deref(), &out).await,
        Command::Segments { action } => run_segments(&env, action).await,
        Command::BuildAss {
            segments,
            style,
            play_res,
        } => run_build_ass(&segments, style.as_deref(), play_res),
    }
}

async fn run_burn(
    env: &Environment,
    video: &str,
    owner_key: &str,
    segments_path: &std::path::Path,
    style_path: Option<&std::path::Path>,
    out_path: &std::path::Path,
) -> Result<(), CliError> {
    let segments = load_segments(segments_path)?;
    let style = load_style(style_path)?;

    let store = Store::open(&PathBuf::from(&env.database_url))
        .map_err(CliError::from)?;
    store.replace(video, owner_key, segments.clone()).await?;

    let source_path = env.data_root.join("videos").join(video).join("source.mp4");
    let prober = Prober::new(env.probe_bin.clone());
    let orchestrator = Orchestrator::new(
        OrchestratorConfig {
            encoder_bin: env.encoder_bin.clone(),
            fonts_dir: env.fonts_dir.clone(),
            concurrency: env.burn_concurrency,
            timeout: env.burn_timeout,
        },
        prober,
    );

    let stored_segments = store.list(video, owner_key).await?;
    let bytes = orchestrator
        .burn(BurnRequest {
            source_path: &source_path,
            segments: &stored_segments,
            style: &style,
        })
        .await?;

    std::fs::write(out_path, bytes).map_err(|e| CliError::Io(e.to_string()))?;
    Ok(())
}

async fn run_segments(env: &Environment, action: SegmentsAction) -> Result<(), CliError> {
    let store = Store::open(&PathBuf::from(&env.database_url)).map_err(CliError::from)?;
    match action {
        SegmentsAction::List { video, owner_key } => {
            let segments = store.list(&video, &owner_key).await?;
            let json = serde_json::to_string_pretty(&segments)
                .map_err(|e| CliError::Io(e.to_string()))?;
            println!("{json}");
        }
        SegmentsAction::Replace {
            video,
            owner_key,
            segments,
        } => {
            let segments = load_segments(&segments)?;
            store.replace(&video, &owner_key, segments).await?;
        }
    }
    Ok(())
}

fn run_build_ass(
    segments_path: &std::path::Path,
    style_path: Option<&std::path::Path>,
    play_res: (u32, u32),
) -> Result<(), CliError> {
    let segments = load_segments(segments_path)?;
    let style = load_style(style_path)?;
    let doc = lyricburn_core::builder::build_document(&segments, &style, play_res.0, play_res.1)
        .map_err(CliError::from)?;
    print!("{doc}");
    Ok(())
}

fn load_segments(path: &std::path::Path) -> Result<Vec<Segment>, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CliError::Io(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| CliError::Usage(format!("invalid segments JSON: {e}")))
}

fn load_style(path: Option<&std::path::Path>) -> Result<StyleDescriptor, CliError> {
    let request = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| CliError::Io(e.to_string()))?;
            serde_json::from_str(&raw)
                .map_err(|e| CliError::Usage(format!("invalid style JSON: {e}")))?
        }
        None => StyleRequest::default(),
    };
    StyleDescriptor::resolve(&request).map_err(CliError::from)
}
