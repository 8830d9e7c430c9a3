//! CLI binary for po-extract.
//!
//! `serve` runs the web form; `extract` runs one extraction from the
//! terminal and prints (or writes) the JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use po_extract::{
    extract_document, serve, to_pretty_json, write_json_file, Document, ExtractionConfig,
    ExtractionMode, ServerConfig,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Web form on http://127.0.0.1:8501/
  po-extract serve

  # Listen on all interfaces
  po-extract serve --bind 0.0.0.0:8080

  # One-off extraction to stdout
  ANTHROPIC_API_KEY=sk-ant-... po-extract extract po.pdf

  # All fields, written to a file
  po-extract extract po.pdf --mode advanced -o purchase_order_data.json

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY         API key for `extract` (the web form asks for it)
  PO_EXTRACT_BIND           Listen address for `serve`
  PO_EXTRACT_MODEL          Model ID
  PO_EXTRACT_MAX_PAGES      Pages rendered per document
  PO_EXTRACT_API_BASE_URL   Messages API base URL
  PDFIUM_LIB_PATH           Path to libpdfium
  RUST_LOG                  Log filter (overrides --verbose / --quiet)
"#;

/// Extract structured purchase-order data from PDFs with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "po-extract",
    version,
    about = "Extract structured purchase-order data from PDFs with a vision model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PO_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PO_EXTRACT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web form.
    Serve(ServeArgs),
    /// Extract one PDF from the command line.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "PO_EXTRACT_BIND", default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "PO_EXTRACT_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Drop sessions idle for this many seconds.
    #[arg(long, env = "PO_EXTRACT_SESSION_TTL_SECS", default_value_t = 3600)]
    session_ttl_secs: u64,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Purchase-order PDF.
    input: PathBuf,

    /// Extraction mode.
    #[arg(long, env = "PO_EXTRACT_MODE", value_enum, default_value = "basic")]
    mode: ModeArg,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PO_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Disable the spinner.
    #[arg(long, env = "PO_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    model: ModelArgs,
}

/// Settings shared by both subcommands.
#[derive(Args, Debug)]
struct ModelArgs {
    /// Model ID.
    #[arg(long, env = "PO_EXTRACT_MODEL")]
    model: Option<String>,

    /// Pages rendered per document.
    #[arg(long, env = "PO_EXTRACT_MAX_PAGES", default_value_t = 10)]
    max_pages: usize,

    /// Render zoom factor.
    #[arg(long, env = "PO_EXTRACT_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// Max output tokens.
    #[arg(long, env = "PO_EXTRACT_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: u32,

    /// Sampling temperature (0.0–1.0).
    #[arg(long, env = "PO_EXTRACT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Messages API base URL.
    #[arg(long, env = "PO_EXTRACT_API_BASE_URL")]
    api_base_url: Option<String>,

    /// API call timeout in seconds.
    #[arg(long, env = "PO_EXTRACT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PO_EXTRACT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Basic,
    Advanced,
}

impl From<ModeArg> for ExtractionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Basic => ExtractionMode::Basic,
            ModeArg::Advanced => ExtractionMode::Advanced,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback for `extract`; keep INFO logs for `serve`.
    let is_serve = matches!(cli.command, Command::Serve(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || !is_serve {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Extract(args) => run_extract(args, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args.model).await?;
    let server = ServerConfig {
        bind: args.bind,
        max_upload_bytes: args.max_upload_bytes,
        session_ttl: Duration::from_secs(args.session_ttl_secs),
    };
    serve(server, config).await.context("Web server failed")
}

async fn run_extract(args: ExtractArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args.model).await?;
    let document = Document::from_path(&args.input, ServerConfig::default().max_upload_bytes)
        .with_context(|| format!("Cannot use {}", args.input.display()))?;
    let api_key = args.api_key.as_deref().unwrap_or_default();
    let mode = ExtractionMode::from(args.mode);

    let spinner = (!quiet && !args.no_progress).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Extracting data from the purchase order...");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let start = Instant::now();
    let result = extract_document(&document, api_key, mode, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let data = result.context("Extraction failed")?;

    if let Some(ref path) = args.output {
        write_json_file(&data, path)
            .await
            .context("Failed to write output")?;
        if !quiet {
            eprintln!(
                "{}  {} fields  {}ms  →  {}",
                green("✔"),
                data.len(),
                start.elapsed().as_millis(),
                bold(&path.display().to_string()),
            );
        }
    } else {
        println!("{}", to_pretty_json(&data).context("Failed to serialise result")?);
        if !quiet {
            eprintln!(
                "{}",
                dim(&format!(
                    "{} ({} mode) in {}ms",
                    document.file_name(),
                    mode,
                    start.elapsed().as_millis()
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(args: &ModelArgs) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_pages(args.max_pages)
        .zoom(args.zoom)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = args.api_base_url {
        builder = builder.api_base_url(url);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
