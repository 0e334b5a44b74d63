//! CLI binary for edgequake-summarize.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SummaryConfig` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_summarize::{
    FsObjectStore, HttpObjectStore, ObjectStore, ProviderShape, SummarizeError, Summarizer,
    SummaryConfig, SummaryResult, SummarySource, SummaryStyle, WireRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a local PDF
  docsum report.pdf

  # Bullet points from a typed note
  docsum --note "Buy milk. Call Alice. Finish report." --style bullet

  # Replay a wire request ({"type":"file","fileKey":"...","summaryType":"brief"})
  docsum --request request.json --store-url https://uploads.example.com/bucket

  # Offline: extraction, quality gate and extractive summary only
  docsum --no-ai scan.pdf

  # Wire JSON output
  docsum --json --style technical spec.pdf

STYLES:
  brief (default), detailed, bullet, sentiment, technical

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Summarise documents and notes with an LLM, falling back to extraction.
#[derive(Parser, Debug)]
#[command(
    name = "docsum",
    version,
    about = "Summarise PDFs, scans and notes with an LLM",
    long_about = "Extract text from a PDF, plain-text file, scanned image or typed note, check \
that it is readable prose, and summarise it with an LLM. When the model is unavailable or slow \
an extractive summary is returned instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file to summarise.
    #[arg(conflicts_with_all = ["note", "request"])]
    file: Option<PathBuf>,

    /// Summarise this text as a note.
    #[arg(long, conflicts_with = "request")]
    note: Option<String>,

    /// JSON wire request to run; `-` reads stdin.
    #[arg(long)]
    request: Option<String>,

    /// Summary style: brief, detailed, bullet, sentiment, technical.
    #[arg(long, env = "DOCSUM_STYLE", default_value = "brief")]
    style: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default: gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Prompt shape sent to the provider.
    #[arg(long, env = "DOCSUM_SHAPE", value_enum, default_value = "chat")]
    shape: ShapeArg,

    /// Hard deadline for the generation call, in milliseconds.
    #[arg(long, env = "DOCSUM_TIMEOUT_MS", default_value_t = 2_000)]
    timeout_ms: u64,

    /// Characters of sanitised text sent to the model (6000–14000).
    #[arg(long, env = "DOCSUM_BUDGET", default_value_t = 8_000)]
    budget: usize,

    /// Skip the LLM entirely; always use the extractive summary.
    #[arg(long, env = "DOCSUM_NO_AI")]
    no_ai: bool,

    /// Never run OCR on weak extractions.
    #[arg(long, env = "DOCSUM_NO_OCR")]
    no_ocr: bool,

    /// Fetch file keys from `GET {url}/{key}` instead of the local disk.
    #[arg(long, env = "DOCSUM_STORE_URL")]
    store_url: Option<String>,

    /// Output the wire JSON result instead of plain text.
    #[arg(long, env = "DOCSUM_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSUM_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ShapeArg {
    Chat,
    Completion,
}

impl From<ShapeArg> for ProviderShape {
    fn from(v: ShapeArg) -> Self {
        match v {
            ShapeArg::Chat => ProviderShape::Chat,
            ShapeArg::Completion => ProviderShape::Completion,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_spinner = !cli.json && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if show_spinner {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request and collaborators ──────────────────────────────────
    let (wire, local_root) = build_request(&cli)?;
    let config = build_config(&cli)?;
    let store = build_store(&cli, local_root)?;

    let summarizer = match Summarizer::from_config(config.clone()) {
        Ok(s) => s,
        Err(e @ SummarizeError::ProviderNotConfigured { .. }) => {
            warn!("{}; continuing with extractive summaries", e);
            Summarizer::new(config)
        }
        Err(e) => return Err(e).context("Failed to initialise summariser"),
    };
    let summarizer = match store {
        Some(store) => summarizer.with_store(store),
        None => summarizer,
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Summarising");
        bar.set_message(wire.file_key.clone().unwrap_or_else(|| "note".into()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = summarizer.summarize_wire(wire).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let result = outcome.context("Summarisation failed")?;

    print_result(&cli, &result)
}

/// Map the input flags to a wire request. Also returns the directory a
/// local `FILE` lives in, which becomes the object-store root.
fn build_request(cli: &Cli) -> Result<(WireRequest, Option<PathBuf>)> {
    if let Some(ref source) = cli.request {
        let body = if source == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        } else {
            std::fs::read_to_string(source)
                .with_context(|| format!("Failed to read request from {source:?}"))?
        };
        let wire: WireRequest =
            serde_json::from_str(&body).context("Request is not valid JSON")?;
        return Ok((wire, Some(PathBuf::from("."))));
    }

    let style = Some(SummaryStyle::parse_lenient(&cli.style).as_str().to_string());

    if let Some(ref text) = cli.note {
        let wire = WireRequest {
            kind: Some("note".into()),
            content: Some(text.clone()),
            file_key: None,
            summary_type: style,
        };
        return Ok((wire, None));
    }

    let path = cli
        .file
        .as_ref()
        .context("Provide a FILE, --note or --request")?;

    // With a remote store the argument is the key itself.
    if cli.store_url.is_some() {
        let wire = file_request(path.to_string_lossy().into_owned(), style);
        return Ok((wire, None));
    }

    let name = path
        .file_name()
        .with_context(|| format!("{path:?} is not a file path"))?
        .to_string_lossy()
        .into_owned();
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((file_request(name, style), Some(root)))
}

fn file_request(key: String, style: Option<String>) -> WireRequest {
    WireRequest {
        kind: Some("file".into()),
        content: None,
        file_key: Some(key),
        summary_type: style,
    }
}

/// Map CLI args to `SummaryConfig`.
fn build_config(cli: &Cli) -> Result<SummaryConfig> {
    let mut builder = SummaryConfig::builder()
        .content_budget_chars(cli.budget)
        .generation_timeout_ms(cli.timeout_ms)
        .provider_shape(cli.shape.into())
        .ai_enabled(!cli.no_ai)
        .ocr_enabled(!cli.no_ocr);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}

fn build_store(cli: &Cli, local_root: Option<PathBuf>) -> Result<Option<Arc<dyn ObjectStore>>> {
    if let Some(ref url) = cli.store_url {
        let store = HttpObjectStore::new(url.clone(), 30).context("Invalid --store-url")?;
        return Ok(Some(Arc::new(store)));
    }
    Ok(local_root.map(|root| Arc::new(FsObjectStore::new(root)) as Arc<dyn ObjectStore>))
}

fn print_result(cli: &Cli, result: &SummaryResult) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialise output")?
        );
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", result.summary_text).context("Failed to write to stdout")?;

    let origin = match (result.source, result.model_identifier.as_deref()) {
        (SummarySource::Ai, Some(model)) => green(&format!("✔ ai ({model})")),
        (SummarySource::Ai, None) => green("✔ ai"),
        (SummarySource::Fallback, _) => cyan("⚠ fallback"),
    };
    eprintln!(
        "{}  {}",
        origin,
        dim(&format!(
            "{} chars in  →  {} chars out",
            result.original_length,
            result.summary_text.chars().count()
        ))
    );
    if let Some(ref warning) = result.warning {
        eprintln!("   {}", dim(warning));
    }
    Ok(())
}
