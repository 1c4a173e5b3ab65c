//! CLI binary for investguard.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `Submission` plus an `AnalysisConfig` and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use investguard::request::{DEFAULT_GOALS, DEFAULT_NOTES};
use investguard::{
    analyze, analyze_to_file, preview_prompt, write_report, AnalysisConfig, AnalysisOutput,
    AnalysisProgressCallback, Horizon, ProductType, ProgressCallback, RiskProfile,
    Stage, Submission, MAX_CONTENT_CHARS,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the current stage and logs each finished one.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// The spinner stays hidden until `on_analysis_start`.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Analyzing");
        bar.set_message("Preparing…");

        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<26} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} retry {}/{}  {}",
            cyan("↻"),
            attempt,
            max_retries,
            red(&msg)
        ));
    }

    fn on_analysis_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse pasted text
  investguard --product-type health-insurance --text "Room rent capped at 1% of sum insured..."

  # Analyse a PDF brochure against your goals
  investguard --pdf scheme.pdf --product-type mutual-fund \
      --goals "Retirement in 20 years" --risk-profile medium --horizon long

  # Save the report
  investguard --pdf policy.pdf -o report.md

  # JSON output (report + raw model text + stats)
  investguard --text-file terms.txt --json > analysis.json

  # See the exact prompt without calling the model
  investguard --text-file terms.txt --show-prompt

  # Use another provider through edgequake-llm
  investguard --provider openai --model gpt-4.1-mini --pdf policy.pdf

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY      OpenRouter API key (required for the default endpoint)
  INVESTGUARD_MODEL       Override model ID
  INVESTGUARD_BASE_URL    Override the OpenAI-compatible base URL
  INVESTGUARD_PROVIDER    Use an edgequake-llm provider instead (openai, anthropic, ollama, ...)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter (e.g. investguard=debug)

  Variables may also be placed in a .env file in the working directory.

NOTE:
  Only the first 3000 characters of the document are sent to the model.
  The report is informational and is not financial advice.
"#;

/// Analyse a financial product document against your goals using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "investguard",
    version,
    about = "Analyse a financial product document against your goals using an LLM",
    long_about = "Paste a product document or point at its PDF, describe your goals, risk \
profile and horizon, and get a structured report: verdict, pros, cons, charges, risks, red \
flags, suitability and questions to ask. Uses OpenRouter by default; any OpenAI-compatible \
endpoint or edgequake-llm provider works.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Kind of product being analysed.
    #[arg(long, value_enum, default_value = "health-insurance")]
    product_type: ProductTypeArg,

    /// What you want the product to do for you.
    #[arg(long, default_value = DEFAULT_GOALS)]
    goals: String,

    /// Anything else worth checking, such as claims made by the seller.
    #[arg(long, default_value = DEFAULT_NOTES)]
    notes: String,

    /// Document text pasted on the command line.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the document text from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// PDF of the product document. Takes precedence over --text.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Your appetite for risk.
    #[arg(long, value_enum, default_value = "low")]
    risk_profile: RiskArg,

    /// How long you intend to hold the product.
    #[arg(long, value_enum, default_value = "short")]
    horizon: HorizonArg,

    /// PDF user password for encrypted documents.
    #[arg(long)]
    password: Option<String>,

    /// Model ID on the endpoint (default: deepseek/deepseek-chat-v3.1:free).
    #[arg(long)]
    model: Option<String>,

    /// edgequake-llm provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        long_help = "Send the completion through an edgequake-llm provider instead of the \
OpenAI-compatible endpoint. The provider reads its own API key (OPENAI_API_KEY, etc.)."
    )]
    provider: Option<String>,

    /// OpenAI-compatible base URL (default: https://openrouter.ai/api/v1).
    #[arg(long)]
    base_url: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long)]
    temperature: Option<f32>,

    /// Max LLM output tokens.
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Extra attempts after a transient LLM failure.
    #[arg(long, default_value_t = 0)]
    max_retries: u32,

    /// LLM call timeout in seconds (default: none).
    #[arg(long)]
    api_timeout: Option<u64>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long)]
    system_prompt: Option<PathBuf>,

    /// Send the document text exactly as given, without whitespace cleanup.
    #[arg(long)]
    no_clean: bool,

    /// Print the prompt that would be sent and exit without calling the model.
    #[arg(long)]
    show_prompt: bool,

    /// Output structured JSON (AnalysisOutput) instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProductTypeArg {
    HealthInsurance,
    MutualFund,
    FixedDeposit,
    Bond,
    Other,
}

impl From<ProductTypeArg> for ProductType {
    fn from(v: ProductTypeArg) -> Self {
        match v {
            ProductTypeArg::HealthInsurance => ProductType::HealthInsurance,
            ProductTypeArg::MutualFund => ProductType::MutualFund,
            ProductTypeArg::FixedDeposit => ProductType::FixedDeposit,
            ProductTypeArg::Bond => ProductType::Bond,
            ProductTypeArg::Other => ProductType::Other,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RiskArg {
    Low,
    Medium,
    High,
}

impl From<RiskArg> for RiskProfile {
    fn from(v: RiskArg) -> Self {
        match v {
            RiskArg::Low => RiskProfile::Low,
            RiskArg::Medium => RiskProfile::Medium,
            RiskArg::High => RiskProfile::High,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HorizonArg {
    Short,
    Medium,
    Long,
}

impl From<HorizonArg> for Horizon {
    fn from(v: HorizonArg) -> Self {
        match v {
            HorizonArg::Short => Horizon::Short,
            HorizonArg::Medium => Horizon::Medium,
            HorizonArg::Long => Horizon::Long,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so .env can supply RUST_LOG and the INVESTGUARD_* variables.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.show_prompt;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let submission = build_submission(&cli).await?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Prompt preview ───────────────────────────────────────────────────
    if cli.show_prompt {
        let prompt = preview_prompt(&submission, &config)
            .await
            .context("Failed to build prompt")?;
        println!("{prompt}");
        return Ok(());
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let result = match (&cli.output, cli.json) {
        (Some(path), false) => analyze_to_file(&submission, path, &config).await,
        _ => analyze(&submission, &config).await,
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Some(raw) = e.raw_response() {
                // Show the model's reply verbatim rather than a partial report.
                eprintln!("{} {}", red("✘"), e);
                println!("{raw}");
                std::process::exit(1);
            }
            return Err(anyhow::Error::new(e).context("Analysis failed"));
        }
    };

    if output.content_truncated && !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!(
                "Note: only the first {} of {} characters of the document were analysed.",
                MAX_CONTENT_CHARS, output.content_chars
            ))
        );
    }

    emit(&cli, &output).await?;

    if !cli.quiet && !cli.json {
        print_summary(&cli, &output);
    }

    Ok(())
}

/// Write the report where the flags say.
async fn emit(cli: &Cli, output: &AnalysisOutput) -> Result<()> {
    let rendered = if cli.json {
        serde_json::to_string_pretty(output).context("Failed to serialise output")?
    } else {
        output.report.to_markdown()
    };

    match cli.output {
        // Markdown to a file was already written by analyze_to_file.
        Some(_) if !cli.json => Ok(()),
        Some(ref path) => write_report(path, &rendered)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
            Ok(())
        }
    }
}

fn print_summary(cli: &Cli, output: &AnalysisOutput) {
    let stats = &output.stats;
    let target = cli
        .output
        .as_ref()
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  verdict {}  {}ms{}",
        green("✔"),
        bold(output.report.verdict_label()),
        stats.total_duration_ms,
        target,
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out{}",
        dim(&stats.input_tokens.to_string()),
        dim(&stats.output_tokens.to_string()),
        if stats.retries > 0 {
            format!("  ({} retries)", stats.retries)
        } else {
            String::new()
        }
    );
}

/// Map CLI args to a `Submission`.
async fn build_submission(cli: &Cli) -> Result<Submission> {
    let text = match (&cli.text, &cli.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document text from {:?}", path))?,
        (None, None) => String::new(),
    };

    let mut submission = Submission::new(cli.product_type.into())
        .goals(cli.goals.clone())
        .notes(cli.notes.clone())
        .risk_profile(cli.risk_profile.into())
        .horizon(cli.horizon.into())
        .text(text);

    if let Some(ref path) = cli.pdf {
        submission = submission
            .pdf_file(path)
            .with_context(|| format!("Failed to read PDF {:?}", path))?;
    }

    Ok(submission)
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = AnalysisConfig::builder()
        .with_env()
        .max_retries(cli.max_retries)
        .clean_content(!cli.no_clean);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
