use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use text_critic::config::{ProviderConfig, ServerConfig, DEFAULTS};
use text_critic::layout::{layout, render_html};
use text_critic::provider::{analyze_text, AnalysisProvider, HttpProvider};
use text_critic::report::build_report;
use text_critic::server::{self, AppState};
use text_critic::session::Workspace;
use text_critic::theme::{FileStore, MemoryStore, PreferenceStore, ThemeContext};

#[derive(Parser)]
#[command(
    name = "text-critic",
    about = "LLM-backed writing critique with highlighted segments",
    version
)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ProviderArgs {
    /// Chat-completions URL of the analysis provider
    #[arg(long, global = true, env = "TEXT_CRITIC_PROVIDER_URL", default_value = DEFAULTS.provider_url)]
    provider_url: String,

    /// Model identifier sent to the provider
    #[arg(long, global = true, env = "TEXT_CRITIC_MODEL", default_value = DEFAULTS.model)]
    model: String,

    /// Bearer token for the provider
    #[arg(long, global = true, env = "TEXT_CRITIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, global = true, default_value_t = DEFAULTS.temperature)]
    temperature: f32,

    #[arg(long, global = true, default_value_t = DEFAULTS.max_tokens)]
    max_tokens: u32,

    /// Provider request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULTS.timeout_secs)]
    timeout_secs: u64,
}

impl ProviderArgs {
    fn into_config(self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.provider_url,
            model: self.model,
            api_key: self.api_key,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web UI and JSON API
    Serve {
        #[arg(long, default_value = DEFAULTS.bind)]
        bind: SocketAddr,

        /// JSON file holding user preferences (kept in memory if omitted)
        #[arg(long, env = "TEXT_CRITIC_PREFERENCES")]
        preferences: Option<PathBuf>,
    },
    /// Analyze files (reads stdin if none provided)
    Analyze {
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Output::Json)]
        output: Output,
    },
    /// Analyze two versions side by side and compare them
    Compare { current: PathBuf, other: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    /// The normalized analysis result
    Json,
    /// Highlight runs over the text
    Runs,
    /// Highlighted HTML fragment
    Html,
    /// Diagnostic report aggregates
    Report,
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

async fn analyze_one(provider: &dyn AnalysisProvider, text: &str, output: Output) -> Result<()> {
    let result = analyze_text(provider, text).await?;
    let rendered = match output {
        Output::Json => serde_json::to_string_pretty(&result)?,
        Output::Runs => serde_json::to_string_pretty(&layout(text, &result.segments))?,
        Output::Html => render_html(&layout(text, &result.segments)),
        Output::Report => serde_json::to_string_pretty(&build_report(&result))?,
    };
    println!("{rendered}");
    Ok(())
}

async fn compare(provider: &dyn AnalysisProvider, current: &Path, other: &Path) -> Result<()> {
    let mut workspace = Workspace::new();
    workspace.edit_primary(read_text(current)?);
    workspace.comparison.set_text(read_text(other)?);

    let (primary_ticket, primary_text) = workspace.primary.begin()?;
    let (other_ticket, other_text) = workspace.comparison.begin()?;
    let (primary_outcome, other_outcome) = tokio::join!(
        analyze_text(provider, &primary_text),
        analyze_text(provider, &other_text),
    );
    workspace.primary.complete(primary_ticket, primary_outcome);
    workspace.comparison.complete(other_ticket, other_outcome);

    if let Some(e) = workspace.primary.error() {
        bail!("{}: {e}", current.display());
    }
    if let Some(e) = workspace.comparison.error() {
        bail!("{}: {e}", other.display());
    }
    let comparison = workspace
        .comparison()
        .context("both analyses should be ready")?;
    let (Some(a), Some(b)) = (workspace.primary.analysis(), workspace.comparison.analysis()) else {
        bail!("both analyses should be ready");
    };

    let out = json!({
        "current": { "path": current.display().to_string(), "overallScore": a.overall_score },
        "other": { "path": other.display().to_string(), "overallScore": b.overall_score },
        "comparison": comparison,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let http = HttpProvider::new(cli.provider.into_config())?;
    let provider_config = http.config();
    info!(
        endpoint = %provider_config.endpoint,
        model = %provider_config.model,
        authenticated = provider_config.api_key.is_some(),
        "analysis provider configured"
    );
    let provider: Arc<dyn AnalysisProvider> = Arc::new(http);

    match cli.command {
        Command::Serve { bind, preferences } => {
            let store: Box<dyn PreferenceStore> = match &preferences {
                Some(path) => Box::new(
                    FileStore::open(path)
                        .with_context(|| format!("opening preferences {}", path.display()))?,
                ),
                None => Box::new(MemoryStore::default()),
            };
            let config = ServerConfig { bind, preferences };
            let state = Arc::new(AppState::new(provider, ThemeContext::init(store)));
            server::serve(&config, state).await?;
        }
        Command::Analyze { files, output } => {
            if files.is_empty() {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("reading stdin")?;
                analyze_one(provider.as_ref(), &input, output).await?;
            } else {
                for path in &files {
                    let text = read_text(path)?;
                    analyze_one(provider.as_ref(), &text, output).await?;
                }
            }
        }
        Command::Compare { current, other } => {
            compare(provider.as_ref(), &current, &other).await?;
        }
    }
    Ok(())
}
