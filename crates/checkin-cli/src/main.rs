mod push;

use std::path::PathBuf;

use anyhow::Context;
use checkin_core::config::DEFAULT_TOKEN_DIR;
use checkin_core::{load_accounts, load_families, Pacing, RunConfig, RunLog};
use clap::Parser;
use cloud_client::HttpClientFactory;

use crate::push::PushSettings;

#[derive(Parser)]
#[command(
    name = "checkin",
    about = "Sign in every configured cloud storage account and push the daily report",
    version
)]
struct Cli {
    /// Account list (YAML or JSON) with identifier/secret entries
    #[arg(long, env = "ACCOUNTS_FILE", default_value = "accounts.yaml")]
    accounts: PathBuf,

    /// Family group allow-list (YAML or JSON); a missing file targets the first group
    #[arg(long, env = "FAMILIES_FILE", default_value = "families.yaml")]
    families: PathBuf,

    /// Concurrent family sign-ins for secondary accounts
    #[arg(long, env = "EXEC_THRESHOLD", default_value_t = 1)]
    exec_threshold: usize,

    /// Number of leading accounts treated as primary
    #[arg(long, env = "MAIN_ACCOUNT", default_value_t = 1)]
    main_account: usize,

    /// Persist session tokens between runs (`1`/`true` enable it)
    #[arg(
        long,
        env = "CACHE_TOKEN",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    cache_token: bool,

    /// Directory for persisted session tokens
    #[arg(long, env = "TOKEN_DIR", default_value = DEFAULT_TOKEN_DIR)]
    token_dir: PathBuf,

    /// Base URL of the cloud API gateway
    #[arg(long, env = "CLOUD_API_URL", default_value = "http://127.0.0.1:8787")]
    api_url: String,

    /// Mirror the run log to this file (truncated after the push)
    #[arg(long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    push: PushSettings,
}

fn main() {
    // A missing .env is fine; settings can come from the real environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = execute(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let accounts = load_accounts(&cli.accounts)
        .with_context(|| format!("failed to load accounts from {}", cli.accounts.display()))?;
    let families = load_families(&cli.families)
        .with_context(|| format!("failed to load families from {}", cli.families.display()))?;

    let config = RunConfig {
        exec_threshold: cli.exec_threshold,
        main_account: cli.main_account,
        cache_token: cli.cache_token,
        token_dir: cli.token_dir,
        families,
        pacing: Pacing::default(),
    };
    config.validate().context("invalid run configuration")?;

    if accounts.is_empty() {
        tracing::warn!(path = %cli.accounts.display(), "no accounts configured");
    }

    let factory = HttpClientFactory::new(&cli.api_url).context("failed to build HTTP client")?;
    let notifier = cli.push.dispatcher(reqwest::Client::new());
    if notifier.is_empty() {
        tracing::warn!("no push channel configured, the report will only be logged");
    } else {
        tracing::info!(channels = notifier.len(), "push channels configured");
    }
    let log = match cli.log_file {
        Some(path) => RunLog::with_file(path),
        None => RunLog::new(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(checkin_core::run(
        &accounts, &config, &factory, &notifier, &log,
    ));

    if let Some(e) = summary.aborted() {
        tracing::warn!(error = %e, "batch stopped early");
    }
    Ok(())
}
