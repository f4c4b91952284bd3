//! Terminal client for the DreamARC tutoring backend.

use anyhow::Context;
use clap::Parser;
use directories::BaseDirs;
use dreamarc_config::{DreamarcConfig, LayeredConfigOptions};
use dreamarc_core::Tutor;
use dreamarc_tui::TuiConfig;
use log::{debug, info};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

const LOG_DIR: &str = ".dreamarc";
const LOG_FILE: &str = "dreamarc.log";

/// Command-line options for the TUI client.
#[derive(Parser)]
#[command(name = "dreamarc", version)]
struct Cli {
    /// Optional path to a dreamarc.json5 config file, applied last
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base URL, overrides config and DREAMARC_API_BASE
    #[arg(long)]
    api_base: Option<String>,
    /// Tutor persona for the first conversation (samie, judy)
    #[arg(long)]
    persona: Option<String>,
    /// Write logs to this file instead of ~/.dreamarc/dreamarc.log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Entry point for the DreamARC TUI client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone());
    info!(
        "starting TUI (config_set={}, api_base_set={}, persona_set={})",
        cli.config.is_some(),
        cli.api_base.is_some(),
        cli.persona.is_some()
    );

    let cwd = std::env::current_dir().context("cwd")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        info!("adding runtime config layer: {}", path.display());
        options = options.with_runtime_path(path);
    }
    let layered = DreamarcConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());

    let mut config = layered.config;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    if let Some(api_base) = cli.api_base {
        config.backend.base_url = api_base;
    }
    info!("using backend {}", config.backend.base_url);

    let (tutor, completions) = Tutor::from_config(config).context("failed to build tutor")?;
    dreamarc_tui::run(
        Arc::new(tutor),
        completions,
        TuiConfig {
            persona: cli.persona,
        },
    )
    .await
}

/// Route logs to a file; the terminal belongs to the UI.
fn init_logging(explicit: Option<PathBuf>) {
    let Some(path) = explicit.or_else(default_log_path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn default_log_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(LOG_DIR).join(LOG_FILE))
}
