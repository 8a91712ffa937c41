use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::CommandFactory;
use tracing::Level;

use music_dl_core::core::transcode::{PipelineConfig, Transcoder};
use music_dl_core::models::settings::AppSettings;

pub mod cli;
pub mod commands;
pub mod core;
pub mod platforms;
pub mod storage;

use cli::Cli;

/// Everything a command needs, resolved once at startup.
pub struct AppContext {
    pub settings: AppSettings,
    pub cwd: PathBuf,
    pub transcoder: Arc<Transcoder>,
    pub http: reqwest::Client,
}

impl AppContext {
    pub fn new(settings: AppSettings, cwd: PathBuf) -> anyhow::Result<Self> {
        let config = PipelineConfig::from_settings(&settings, &cwd);
        tracing::debug!(
            "using yt-dlp at {} and ffmpeg at {}",
            config.ytdlp.display(),
            config.ffmpeg.display()
        );

        Ok(Self {
            settings,
            cwd,
            transcoder: Arc::new(Transcoder::new(config)),
            http: crate::core::http_client::build_client()?,
        })
    }
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_path = storage::config::settings_path(cli.config.as_deref());

    if cli.init_config {
        storage::config::init_settings(&settings_path, cli.output.as_deref(), cli.quality.as_deref())?;
        println!("Settings written to {}", settings_path.display());
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let settings = storage::config::load_settings(&settings_path);
    tracing::debug!("settings loaded from {}", settings_path.display());

    let cwd = std::env::current_dir().context("could not read the working directory")?;
    let ctx = AppContext::new(settings, cwd)?;

    println!("Processing: {}", input);

    if cli.list {
        return commands::list::execute(&ctx, &input).await;
    }

    let request = commands::download::DownloadRequest::from_cli(&cli, &input, &ctx.settings, &ctx.cwd);
    commands::download::execute(&ctx, &request).await?;
    Ok(())
}
