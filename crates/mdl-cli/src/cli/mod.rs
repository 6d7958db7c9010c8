//! CLI for mdl, the mirror-resolving media downloader.

mod commands;
mod progress;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdl_core::config;
use mdl_core::media::MediaKind;
use mdl_core::persist::SaveCapability;
use std::path::PathBuf;

use commands::{run_config_path, run_get, run_mirrors, run_resolve};
use prompt::{FixedPathChooser, PromptChooser};

/// Top-level CLI for mdl.
#[derive(Debug, Parser)]
#[command(name = "mdl")]
#[command(about = "mdl: download video or audio from a link via public resolver mirrors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve a link and download the media.
    Get {
        /// YouTube, TikTok or other http(s) link.
        url: String,
        /// Download audio only (mp3) instead of video (mp4).
        #[arg(long)]
        audio: bool,
        /// Save to this path (or into this directory) without asking.
        #[arg(short, long, value_name = "PATH", conflicts_with = "no_prompt")]
        output: Option<PathBuf>,
        /// Never ask where to save; write into the download directory.
        #[arg(long)]
        no_prompt: bool,
        /// Directory for saves without a chosen location (overrides config).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Resolve a link to its direct media URL without downloading.
    Resolve {
        url: String,
        #[arg(long)]
        audio: bool,
    },

    /// List configured mirrors.
    Mirrors,

    /// Print the path of the config file.
    ConfigPath,
}

fn kind_for(audio: bool) -> MediaKind {
    if audio {
        MediaKind::Audio
    } else {
        MediaKind::Video
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                audio,
                output,
                no_prompt,
                download_dir,
            } => {
                if download_dir.is_some() {
                    cfg.download_dir = download_dir;
                }
                let save = match output {
                    Some(path) => SaveCapability::Available(Box::new(FixedPathChooser::new(path))),
                    None if no_prompt => SaveCapability::Unavailable,
                    None => SaveCapability::Available(Box::new(PromptChooser::new(
                        cfg.download_dir()?,
                    ))),
                };
                run_get(&cfg, &url, kind_for(audio), save).await?;
            }
            CliCommand::Resolve { url, audio } => run_resolve(&cfg, &url, kind_for(audio)).await?,
            CliCommand::Mirrors => run_mirrors(&cfg),
            CliCommand::ConfigPath => run_config_path()?,
        }

        Ok(())
    }
}
