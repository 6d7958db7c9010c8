//! Hand a URL to the desktop's default handler.
//!
//! Used when the in-process fetch fails after resolution: the system handler
//! (browser, media player) may still be able to fetch what we could not.

use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Runs `xdg-open <url>` with our stdio detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        launch("xdg-open", url)
    }
}

/// Runs `program url` to completion; xdg-open hands off to the handler and exits.
fn launch(program: &str, url: &str) -> Result<()> {
    let status = Command::new(program)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("failed to launch {}", program))?;
    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}
