//! `mdl get <url>` – run one download session in the foreground.

use anyhow::Result;
use mdl_core::config::MdlConfig;
use mdl_core::media::MediaKind;
use mdl_core::persist::SaveCapability;
use mdl_core::pipeline::{Pipeline, SessionOutcome};
use tokio::signal::unix::{signal, SignalKind};

use crate::cli::progress::Renderer;

pub async fn run_get(cfg: &MdlConfig, url: &str, kind: MediaKind, save: SaveCapability) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    pipeline.select_kind(kind)?;
    let mut events = pipeline.subscribe();
    let mut renderer = Renderer::new();
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut interrupted = false;

    let session = pipeline.run(pipeline.request_for(url), save);
    tokio::pin!(session);

    let result = loop {
        tokio::select! {
            res = &mut session => break res,
            Some(event) = events.recv() => renderer.render(&event),
            _ = interrupt.recv() => {
                if interrupted {
                    // Second Ctrl-C: the session is stuck in a blocking prompt.
                    eprintln!();
                    std::process::exit(130);
                }
                interrupted = true;
                pipeline.cancel();
            }
        }
    };
    while let Ok(event) = events.try_recv() {
        renderer.render(&event);
    }
    renderer.finish();

    match result? {
        SessionOutcome::Saved { path, .. } => println!("Saved {}", path.display()),
        SessionOutcome::OpenedExternally { direct_url, reason } => {
            println!("Download failed ({}); opened the link in the system handler:", reason);
            println!("  {}", direct_url);
        }
        SessionOutcome::Cancelled => println!("Cancelled."),
    }
    Ok(())
}
