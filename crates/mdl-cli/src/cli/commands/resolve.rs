//! `mdl resolve <url>` – show the direct media URL a mirror hands out.

use anyhow::{anyhow, Result};
use mdl_core::config::MdlConfig;
use mdl_core::media::{MediaKind, MediaRequest};
use mdl_core::resolver::{Resolver, ResolverOutcome};
use mdl_core::url_model::validate_link;

pub async fn run_resolve(cfg: &MdlConfig, url: &str, kind: MediaKind) -> Result<()> {
    let request = MediaRequest::new(url, kind);
    validate_link(request.source_url())?;

    let resolver = Resolver::from_config(cfg);
    let outcome = tokio::task::spawn_blocking(move || resolver.resolve(&request)).await?;
    match outcome {
        ResolverOutcome::Resolved(media) => {
            println!("{}", media.direct_url);
            println!("filename: {}", media.filename);
            Ok(())
        }
        ResolverOutcome::Failed(failure) => Err(anyhow!(failure.message)),
    }
}
