//! `mdl mirrors` – list configured mirrors.

use mdl_core::config::MdlConfig;

pub fn run_mirrors(cfg: &MdlConfig) {
    if cfg.mirrors.is_empty() {
        println!("No mirrors configured.");
        return;
    }
    println!(
        "{} mirror(s), tried in random order, {}s timeout each:",
        cfg.mirrors.len(),
        cfg.mirror_timeout_secs
    );
    for m in &cfg.mirrors {
        println!("  {}", m);
    }
}
