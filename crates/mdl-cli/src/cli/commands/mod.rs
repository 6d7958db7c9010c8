//! CLI command handlers, one per file.

mod config_path;
mod get;
mod mirrors;
mod resolve;

pub use config_path::run_config_path;
pub use get::run_get;
pub use mirrors::run_mirrors;
pub use resolve::run_resolve;
