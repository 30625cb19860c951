//! CLI command implementations.

mod analyze;
mod ask;
mod config;
mod delete;
mod export;
mod info;
mod ingest;
mod list;
mod reingest;

pub use analyze::run_analyze;
pub use ask::run_ask;
pub use config::run_config;
pub use delete::run_delete;
pub use export::run_export;
pub use info::run_info;
pub use ingest::run_ingest;
pub use list::run_list;
pub use reingest::run_reingest;
