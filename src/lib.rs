pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod processor;
pub mod source;
pub mod store;
pub mod validator;
pub mod writer;


pub use api::*;
pub use config::Settings;
pub use error::{Error, Result};
pub use models::*;
pub use processor::{aggregate, export, export_file, slice};
pub use source::{RecordSource, discover_sources, load_all, source_for_file};
pub use store::{SeriesStore, RecordSnapshot};
pub use validator::Validator;
pub use writer::ExportWriter;

use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
