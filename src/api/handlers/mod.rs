// Submodules
pub mod common;  // Error to response mapping
pub mod health;  // Health check endpoint

// Series endpoints
pub mod upload;
pub mod flags;
pub mod download;
pub mod reload;

// Re-exports
pub use common::status_for;
pub use health::health_check;

pub use upload::{upload_flag_records, upload_records};
pub use flags::{get_flag, list_flags};
pub use download::{content_disposition, download_csv};
pub use reload::reload_flag;
