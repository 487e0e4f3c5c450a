pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::AppConfig;
pub use error::CrawlError;
pub use normalize::{is_valid_url, normalize_url};
pub use types::*;
