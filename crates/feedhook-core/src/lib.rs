pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod relay;
pub mod scheduler;

pub use config::{load_feed_list, AppConfig, InitFailurePolicy};
pub use error::{Error, Result};
