use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to fetch r/{feed}: {reason}")]
    Fetch { feed: String, reason: String },

    #[error("Webhook rejected delivery with status {status}: {body}")]
    Delivery { status: u16, body: String },

    #[error("Initial fetch failed for r/{feed}: {source}")]
    InitialFetch {
        feed: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
