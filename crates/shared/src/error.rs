use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Failed to load {url}: {status} {status_text}")]
    Fetch {
        url: String,
        status: u16,
        status_text: String,
    },
    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },
    #[error("{0}")]
    Geocode(String),
    #[error("{0} is unavailable.")]
    RenderUnavailable(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Export failed: {0}")]
    Snapshot(String),
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
