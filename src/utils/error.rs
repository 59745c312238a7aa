use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{backend} returned HTTP {status} for {url}")]
    Status {
        backend: &'static str,
        status: u16,
        url: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("snippet project {path} not found on {host}")]
    ProjectNotFound { path: String, host: String },

    #[error("no snippet project id available for {id}")]
    MissingProjectId { id: String },

    #[error("snippet {filename} carries no backend id")]
    MissingSnippetId { filename: String },

    #[error("a gist needs at least one file")]
    EmptyFileSet,

    #[error("{operation} is not supported by the {provider} backend")]
    Unsupported {
        operation: &'static str,
        provider: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
