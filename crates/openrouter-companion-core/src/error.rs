use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OrcError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no API key provided; pass one explicitly or set $OPENROUTER_API_KEY")]
    NoApiKey,

    #[error("failed to fetch models from OpenRouter API: {0}")]
    Fetch(#[source] Box<OrcError>),

    #[error("missing required template variable: {0}")]
    MissingVariable(String),

    #[error("invalid placeholder in template: line {line}, col {col}")]
    InvalidPlaceholder { line: usize, col: usize },

    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("template path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("could not read template file {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, OrcError>;
