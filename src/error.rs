use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for one generation request. Template and render
/// problems are configuration errors, validation rejects the request
/// before any service call, and upstream covers everything the
/// text-generation API can do wrong. No variant is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template '{name}': {reason}")]
    Render { name: String, reason: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("text generation request failed: {0}")]
    Upstream(String),
}

impl Error {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::Upstream(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}
