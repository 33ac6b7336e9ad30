use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to make request: GET {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP error {status} GET {url}: {body:?}")]
    Api { status: u16, url: String, body: String },

    #[error("Failed to decode list of {kind} resources: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to resolve service {service}: {source}")]
    Resolution {
        service: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Failed to parse URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl CoreError {
    /// Wrap a fetch failure as a per-path resolution failure
    pub fn resolution(service: impl Into<String>, source: CoreError) -> Self {
        CoreError::Resolution {
            service: service.into(),
            source: Box::new(source),
        }
    }
}
