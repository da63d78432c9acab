use serde_json::{json, Value};
use thiserror::Error;

/// Every way a proxied request can fail. Each variant maps to exactly one
/// HTTP status and JSON body, see [`ProxyError::status`] and [`ProxyError::body`].
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Query parameter is required")]
    MissingQuery,

    #[error("Invalid service parameter")]
    InvalidService,

    /// Raised while picking a credential slot for a known service.
    #[error("Invalid type parameter for {service}")]
    InvalidTypeForService { service: &'static str },

    /// Raised while building the upstream URL.
    #[error("Invalid type parameter")]
    InvalidType,

    #[error("API key not configured for {service} {kind}")]
    MissingCredential {
        service: String,
        kind: String,
        has_search_key: bool,
        has_lookup_key: bool,
    },

    #[error("{label}")]
    Upstream {
        status: u16,
        label: &'static str,
        details: Value,
    },

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Always built through `From`, which strips the request URL (it carries the key).
    #[error("{0}")]
    Http(reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Http(err.without_url())
    }
}

impl ProxyError {
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::MethodNotAllowed => 405,
            ProxyError::MissingQuery
            | ProxyError::InvalidService
            | ProxyError::InvalidTypeForService { .. }
            | ProxyError::InvalidType => 400,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::MissingCredential { .. }
            | ProxyError::Serialization(_)
            | ProxyError::Http(_)
            | ProxyError::Config(_)
            | ProxyError::Internal(_) => 500,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ProxyError::MissingCredential {
                service,
                kind,
                has_search_key,
                has_lookup_key,
            } => json!({
                "error": self.to_string(),
                "debug": {
                    "service": service,
                    "type": kind,
                    "hasSearchKey": has_search_key,
                    "hasLookupKey": has_lookup_key,
                },
            }),
            ProxyError::Upstream { label, details, .. } => json!({
                "error": label,
                "details": details,
            }),
            ProxyError::Serialization(_)
            | ProxyError::Http(_)
            | ProxyError::Config(_)
            | ProxyError::Internal(_) => json!({
                "error": "Server error",
                "message": self.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}
