use thiserror::Error;

/// Failure of a single gateway round trip.
///
/// Both variants are handled the same way by the sync core; the split only
/// matters for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned an unexpected payload: {message}")]
    Protocol {
        operation: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    pub fn protocol(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            message: message.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. } | Self::Protocol { operation, .. } => operation,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionSetupError {
    #[error("invalid controller url '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("controller url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
