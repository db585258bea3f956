use thiserror::Error;

/// Top-level error type for the `hubitat-api` crate.
///
/// Covers every failure mode of the Maker API surface: endpoint
/// construction, transport, non-success HTTP statuses and payload decoding.
/// `hubitat-core` wraps these transparently so callers see them unmodified.
#[derive(Debug, Error)]
pub enum Error {
    // ── Endpoint ────────────────────────────────────────────────────
    /// The cloud relay needs a hub id to route requests.
    #[error("hub id required for the cloud Maker API")]
    MissingHubId,

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Maker API ───────────────────────────────────────────────────
    /// The hub answered with a non-success status.
    #[error("Maker API error (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the hub rejected the access token.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 401 || *status == 403,
            Self::Transport(e) => e.status().is_some_and(|s| {
                s == reqwest::StatusCode::UNAUTHORIZED || s == reqwest::StatusCode::FORBIDDEN
            }),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Http { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if the failure happened before the hub answered.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
