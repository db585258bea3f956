// Maker API HTTP client
//
// Wraps `reqwest::Client` with endpoint-aware URL construction and access
// token handling. Endpoint families (devices, modes, hsm) are implemented as
// inherent methods in sibling files to keep this module focused on transport.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::endpoint::MakerEndpoint;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest response body kept in an [`Error::Http`].
const ERROR_BODY_PREVIEW: usize = 200;

/// Raw HTTP client for one Maker API app instance.
///
/// Every Maker endpoint is a GET authorised by an `access_token` query
/// parameter. The token is attached at send time and never logged; logged
/// URLs carry the path only.
#[derive(Clone)]
pub struct MakerClient {
    http: reqwest::Client,
    endpoint: MakerEndpoint,
    access_token: SecretString,
}

impl MakerClient {
    /// Create a client, building the HTTP client from a `TransportConfig`.
    pub fn new(
        endpoint: MakerEndpoint,
        access_token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint,
            access_token,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        endpoint: MakerEndpoint,
        access_token: SecretString,
    ) -> Self {
        Self {
            http,
            endpoint,
            access_token,
        }
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &MakerEndpoint {
        &self.endpoint
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorize(&self, mut url: Url) -> Url {
        url.query_pairs_mut()
            .append_pair("access_token", self.access_token.expose_secret());
        url
    }

    /// GET an endpoint and return the raw body of a successful response.
    async fn get_text(&self, segments: &[&str]) -> Result<String, Error> {
        let url = self.endpoint.url(segments)?;
        debug!("GET {}", url.path());

        // reqwest errors embed the request URL, which carries the token.
        let resp = self
            .http
            .get(self.authorize(url))
            .send()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        Ok(body)
    }

    /// GET an endpoint and decode its JSON body.
    ///
    /// Command endpoints on some firmware answer with an empty body; that is
    /// decoded as JSON `null`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let body = self.get_text(segments).await?;
        let payload = if body.trim().is_empty() {
            "null"
        } else {
            body.as_str()
        };

        serde_json::from_str(payload).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })
    }
}

impl std::fmt::Debug for MakerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MakerClient")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
