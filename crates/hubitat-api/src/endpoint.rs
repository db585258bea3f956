use url::Url;

use crate::error::Error;

/// Base URL of Hubitat's cloud relay.
pub const CLOUD_API_HOST: &str = "https://cloud.hubitat.com";

/// How requests reach the hub.
///
/// Determines the path prefix in front of every Maker API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubAccess {
    /// Through the cloud relay -- `/api/{hub_id}/apps/{app_id}`.
    Cloud { hub_id: String },
    /// Directly on the LAN -- `/apps/api/{app_id}`.
    Local,
}

impl HubAccess {
    /// The path segments preceding an endpoint for the given Maker app.
    pub fn prefix_segments<'a>(&'a self, app_id: &'a str) -> Vec<&'a str> {
        match self {
            Self::Cloud { hub_id } => vec!["api", hub_id.as_str(), "apps", app_id],
            Self::Local => vec!["apps", "api", app_id],
        }
    }

    /// The path prefix as a string, e.g. `/apps/api/42`.
    pub fn path_prefix(&self, app_id: &str) -> String {
        let mut prefix = String::new();
        for segment in self.prefix_segments(app_id) {
            prefix.push('/');
            prefix.push_str(segment);
        }
        prefix
    }
}

/// Where a Maker API app lives: host, access mode and app id.
///
/// Never carries the access token; [`MakerClient`](crate::MakerClient)
/// appends it per request so endpoints are safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakerEndpoint {
    base_url: Url,
    access: HubAccess,
    app_id: String,
}

impl MakerEndpoint {
    /// Build an endpoint, rejecting a cloud access mode without a hub id.
    pub fn new(base_url: Url, access: HubAccess, app_id: impl Into<String>) -> Result<Self, Error> {
        if let HubAccess::Cloud { hub_id } = &access {
            if hub_id.trim().is_empty() {
                return Err(Error::MissingHubId);
            }
        }
        Ok(Self {
            base_url,
            access,
            app_id: app_id.into(),
        })
    }

    /// Endpoint on Hubitat's cloud relay.
    pub fn cloud(hub_id: impl Into<String>, app_id: impl Into<String>) -> Result<Self, Error> {
        let base_url = Url::parse(CLOUD_API_HOST)?;
        Self::new(
            base_url,
            HubAccess::Cloud {
                hub_id: hub_id.into(),
            },
            app_id,
        )
    }

    /// Endpoint on a hub reachable over the LAN (e.g. `http://192.168.1.20`).
    pub fn local(base_url: Url, app_id: impl Into<String>) -> Self {
        Self {
            base_url,
            access: HubAccess::Local,
            app_id: app_id.into(),
        }
    }

    /// Pick the access mode from a host string.
    ///
    /// The cloud relay host selects [`HubAccess::Cloud`] and requires a hub
    /// id; any other host is treated as a local hub.
    pub fn from_host(host: &str, hub_id: Option<&str>, app_id: impl Into<String>) -> Result<Self, Error> {
        let base_url = Url::parse(host)?;
        let is_cloud = host.trim_end_matches('/') == CLOUD_API_HOST;
        if is_cloud {
            let hub_id = hub_id.ok_or(Error::MissingHubId)?;
            Self::new(
                base_url,
                HubAccess::Cloud {
                    hub_id: hub_id.into(),
                },
                app_id,
            )
        } else {
            Ok(Self::local(base_url, app_id))
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn access(&self) -> &HubAccess {
        &self.access
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Build the URL for an endpoint given as path segments.
    ///
    /// Segments are percent-encoded individually, so free-text command
    /// arguments (announcement messages) survive intact.
    pub fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(self.access.prefix_segments(&self.app_id));
            path.extend(segments);
        }
        Ok(url)
    }
}
