//! Configuration options for the Freshness Tracker client

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default API origin
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default origin of the public report pages
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

/// Environment variable holding the API origin
pub const API_URL_ENV: &str = "FRESHNESS_API_URL";

/// Environment variable holding the public origin
pub const PUBLIC_URL_ENV: &str = "FRESHNESS_PUBLIC_URL";

/// Configuration options for the Freshness Tracker client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Origin of the REST API
    pub api_url: Url,

    /// Origin that serves the per-batch report pages, encoded into scannable codes
    pub public_url: Url,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            public_url: Url::parse(DEFAULT_PUBLIC_URL).expect("default public URL is valid"),
        }
    }
}

impl ClientOptions {
    /// Build options from explicit origins
    pub fn new(api_url: &str, public_url: &str) -> Result<Self> {
        Ok(Self {
            api_url: parse_origin(api_url)?,
            public_url: parse_origin(public_url)?,
        })
    }

    /// Read `FRESHNESS_API_URL` and `FRESHNESS_PUBLIC_URL`, falling back to the defaults
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let public_url =
            std::env::var(PUBLIC_URL_ENV).unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string());
        Self::new(&api_url, &public_url)
    }

    /// Set the API origin
    pub fn with_api_url(mut self, value: &str) -> Result<Self> {
        self.api_url = parse_origin(value)?;
        Ok(self)
    }

    /// Set the public origin
    pub fn with_public_url(mut self, value: &str) -> Result<Self> {
        self.public_url = parse_origin(value)?;
        Ok(self)
    }

    /// Absolute API URL for `path` (which starts with `/`)
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }
}

fn parse_origin(value: &str) -> Result<Url> {
    let url = Url::parse(value.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            value
        )));
    }
    Ok(url)
}

/// Public addresses advertised by the API server at `GET /config/public`.
///
/// Lets a client running on one machine learn the LAN address phones should
/// open for report pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicConfig {
    pub public_host: String,
    pub public_port: u16,
    pub public_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub api_url: String,
}

impl PublicConfig {
    /// Options pointing at the advertised public origin, keeping the API origin from `base`
    pub fn apply_to(&self, base: ClientOptions) -> Result<ClientOptions> {
        base.with_public_url(&self.public_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let options = ClientOptions::default();
        assert_eq!(options.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(options.public_url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let options = ClientOptions::new("http://api.local:8000/", "http://shop.local").unwrap();
        assert_eq!(options.endpoint("/batches/"), "http://api.local:8000/batches/");
        assert_eq!(options.endpoint("/users/me"), "http://api.local:8000/users/me");
    }

    #[test]
    fn rejects_invalid_urls() {
        match ClientOptions::new("not a url", DEFAULT_PUBLIC_URL) {
            Err(Error::Url(_)) => {}
            other => panic!("expected URL error, got {:?}", other),
        }
        match ClientOptions::default().with_public_url("ftp://files.local") {
            Err(Error::Config(msg)) => assert!(msg.contains("ftp")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn public_config_overrides_public_url_only() {
        let advertised = PublicConfig {
            public_host: "192.168.1.20".to_string(),
            public_port: 3000,
            public_url: "http://192.168.1.20:3000".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            api_url: "http://192.168.1.20:8000".to_string(),
        };
        let options = advertised.apply_to(ClientOptions::default()).unwrap();
        assert_eq!(options.public_url.as_str(), "http://192.168.1.20:3000/");
        assert_eq!(options.api_url.as_str(), "http://localhost:8000/");
    }
}
