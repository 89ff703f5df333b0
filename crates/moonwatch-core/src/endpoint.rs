//! Endpoint derivation.
//!
//! The observer connects back to the host that served its page: the secure
//! WebSocket scheme iff the page is secure, the page's hostname, the page's
//! port (or [`DEFAULT_PORT`] when the page has none), and [`ENDPOINT_PATH`].

use url::Url;

use crate::error::ConnectionError;

/// Port used when the page location carries none.
pub const DEFAULT_PORT: u16 = 8080;

/// Path of the event stream endpoint.
pub const ENDPOINT_PATH: &str = "/ws";

/// Location of the page hosting the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Page was served over a secure scheme
    pub secure: bool,
    /// Page hostname
    pub hostname: String,
    /// Explicit page port. `None` when the page uses its scheme's default.
    pub port: Option<u16>,
}

impl PageLocation {
    /// Location from explicit parts.
    pub fn new(secure: bool, hostname: impl Into<String>, port: Option<u16>) -> Self {
        Self { secure, hostname: hostname.into(), port }
    }

    /// Location of a page URL such as `https://game.example:9000/observer`.
    ///
    /// A port equal to the scheme default is treated as absent, matching how
    /// a browser reports it.
    pub fn from_page_url(page: &str) -> Result<Self, ConnectionError> {
        let url = Url::parse(page)
            .map_err(|err| ConnectionError::InvalidEndpoint { reason: format!("{page}: {err}") })?;

        let secure = match url.scheme() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            other => {
                return Err(ConnectionError::InvalidEndpoint {
                    reason: format!("unsupported page scheme {other}"),
                });
            },
        };

        let hostname = url
            .host_str()
            .ok_or_else(|| ConnectionError::InvalidEndpoint {
                reason: format!("{page}: no hostname"),
            })?
            .to_owned();

        Ok(Self { secure, hostname, port: url.port() })
    }

    /// WebSocket endpoint URL for this page.
    ///
    /// # Errors
    ///
    /// `InvalidEndpoint` when the hostname does not form a valid URL.
    pub fn endpoint_url(&self) -> Result<Url, ConnectionError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let raw = format!("{scheme}://{}:{port}{ENDPOINT_PATH}", self.hostname);

        Url::parse(&raw)
            .map_err(|err| ConnectionError::InvalidEndpoint { reason: format!("{raw}: {err}") })
    }
}

impl Default for PageLocation {
    fn default() -> Self {
        Self::new(false, "localhost", None)
    }
}
