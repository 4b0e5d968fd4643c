// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for a single plug.

use serde::Deserialize;

use crate::error::Result;
#[cfg(feature = "http")]
use crate::protocol::HttpConfig;
use crate::protocol::{MockSmartPlug, PlugClient};

/// Which client implementation talks to the plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// The plug's HTTP API.
    #[cfg(feature = "http")]
    Http,
    /// The in-memory development plug.
    Mock,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "http")]
        {
            Self::Http
        }
        #[cfg(not(feature = "http"))]
        {
            Self::Mock
        }
    }
}

/// Configuration for a plug.
///
/// The host is required; everything else has a default. The polling
/// interval is fixed (see
/// [`Coordinator::DEFAULT_SCAN_INTERVAL`](crate::Coordinator::DEFAULT_SCAN_INTERVAL)).
///
/// # Examples
///
/// ```
/// use edimax_plug::{Backend, PlugConfig};
///
/// let config = PlugConfig::new("192.168.1.100")
///     .with_name("Washing machine")
///     .with_credentials("admin", "secret");
///
/// let from_file: PlugConfig = serde_json::from_str(
///     r#"{ "host": "192.168.1.100", "backend": "mock" }"#,
/// ).unwrap();
/// assert_eq!(from_file.backend, Backend::Mock);
/// assert_eq!(from_file.name, PlugConfig::DEFAULT_NAME);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlugConfig {
    /// Host name or IP address of the plug.
    pub host: String,
    /// Name used for the coordinator and its entities.
    #[serde(default = "default_name")]
    pub name: String,
    /// Optional (username, password); factory credentials are used otherwise.
    #[serde(default)]
    pub credentials: Option<(String, String)>,
    /// HTTP port of the plug's API.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client implementation.
    #[serde(default)]
    pub backend: Backend,
}

fn default_name() -> String {
    PlugConfig::DEFAULT_NAME.to_string()
}

fn default_port() -> u16 {
    PlugConfig::DEFAULT_PORT
}

impl PlugConfig {
    /// Name used when none is configured.
    pub const DEFAULT_NAME: &'static str = "Edimax Smart Plug";
    /// Port of the plug's API.
    pub const DEFAULT_PORT: u16 = 10000;

    /// Creates a configuration for the plug at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: default_name(),
            credentials: None,
            port: Self::DEFAULT_PORT,
            backend: Backend::default(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets credentials for the plug's API.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the API port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Selects the client implementation.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Builds the client selected by [`backend`](Self::backend).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn build_client(&self) -> Result<PlugClient> {
        match self.backend {
            #[cfg(feature = "http")]
            Backend::Http => {
                let mut http = HttpConfig::new(&self.host)
                    .with_port(self.port)
                    .with_display_name(&self.name);
                if let Some((username, password)) = &self.credentials {
                    http = http.with_credentials(username, password);
                }
                Ok(PlugClient::Http(http.into_client()?))
            }
            Backend::Mock => Ok(PlugClient::Mock(MockSmartPlug::new())),
        }
    }
}
