// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for Edimax smart plugs.
//!
//! The plug exposes a single endpoint, `/smartplug.cgi` on port 10000, that
//! takes an XML document naming the values to read (`CMD id="get"`) or write
//! (`CMD id="setup"`) and answers with the same document filled in.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{DeviceError, ParseError, ProtocolError, Result};
use crate::protocol::DeviceClient;
use crate::state::DeviceInfo;
use crate::types::PowerState;

const POWER_STATE: &str = "Device.System.Power.State";
const NOW_POWER: &str = "Device.System.Power.NowPower";
const NOW_ENERGY_DAY: &str = "Device.System.Power.NowEnergy.Day";

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration for an HTTP smart plug.
///
/// # Examples
///
/// ```
/// use edimax_plug::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.100")
///     .with_credentials("admin", "secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://192.168.1.100:10000");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    credentials: (String, String),
    timeout: Duration,
    display_name: String,
}

impl HttpConfig {
    /// Port the plug's web API listens on.
    pub const DEFAULT_PORT: u16 = 10000;
    /// Factory username.
    pub const DEFAULT_USERNAME: &'static str = "admin";
    /// Factory password.
    pub const DEFAULT_PASSWORD: &'static str = "1234";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Name used when the plug has none configured.
    pub const DEFAULT_DISPLAY_NAME: &'static str = "Edimax SmartPlug";

    /// Creates a configuration for the plug at `host` with factory credentials.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            credentials: (
                Self::DEFAULT_USERNAME.to_string(),
                Self::DEFAULT_PASSWORD.to_string(),
            ),
            timeout: Self::DEFAULT_TIMEOUT,
            display_name: Self::DEFAULT_DISPLAY_NAME.to_string(),
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = (username.into(), password.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the name reported when the plug has no name of its own.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the username and password.
    #[must_use]
    pub fn credentials(&self) -> (&str, &str) {
        (&self.credentials.0, &self.credentials.1)
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> std::result::Result<HttpClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            endpoint: format!("{}/smartplug.cgi", self.base_url()),
            client,
            username: self.credentials.0,
            password: self.credentials.1,
            timeout: self.timeout,
            display_name: self.display_name,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// HTTP client for a single Edimax plug.
///
/// # Examples
///
/// ```no_run
/// use edimax_plug::protocol::{DeviceClient, HttpConfig};
///
/// # async fn example() -> edimax_plug::Result<()> {
/// let client = HttpConfig::new("192.168.1.100").into_client()?;
/// let watts = client.get_power().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    endpoint: String,
    client: Client,
    username: String,
    password: String,
    timeout: Duration,
    display_name: String,
}

impl HttpClient {
    /// Returns the URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one command document and returns the reply body.
    async fn post(&self, command: &str, body: &str) -> std::result::Result<String, ProtocolError> {
        let document = command_document(command, body);

        tracing::debug!(endpoint = %self.endpoint, command, "Sending plug command");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/xml")
            .body(document)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!(body = %body, "Received plug response");

        Ok(body)
    }

    async fn get(&self, body: &str) -> Result<String> {
        Ok(self.post("get", body).await?)
    }

    fn transport_error(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            ProtocolError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else if err.is_connect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }
}

impl DeviceClient for HttpClient {
    async fn get_state(&self) -> Result<PowerState> {
        let reply = self.get(&empty_element(POWER_STATE)).await?;
        let raw = required_text(&reply, POWER_STATE)?;
        raw.parse::<PowerState>().map_err(|e| {
            ParseError::InvalidValue {
                field: POWER_STATE.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn set_state(&self, state: PowerState) -> Result<()> {
        let body = format!("<{POWER_STATE}>{state}</{POWER_STATE}>");
        let reply = self.post("setup", &body).await?;

        match element_text(&reply, "CMD") {
            Some("OK") => Ok(()),
            Some(other) => Err(DeviceError::CommandRejected(other.to_string()).into()),
            None => Err(ParseError::MissingField("CMD".to_string()).into()),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        let reply = self.get("<SYSTEM_INFO></SYSTEM_INFO>").await?;

        let display_name = element_text(&reply, "Device.System.Name")
            .filter(|name| !name.is_empty())
            .map_or_else(|| self.display_name.clone(), unescape);

        Ok(DeviceInfo {
            serial_number: unescape(required_text(&reply, "Run.LAN.Client.MAC.Address")?),
            product_name: unescape(required_text(&reply, "Run.Model")?),
            display_name,
            firmware_version: unescape(required_text(&reply, "Run.FW.Version")?),
            vendor: element_text(&reply, "Run.Cus").map_or_else(String::new, unescape),
        })
    }

    async fn get_power(&self) -> Result<f64> {
        let body = format!("<NOW_POWER>{}</NOW_POWER>", empty_element(NOW_POWER));
        let reply = self.get(&body).await?;
        parse_reading(&reply, NOW_POWER)
    }

    async fn get_energy_today(&self) -> Result<f64> {
        let body = format!("<NOW_POWER>{}</NOW_POWER>", empty_element(NOW_ENERGY_DAY));
        let reply = self.get(&body).await?;
        parse_reading(&reply, NOW_ENERGY_DAY)
    }
}

// ============================================================================
// XML helpers
// ============================================================================

fn command_document(command: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF8"?><SMARTPLUG id="edimax"><CMD id="{command}">{body}</CMD></SMARTPLUG>"#
    )
}

fn empty_element(tag: &str) -> String {
    format!("<{tag}></{tag}>")
}

/// Returns the trimmed text of the first `tag` element.
///
/// Tag names must match exactly, so `Power.State` does not match
/// `Power.StateX`. Self-closing elements yield an empty string.
fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut from = 0;

    while let Some(pos) = xml[from..].find(&open) {
        let start = from + pos + open.len();
        let rest = &xml[start..];
        let gt = rest.find('>')?;
        let head = &rest[..gt];

        if !head.is_empty() && !head.starts_with([' ', '\t', '\r', '\n', '/']) {
            from = start;
            continue;
        }
        if head.ends_with('/') {
            return Some("");
        }

        let inner = &rest[gt + 1..];
        return inner.find(&close).map(|end| inner[..end].trim());
    }
    None
}

fn required_text<'a>(xml: &'a str, tag: &str) -> Result<&'a str> {
    element_text(xml, tag).ok_or_else(|| ParseError::MissingField(tag.to_string()).into())
}

fn parse_reading(xml: &str, tag: &str) -> Result<f64> {
    let raw = required_text(xml, tag)?;
    let invalid = |message: String| ParseError::InvalidValue {
        field: tag.to_string(),
        message,
    };

    let value = raw
        .parse::<f64>()
        .map_err(|e| invalid(format!("{raw:?}: {e}")))?;
    if !value.is_finite() {
        return Err(invalid(format!("{raw:?} is not a finite number")).into());
    }
    Ok(value)
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
