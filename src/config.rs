//! Static bridge configuration and per-session parameters.

use crate::error::{Error, Result};
use crate::sdp::MAX_OFFER_BYTES;
use crate::utils::{derive_session_id, Clock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_VENDOR_PATH: &str = "xtend_tuya";
pub const DEFAULT_ICE_FORMAT: &str = "GO2RTC";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Bridge-wide settings shared by every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// Segment under `/api/` that hosts the bridge services
    pub vendor_path: String,

    /// Value of the `format` query parameter on ICE discovery
    pub ice_format: String,

    /// Per-request timeout applied to both bridge calls
    pub request_timeout_ms: u64,

    /// Payload ceiling enforced by the device on the offer body
    pub max_offer_bytes: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            vendor_path: DEFAULT_VENDOR_PATH.to_string(),
            ice_format: DEFAULT_ICE_FORMAT.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_offer_bytes: MAX_OFFER_BYTES,
        }
    }
}

impl SignalingConfig {
    /// Defaults overridden by `BRIDGE_VENDOR_PATH`, `BRIDGE_ICE_FORMAT`
    /// and `BRIDGE_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("BRIDGE_VENDOR_PATH") {
            config.vendor_path = path;
        }
        if let Ok(format) = std::env::var("BRIDGE_ICE_FORMAT") {
            config.ice_format = format;
        }
        if let Ok(secs) = std::env::var("BRIDGE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| Error::Config(format!("BRIDGE_TIMEOUT_SECS is not a number: {secs}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_vendor_path(mut self, vendor_path: impl Into<String>) -> Self {
        self.vendor_path = vendor_path.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Format name reported by transports created under this config
    pub fn format_name(&self) -> String {
        format!("webrtc/{}", self.vendor_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vendor_path.is_empty() || self.vendor_path.contains('/') {
            return Err(Error::Config(format!(
                "vendor path must be a single non-empty segment, got {:?}",
                self.vendor_path
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Immutable inputs of one negotiation
#[derive(Clone, PartialEq, Eq)]
pub struct SessionParameters {
    base_url: String,
    device_id: String,
    auth_token: String,
    channel: String,
    session_id: String,
}

impl SessionParameters {
    /// Empty device id or token is accepted; the bridge is the one to reject them.
    pub fn new(
        base_url: &str,
        device_id: impl Into<String>,
        auth_token: impl Into<String>,
        channel: impl Into<String>,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let device_id = device_id.into();
        let session_id = derive_session_id(&device_id, clock.unix_seconds());
        Ok(Self {
            base_url,
            device_id,
            auth_token: auth_token.into(),
            channel: channel.into(),
            session_id,
        })
    }

    /// Reads `device_id`, `auth_token` and `channel` out of a query string.
    /// Missing keys become empty strings.
    pub fn from_query(base_url: &str, query: &str, clock: &dyn Clock) -> Result<Self> {
        let mut device_id = String::new();
        let mut auth_token = String::new();
        let mut channel = String::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "device_id" => device_id = value.into_owned(),
                "auth_token" => auth_token = value.into_owned(),
                "channel" => channel = value.into_owned(),
                _ => {}
            }
        }
        Self::new(base_url, device_id, auth_token, channel, clock)
    }

    /// Splits a full source URL (`http://host:8123?device_id=..`) into base and query.
    pub fn from_source_url(source: &str, clock: &dyn Clock) -> Result<Self> {
        let mut url = Url::parse(source)?;
        let query = url.query().unwrap_or_default().to_string();
        url.set_query(None);
        url.set_fragment(None);
        Self::from_query(url.as_str(), &query, clock)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

// token stays out of logs
impl fmt::Debug for SessionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParameters")
            .field("base_url", &self.base_url)
            .field("device_id", &self.device_id)
            .field("auth_token", &"<redacted>")
            .field("channel", &self.channel)
            .field("session_id", &self.session_id)
            .finish()
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let parsed = Url::parse(base_url)?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(Error::Config(format!("unsupported base URL scheme: {other}"))),
    }
    if parsed.host_str().is_none() {
        return Err(Error::Config(format!("base URL has no host: {base_url}")));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::Config(format!(
            "base URL must not carry a query or fragment: {base_url}"
        )));
    }
    Ok(base_url.trim_end_matches('/').to_string())
}
