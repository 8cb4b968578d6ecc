//! HTTP calls against the signaling bridge.
//!
//! Two services live under `<base>/api/<vendor-path>/`:
//! `webrtc_get_ice_servers` (GET, JSON) and `webrtc_sdp_exchange`
//! (POST, `application/sdp`). Both take the bearer token.

use crate::config::{SessionParameters, SignalingConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const ICE_SERVERS_SERVICE: &str = "webrtc_get_ice_servers";
pub const SDP_EXCHANGE_SERVICE: &str = "webrtc_sdp_exchange";
pub const MIME_JSON: &str = "application/json";
pub const MIME_SDP: &str = "application/sdp";

/// The two round trips a session makes to the bridge
#[async_trait]
pub trait SignalingApi: Send + Sync {
    /// Raw ICE server list body. Any non-2xx status, including 401/403,
    /// comes back as [`Error::DiscoveryDegraded`].
    async fn get_ice_servers(&self, params: &SessionParameters) -> Result<Bytes>;

    /// Posts the offer and returns the answer text verbatim
    async fn exchange_sdp(&self, params: &SessionParameters, offer: &str) -> Result<String>;
}

/// [`SignalingApi`] over reqwest. A fresh client is built for every call and
/// dropped with it.
#[derive(Debug, Clone)]
pub struct HttpSignaling {
    config: SignalingConfig,
}

impl HttpSignaling {
    pub fn new(config: SignalingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalingConfig {
        &self.config
    }

    fn service_url(&self, params: &SessionParameters, service: &str) -> Result<Url> {
        let url = format!(
            "{}/api/{}/{}",
            params.base_url(),
            self.config.vendor_path,
            service
        );
        Ok(Url::parse(&url)?)
    }

    pub fn ice_servers_url(&self, params: &SessionParameters) -> Result<Url> {
        let mut url = self.service_url(params, ICE_SERVERS_SERVICE)?;
        url.query_pairs_mut()
            .append_pair("device_id", params.device_id())
            .append_pair("session_id", params.session_id())
            .append_pair("format", &self.config.ice_format);
        Ok(url)
    }

    pub fn sdp_exchange_url(&self, params: &SessionParameters) -> Result<Url> {
        let mut url = self.service_url(params, SDP_EXCHANGE_SERVICE)?;
        url.query_pairs_mut()
            .append_pair("device_id", params.device_id())
            .append_pair("session_id", params.session_id())
            .append_pair("channel", params.channel());
        Ok(url)
    }

    fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
    }
}

fn http_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout)
    } else if err.is_builder() {
        Error::Config(err.to_string())
    } else {
        Error::Transport(err.to_string())
    }
}

#[async_trait]
impl SignalingApi for HttpSignaling {
    async fn get_ice_servers(&self, params: &SessionParameters) -> Result<Bytes> {
        let url = self.ice_servers_url(params)?;
        let timeout = self.config.request_timeout();
        debug!(%url, "Requesting ICE servers");

        let client = self.client()?;
        let resp = client
            .get(url)
            .header(CONTENT_TYPE, MIME_JSON)
            .bearer_auth(params.auth_token())
            .send()
            .await
            .map_err(|e| http_error(e, timeout))?;

        // A rejected token only fails the session at the exchange
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| http_error(e, timeout))?;
        if !status.is_success() {
            return Err(Error::DiscoveryDegraded(format!(
                "ICE server request returned status {}",
                status
            )));
        }

        info!(bytes = body.len(), "Received ICE server list");
        Ok(body)
    }

    async fn exchange_sdp(&self, params: &SessionParameters, offer: &str) -> Result<String> {
        let url = self.sdp_exchange_url(params)?;
        let timeout = self.config.request_timeout();
        debug!(%url, offer_bytes = offer.len(), "Posting SDP offer");

        let client = self.client()?;
        let resp = client
            .post(url)
            .header(CONTENT_TYPE, MIME_SDP)
            .bearer_auth(params.auth_token())
            .body(offer.to_owned())
            .send()
            .await
            .map_err(|e| http_error(e, timeout))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| http_error(e, timeout))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(bytes = body.len(), "Received SDP answer");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FixedClock;

    fn params() -> SessionParameters {
        SessionParameters::new("http://host", "cam1", "tok123", "0", &FixedClock(1_700_000_000)).unwrap()
    }

    #[test]
    fn ice_servers_url_carries_session() {
        let signaling = HttpSignaling::new(SignalingConfig::default());
        let url = signaling.ice_servers_url(&params()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://host/api/xtend_tuya/webrtc_get_ice_servers?device_id=cam1&session_id=cam11700000000&format=GO2RTC"
        );
    }

    #[test]
    fn sdp_exchange_url_carries_channel() {
        let signaling = HttpSignaling::new(SignalingConfig::default());
        let url = signaling.sdp_exchange_url(&params()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://host/api/xtend_tuya/webrtc_sdp_exchange?device_id=cam1&session_id=cam11700000000&channel=0"
        );
    }

    #[test]
    fn base_path_and_vendor_are_respected() {
        let signaling = HttpSignaling::new(SignalingConfig::default().with_vendor_path("bridge"));
        let params =
            SessionParameters::new("https://ha.local:8123/prefix/", "d 1", "t", "2", &FixedClock(9)).unwrap();
        let url = signaling.sdp_exchange_url(&params).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ha.local:8123/prefix/api/bridge/webrtc_sdp_exchange?device_id=d+1&session_id=d+19&channel=2"
        );
    }
}
