//! WebRTC signaling through an HTTP bridge.
//!
//! A session derives its id from the device id and the current second,
//! fetches ICE servers from the bridge, posts a size-trimmed complete offer
//! and applies the returned answer to a local peer connection.

pub mod config;
pub mod error;
pub mod logger;
pub mod peer;
pub mod sdp;
pub mod session;
pub mod signaling;
pub mod utils;

pub use config::{SessionParameters, SignalingConfig};
pub use error::{Error, Result};
pub use peer::{MediaEngine, MediaTransport, WebRtcEngine, WebRtcTransport};
pub use session::{NegotiatedSession, SessionState, SignalingSession};
pub use signaling::{HttpSignaling, SignalingApi};
pub use utils::{Clock, FixedClock, SystemClock};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Negotiates with the device behind `source`, a bridge URL carrying
/// `device_id`, `auth_token` and `channel` in its query string.
pub async fn dial(
    source: &str,
    config: SignalingConfig,
    cancel: CancellationToken,
) -> Result<NegotiatedSession<WebRtcTransport>> {
    config.validate()?;
    let params = SessionParameters::from_source_url(source, &SystemClock)?;
    let mut session = SignalingSession::over_http(params, Arc::new(WebRtcEngine::new()), config);
    session.negotiate_with_cancel(cancel).await
}
