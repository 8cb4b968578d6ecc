use crate::error::{Error, Result};
use crate::peer::engine::{MediaEngine, MediaTransport};
use crate::peer::ice::to_rtc_ice_servers;
use crate::peer::types::{IceServerSet, MediaDirection, MediaKind, MediaLine, TransportMeta};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine as RtcMediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use webrtc::peer_connection::{
    configuration::RTCConfiguration, peer_connection_state::RTCPeerConnectionState,
    sdp::session_description::RTCSessionDescription, RTCPeerConnection,
};
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

/// Media engine backed by webrtc-rs. Each transport gets its own API
/// instance, so concurrent sessions share nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcEngine;

impl WebRtcEngine {
    pub fn new() -> Self {
        Self
    }

    fn build_api() -> Result<API> {
        let mut media_engine = RtcMediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        Ok(APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build())
    }
}

/// Peer connection config: discovered servers, one bundled transport
fn rtc_config(ice_servers: &IceServerSet) -> RTCConfiguration {
    RTCConfiguration {
        ice_servers: to_rtc_ice_servers(ice_servers),
        bundle_policy: RTCBundlePolicy::MaxBundle,
        rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
        ..Default::default()
    }
}

#[async_trait]
impl MediaEngine for WebRtcEngine {
    type Transport = WebRtcTransport;

    async fn create_transport(
        &self,
        ice_servers: &IceServerSet,
        meta: TransportMeta,
    ) -> Result<WebRtcTransport> {
        let api = Self::build_api()?;
        let pc = Arc::new(api.new_peer_connection(rtc_config(ice_servers)).await?);

        let format_name = meta.format_name.clone();
        pc.on_ice_gathering_state_change(Box::new(move |state| {
            debug!("ICE gathering state changed to: {:?}", state);
            Box::pin(async {})
        }));
        pc.on_peer_connection_state_change(Box::new(move |st: RTCPeerConnectionState| {
            info!(format = %format_name, "Peer connection state changed to: {}", st);
            Box::pin(async {})
        }));

        info!(
            format = %meta.format_name,
            protocol = %meta.protocol,
            mode = %meta.mode,
            ice_servers = ice_servers.len(),
            "Created peer connection"
        );

        Ok(WebRtcTransport {
            pc,
            meta,
            ready: AtomicBool::new(false),
        })
    }
}

/// A webrtc-rs peer connection plus the bookkeeping the session needs
pub struct WebRtcTransport {
    pc: Arc<RTCPeerConnection>,
    meta: TransportMeta,
    ready: AtomicBool,
}

impl WebRtcTransport {
    /// Underlying peer connection, for attaching track handlers
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }

    /// True once the final answer has been applied
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub async fn close(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);
        self.pc.close().await?;
        Ok(())
    }
}

fn codec_type(kind: MediaKind) -> RTPCodecType {
    match kind {
        MediaKind::Audio => RTPCodecType::Audio,
        MediaKind::Video => RTPCodecType::Video,
    }
}

fn transceiver_direction(direction: MediaDirection) -> RTCRtpTransceiverDirection {
    match direction {
        MediaDirection::SendRecv => RTCRtpTransceiverDirection::Sendrecv,
        MediaDirection::SendOnly => RTCRtpTransceiverDirection::Sendonly,
        MediaDirection::RecvOnly => RTCRtpTransceiverDirection::Recvonly,
    }
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    fn meta(&self) -> &TransportMeta {
        &self.meta
    }

    async fn create_complete_offer(&self, medias: &[MediaLine]) -> Result<String> {
        for media in medias {
            self.pc
                .add_transceiver_from_kind(
                    codec_type(media.kind),
                    Some(RTCRtpTransceiverInit {
                        direction: transceiver_direction(media.direction),
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }

        let offer = self.pc.create_offer(None).await?;

        // subscribe before SetLocalDescription starts gathering
        let mut gather_complete = self.pc.gathering_complete_promise().await;
        self.pc.set_local_description(offer).await?;
        let _ = gather_complete.recv().await;

        let local = self
            .pc
            .local_description()
            .await
            .ok_or_else(|| Error::Negotiation("no local description after ICE gathering".into()))?;
        Ok(local.sdp)
    }

    async fn accept_provisional_remote_description(&self, sdp: &str) -> Result<()> {
        let desc = RTCSessionDescription::pranswer(sdp.to_owned())?;
        self.pc.set_remote_description(desc).await?;
        debug!("Provisional answer applied");
        Ok(())
    }

    async fn finalize_remote_description(&self, sdp: &str) -> Result<()> {
        let desc = RTCSessionDescription::answer(sdp.to_owned())?;
        self.pc.set_remote_description(desc).await?;
        self.ready.store(true, Ordering::SeqCst);
        debug!("Final answer applied, transport ready for media");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::types::DEVICE_MEDIA_LINES;
    use crate::sdp::trim_extmap;
    use webrtc::peer_connection::signaling_state::RTCSignalingState;

    fn meta() -> TransportMeta {
        TransportMeta::http_active("webrtc/xtend_tuya", "http://host")
    }

    #[tokio::test]
    async fn complete_offer_has_device_media_lines() {
        let transport = WebRtcEngine::new()
            .create_transport(&IceServerSet::default(), meta())
            .await
            .unwrap();

        let offer = transport.create_complete_offer(&DEVICE_MEDIA_LINES).await.unwrap();
        let audio = offer.find("m=audio").expect("audio m-line");
        let video = offer.find("m=video").expect("video m-line");
        assert!(audio < video);
        assert!(offer[audio..video].contains("a=sendrecv"));
        assert!(offer[video..].contains("a=recvonly"));
        assert!(!transport.is_ready());
        assert_eq!(transport.meta().protocol, "http");

        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_answer_is_negotiation_error() {
        let transport = WebRtcEngine::new()
            .create_transport(&IceServerSet::default(), meta())
            .await
            .unwrap();

        let err = transport
            .accept_provisional_remote_description("this is not sdp")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Negotiation(_)));
        assert!(!transport.is_ready());
    }

    /// Plays the device side: answers `offer` from a second local peer
    async fn answer_from_remote_peer(remote: &WebRtcTransport, offer: &str) -> String {
        let pc = remote.peer_connection();
        pc.set_remote_description(RTCSessionDescription::offer(offer.to_owned()).unwrap())
            .await
            .unwrap();
        let answer = pc.create_answer(None).await.unwrap();
        let mut gather_complete = pc.gathering_complete_promise().await;
        pc.set_local_description(answer).await.unwrap();
        let _ = gather_complete.recv().await;
        pc.local_description().await.unwrap().sdp
    }

    #[tokio::test]
    async fn provisional_then_final_answer_reaches_stable() {
        let engine = WebRtcEngine::new();
        let local = engine.create_transport(&IceServerSet::default(), meta()).await.unwrap();
        let remote = engine.create_transport(&IceServerSet::default(), meta()).await.unwrap();

        let offer = trim_extmap(&local.create_complete_offer(&DEVICE_MEDIA_LINES).await.unwrap());
        assert_eq!(local.peer_connection().signaling_state(), RTCSignalingState::HaveLocalOffer);
        let answer = answer_from_remote_peer(&remote, &offer).await;

        local.accept_provisional_remote_description(&answer).await.unwrap();
        assert_eq!(local.peer_connection().signaling_state(), RTCSignalingState::HaveRemotePranswer);
        assert!(!local.is_ready());

        local.finalize_remote_description(&answer).await.unwrap();
        assert_eq!(local.peer_connection().signaling_state(), RTCSignalingState::Stable);
        assert!(local.is_ready());

        local.close().await.unwrap();
        remote.close().await.unwrap();
        assert!(!local.is_ready());
    }
}
