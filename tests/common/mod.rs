#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use xtend_signal::peer::{IceServerSet, MediaLine, TransportMeta};
use xtend_signal::{Error, MediaEngine, MediaTransport, Result, SessionParameters, SignalingApi};

pub const OFFER: &str = "v=0\r\n\
o=- 4215775240449105457 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0 1\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n\
a=mid:0\r\n\
a=rtpmap:111 opus/48000/2\r\n\
a=sendrecv\r\n\
a=candidate:1 1 udp 2130706431 192.168.1.2 50000 typ host\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=extmap:2 http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time\r\n\
a=extmap:3 urn:3gpp:video-orientation\r\n\
a=mid:1\r\n\
a=rtpmap:96 H264/90000\r\n\
a=recvonly\r\n";

pub const TRIMMED_OFFER: &str = "v=0\r\n\
o=- 4215775240449105457 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0 1\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=mid:0\r\n\
a=rtpmap:111 opus/48000/2\r\n\
a=sendrecv\r\n\
a=candidate:1 1 udp 2130706431 192.168.1.2 50000 typ host\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=mid:1\r\n\
a=rtpmap:96 H264/90000\r\n\
a=recvonly\r\n";

pub const ANSWER: &str = "v=0\r\n\
o=- 1 1 IN IP4 10.0.0.9\r\n\
s=-\r\n\
t=0 0\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
a=recvonly\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=sendonly\r\n";

pub const TS: i64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(IceServerSet, TransportMeta),
    Offer(Vec<MediaLine>),
    Provisional(String),
    Final(String),
}

/// In-process media engine that records every call
#[derive(Default)]
pub struct FakeEngine {
    pub events: Arc<Mutex<Vec<Event>>>,
    pub fail_provisional: bool,
}

impl FakeEngine {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn answers_applied(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Provisional(_) | Event::Final(_)))
            .count()
    }
}

#[derive(Debug)]
pub struct FakeTransport {
    meta: TransportMeta,
    events: Arc<Mutex<Vec<Event>>>,
    fail_provisional: bool,
}

#[async_trait]
impl MediaEngine for FakeEngine {
    type Transport = FakeTransport;

    async fn create_transport(&self, ice_servers: &IceServerSet, meta: TransportMeta) -> Result<FakeTransport> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Created(ice_servers.clone(), meta.clone()));
        Ok(FakeTransport {
            meta,
            events: self.events.clone(),
            fail_provisional: self.fail_provisional,
        })
    }
}

#[async_trait]
impl MediaTransport for FakeTransport {
    fn meta(&self) -> &TransportMeta {
        &self.meta
    }

    async fn create_complete_offer(&self, medias: &[MediaLine]) -> Result<String> {
        self.events.lock().unwrap().push(Event::Offer(medias.to_vec()));
        Ok(OFFER.to_string())
    }

    async fn accept_provisional_remote_description(&self, sdp: &str) -> Result<()> {
        if self.fail_provisional {
            return Err(Error::Negotiation("rejected pranswer".into()));
        }
        self.events.lock().unwrap().push(Event::Provisional(sdp.to_string()));
        Ok(())
    }

    async fn finalize_remote_description(&self, sdp: &str) -> Result<()> {
        self.events.lock().unwrap().push(Event::Final(sdp.to_string()));
        Ok(())
    }
}

/// Bridge double with canned replies
pub struct ScriptedSignaling {
    pub ice_reply: fn() -> Result<Bytes>,
    pub exchange_reply: fn() -> Result<String>,
    pub hang_discovery: bool,
    pub calls: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl ScriptedSignaling {
    pub fn new(ice_reply: fn() -> Result<Bytes>, exchange_reply: fn() -> Result<String>) -> Self {
        Self {
            ice_reply,
            exchange_reply,
            hang_discovery: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalingApi for ScriptedSignaling {
    async fn get_ice_servers(&self, params: &SessionParameters) -> Result<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .push(("ice", params.session_id().to_string()));
        if self.hang_discovery {
            return std::future::pending().await;
        }
        (self.ice_reply)()
    }

    async fn exchange_sdp(&self, params: &SessionParameters, offer: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(("exchange", params.session_id().to_string()));
        assert_eq!(offer, TRIMMED_OFFER);
        (self.exchange_reply)()
    }
}
