use crate::error::{Error, Result};
use crate::peer::types::{IceServer, IceServerSet};
use serde::Deserialize;
use tracing::{debug, warn};
use webrtc::ice_transport::ice_server::RTCIceServer;

/// Bridges answer either with a bare list or with a browser-style
/// `{"iceServers": [...]}` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum IceServersBody {
    List(Vec<IceServer>),
    Wrapped {
        #[serde(rename = "iceServers")]
        ice_servers: Vec<IceServer>,
    },
}

/// Parses the discovery response body.
///
/// Any failure comes back as [`Error::DiscoveryDegraded`] so the caller can
/// keep going without servers.
pub fn parse_ice_servers(body: &[u8]) -> Result<IceServerSet> {
    let parsed: IceServersBody = serde_json::from_slice(body)
        .map_err(|e| Error::DiscoveryDegraded(format!("unreadable ICE server list: {e}")))?;

    let servers = match parsed {
        IceServersBody::List(servers) => servers,
        IceServersBody::Wrapped { ice_servers } => ice_servers,
    };

    let set = IceServerSet(servers.into_iter().filter(|s| !s.urls.is_empty()).collect());
    debug!(
        servers = set.len(),
        relays = set.relay_count(),
        "Parsed ICE server list"
    );
    Ok(set)
}

/// Converts discovered servers into webrtc-rs configuration entries
pub fn to_rtc_ice_servers(servers: &IceServerSet) -> Vec<RTCIceServer> {
    servers
        .iter()
        .map(|server| RTCIceServer {
            urls: server.urls.clone(),
            username: server.username.clone().unwrap_or_default(),
            credential: server.credential.clone().unwrap_or_default(),
        })
        .collect()
}

/// Candidate counts embedded in a complete offer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateSummary {
    pub host: usize,
    pub srflx: usize,
    pub relay: usize,
}

impl CandidateSummary {
    pub fn total(&self) -> usize {
        self.host + self.srflx + self.relay
    }
}

pub fn analyze_candidates(sdp: &str) -> CandidateSummary {
    let mut summary = CandidateSummary::default();

    for line in sdp.lines().filter(|l| l.starts_with("a=candidate:")) {
        if line.contains("typ host") {
            summary.host += 1;
        } else if line.contains("typ srflx") {
            summary.srflx += 1;
        } else if line.contains("typ relay") {
            summary.relay += 1;
        }
    }

    debug!(
        host = summary.host,
        srflx = summary.srflx,
        relay = summary.relay,
        "Candidate analysis"
    );

    if summary.total() == 0 {
        warn!("Offer carries no ICE candidates, the device will not be able to reach us");
    }
    summary
}
