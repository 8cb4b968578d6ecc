pub mod connection;
pub mod engine;
pub mod ice;
pub mod types;

pub use connection::{WebRtcEngine, WebRtcTransport};
pub use engine::{MediaEngine, MediaTransport};
pub use ice::{analyze_candidates, parse_ice_servers, CandidateSummary};
pub use types::{
    IceServer, IceServerSet, MediaDirection, MediaKind, MediaLine, TransportMeta, TransportMode,
    DEVICE_MEDIA_LINES,
};
