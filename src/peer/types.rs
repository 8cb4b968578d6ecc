use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One STUN/TURN server as handed out by the bridge
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Ordered ICE server list for one session. Empty is valid (degraded).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct IceServerSet(pub Vec<IceServer>);

impl IceServerSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IceServer> {
        self.0.iter()
    }

    /// Servers with at least one `turn:`/`turns:` url
    pub fn relay_count(&self) -> usize {
        self.iter()
            .filter(|s| s.urls.iter().any(|u| u.starts_with("turn:") || u.starts_with("turns:")))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
}

/// One m-line requested from the media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLine {
    pub kind: MediaKind,
    pub direction: MediaDirection,
}

/// The device sends video and optionally receives audio. Changing this
/// breaks the bridge's capability contract.
pub const DEVICE_MEDIA_LINES: [MediaLine; 2] = [
    MediaLine {
        kind: MediaKind::Audio,
        direction: MediaDirection::SendRecv,
    },
    MediaLine {
        kind: MediaKind::Video,
        direction: MediaDirection::RecvOnly,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// We dial out and pull media from the device
    ActiveProducer,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::ActiveProducer => f.write_str("active_producer"),
        }
    }
}

/// Observability tags attached to a transport. No behavioral effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMeta {
    pub format_name: String,
    pub protocol: String,
    pub mode: TransportMode,
    pub url: String,
}

impl TransportMeta {
    /// Outbound transport signaled over HTTP
    pub fn http_active(format_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            protocol: "http".to_string(),
            mode: TransportMode::ActiveProducer,
            url: url.into(),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}
