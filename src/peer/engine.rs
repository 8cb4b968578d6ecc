use crate::error::Result;
use crate::peer::types::{IceServerSet, MediaLine, TransportMeta};
use async_trait::async_trait;

/// Factory for local media transports.
///
/// Implementations must be safe to call concurrently: every session gets
/// its own transport object.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    type Transport: MediaTransport + 'static;

    async fn create_transport(
        &self,
        ice_servers: &IceServerSet,
        meta: TransportMeta,
    ) -> Result<Self::Transport>;
}

/// The narrow contract a signaling session drives a peer connection through
#[async_trait]
pub trait MediaTransport: Send + Sync {
    fn meta(&self) -> &TransportMeta;

    /// Offer with ICE gathering already complete and all candidates inline
    async fn create_complete_offer(&self, medias: &[MediaLine]) -> Result<String>;

    /// Applies the answer as `pranswer`, without committing final state
    async fn accept_provisional_remote_description(&self, sdp: &str) -> Result<()>;

    /// Applies the same answer as final and marks the transport ready for media
    async fn finalize_remote_description(&self, sdp: &str) -> Result<()>;
}
