//! The four-stage negotiation: identity, ICE discovery, offer exchange,
//! answer application.

use crate::config::{SessionParameters, SignalingConfig};
use crate::error::{Error, Result};
use crate::logger::dump_sdp;
use crate::peer::ice::{analyze_candidates, parse_ice_servers};
use crate::peer::{IceServerSet, MediaEngine, MediaTransport, TransportMeta, DEVICE_MEDIA_LINES};
use crate::sdp;
use crate::signaling::{HttpSignaling, SignalingApi};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

/// Lifecycle of a session. There is no way back from `Negotiated` or
/// `Failed`; a new negotiation needs a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    AwaitingIce,
    OfferSent,
    Negotiated,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::AwaitingIce => "awaiting_ice",
            SessionState::OfferSent => "offer_sent",
            SessionState::Negotiated => "negotiated",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful negotiation
#[derive(Debug)]
pub struct NegotiatedSession<T> {
    pub transport: T,
    pub session_id: String,
    pub ice_servers: IceServerSet,
    /// Offer as posted, after size reduction
    pub offer: String,
    pub answer: String,
}

/// One offer/answer round against the bridge.
///
/// The session owns its parameters and borrows the media engine through an
/// `Arc`; each run creates exactly one transport, one offer and applies one
/// answer.
pub struct SignalingSession<E: MediaEngine, S: SignalingApi = HttpSignaling> {
    params: SessionParameters,
    config: SignalingConfig,
    engine: Arc<E>,
    signaling: S,
    state: SessionState,
    local_offer: Option<String>,
    peer_answer: Option<String>,
}

impl<E: MediaEngine> SignalingSession<E, HttpSignaling> {
    /// Session talking to the bridge over HTTP
    pub fn over_http(params: SessionParameters, engine: Arc<E>, config: SignalingConfig) -> Self {
        let signaling = HttpSignaling::new(config.clone());
        Self::new(params, engine, signaling, config)
    }
}

impl<E: MediaEngine, S: SignalingApi> SignalingSession<E, S> {
    pub fn new(params: SessionParameters, engine: Arc<E>, signaling: S, config: SignalingConfig) -> Self {
        Self {
            params,
            config,
            engine,
            signaling,
            state: SessionState::Created,
            local_offer: None,
            peer_answer: None,
        }
    }

    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Trimmed offer, once it has been generated
    pub fn local_offer(&self) -> Option<&str> {
        self.local_offer.as_deref()
    }

    /// Answer text, once the bridge has returned it
    pub fn peer_answer(&self) -> Option<&str> {
        self.peer_answer.as_deref()
    }

    pub async fn negotiate(&mut self) -> Result<NegotiatedSession<E::Transport>> {
        self.negotiate_with_cancel(CancellationToken::new()).await
    }

    /// Runs all four stages. Cancelling the token aborts whichever network
    /// call or offer generation is in flight.
    pub async fn negotiate_with_cancel(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<NegotiatedSession<E::Transport>> {
        if self.state != SessionState::Created {
            return Err(Error::AlreadyStarted(self.state));
        }

        let span = info_span!(
            "signaling",
            session_id = %self.params.session_id(),
            device_id = %self.params.device_id()
        );
        let result = self.run(&cancel).instrument(span).await;

        match &result {
            Ok(_) => self.state = SessionState::Negotiated,
            Err(e) => {
                warn!(
                    session_id = %self.params.session_id(),
                    state = %self.state,
                    error = %e,
                    "Signaling session failed"
                );
                self.state = SessionState::Failed;
            }
        }
        result
    }

    async fn run(&mut self, cancel: &CancellationToken) -> Result<NegotiatedSession<E::Transport>> {
        self.state = SessionState::AwaitingIce;
        let ice_servers = self.discover_ice_servers(cancel).await?;

        let meta = TransportMeta::http_active(self.config.format_name(), self.params.base_url());
        let transport = self.engine.create_transport(&ice_servers, meta).await?;

        let offer = self.build_offer(&transport, cancel).await?;
        self.local_offer = Some(offer.clone());

        self.state = SessionState::OfferSent;
        let answer = cancellable(cancel, self.signaling.exchange_sdp(&self.params, &offer)).await?;
        self.peer_answer = Some(answer.clone());

        apply_answer(&transport, &answer).await?;
        info!("Negotiation complete");

        Ok(NegotiatedSession {
            transport,
            session_id: self.params.session_id().to_string(),
            ice_servers,
            offer,
            answer,
        })
    }

    async fn discover_ice_servers(&self, cancel: &CancellationToken) -> Result<IceServerSet> {
        let body = cancellable(cancel, self.signaling.get_ice_servers(&self.params)).await;

        match body.and_then(|body| parse_ice_servers(&body)) {
            Ok(servers) => {
                info!(servers = servers.len(), "ICE discovery finished");
                Ok(servers)
            }
            Err(Error::DiscoveryDegraded(reason)) => {
                warn!(%reason, "Continuing without ICE servers");
                Ok(IceServerSet::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn build_offer(&self, transport: &E::Transport, cancel: &CancellationToken) -> Result<String> {
        let full = cancellable(cancel, transport.create_complete_offer(&DEVICE_MEDIA_LINES)).await?;
        dump_sdp("OFFER", &full);
        analyze_candidates(&full);

        let trimmed = sdp::trim_extmap(&full);
        info!(
            before = full.len(),
            after = trimmed.len(),
            removed_lines = sdp::count_extmap_lines(&full),
            "Trimmed extmap attributes from offer"
        );

        if sdp::exceeds_budget(&trimmed, self.config.max_offer_bytes) {
            warn!(
                bytes = trimmed.len(),
                limit = self.config.max_offer_bytes,
                "Offer still exceeds the device payload limit"
            );
        }
        Ok(trimmed)
    }
}

/// Provisional first, then final, both with the same text
async fn apply_answer<T: MediaTransport>(transport: &T, answer: &str) -> Result<()> {
    if answer.trim().is_empty() {
        return Err(Error::Negotiation("bridge returned an empty answer".into()));
    }
    dump_sdp("ANSWER", answer);

    transport.accept_provisional_remote_description(answer).await?;
    transport.finalize_remote_description(answer).await?;
    Ok(())
}

async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}
