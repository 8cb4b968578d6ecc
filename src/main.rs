use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use xtend_signal::{dial, logger, SignalingConfig};

/// Negotiate a WebRTC session with a bridged camera and hold it open
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Bridge URL with device_id, auth_token and channel in the query string
    #[arg(env = "BRIDGE_SOURCE_URL")]
    source: String,

    /// Per-request timeout for the bridge calls
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path segment under /api/ that hosts the bridge services
    #[arg(long)]
    vendor_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logging();
    let args = Args::parse();

    let mut config = SignalingConfig::from_env().context("invalid bridge configuration")?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(path) = args.vendor_path {
        config = config.with_vendor_path(path);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let negotiated = dial(&args.source, config, cancel.clone())
        .await
        .context("negotiation failed")?;
    info!(
        session_id = %negotiated.session_id,
        offer_bytes = negotiated.offer.len(),
        answer_bytes = negotiated.answer.len(),
        "Session negotiated, press Ctrl-C to hang up"
    );

    cancel.cancelled().await;
    negotiated.transport.close().await?;
    Ok(())
}
