//! Runs the artifact persistence service.
//!
//! Listen address and body limit come from `ARTIFACT_SYNC_HOST`,
//! `ARTIFACT_SYNC_PORT` and `ARTIFACT_SYNC_BODY_LIMIT`; log filtering from
//! `RUST_LOG` (default `artifact_sync=info`).

use artifact_sync::server::{self, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> artifact_sync::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("artifact_sync=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(addr = %config.addr(), body_limit = config.body_limit, "starting artifact server");
    server::serve(config).await
}
