use anyhow::Context;
use tracing::{info, warn};

use shelfwatch_client::{CatalogClient, ClientConfig};
use shelfwatch_realtime::{ChannelConfig, RealtimeChannel};
use shelfwatch_view::{LiveList, ViewConfig, Viewport};

/// Geometry assumed for a headless run: a typical laptop window.
const HEADLESS_VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 800.0,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfwatch_observability::init();

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let client = CatalogClient::new(&config).context("failed to build HTTP client")?;

    if !client.check_connectivity().await {
        warn!(url = %config.api_url, "catalog service not reachable yet");
    }

    let channel = RealtimeChannel::connect(config.realtime_url.clone(), ChannelConfig::default());
    let list = LiveList::spawn(client, channel, ViewConfig::default(), HEADLESS_VIEWPORT);
    info!(api_url = %config.api_url, realtime_url = %config.realtime_url, "shelfwatch started");

    let mut snapshots = list.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for ctrl-c");
                }
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                info!(
                    items = snapshot.item_count(),
                    live = snapshot.live,
                    loading = snapshot.loading,
                    has_more = snapshot.has_more,
                    page = snapshot.current_page,
                    total_stock = snapshot.total_stock(),
                    error = snapshot.last_error.as_deref().unwrap_or(""),
                    "catalog list updated"
                );
            }
        }
    }

    info!("shutting down");
    list.shutdown().await;
    Ok(())
}
