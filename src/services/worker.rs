use crate::services::asset_service::AssetService;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically removes assets that were presigned but never confirmed.
pub struct BackgroundWorker {
    assets: Arc<AssetService>,
    interval: Duration,
    pending_ttl: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        assets: Arc<AssetService>,
        interval: Duration,
        pending_ttl: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            assets,
            interval,
            pending_ttl,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🚀 Background worker started (interval {:?}, pending TTL {:?})",
            self.interval,
            self.pending_ttl
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    pub async fn perform_cleanup(&self) -> usize {
        tracing::debug!("🧹 Collecting stale pending assets...");

        match self.assets.collect_stale_pending(self.pending_ttl).await {
            Ok(0) => 0,
            Ok(n) => {
                tracing::info!("✅ Collected {} stale pending assets", n);
                n
            }
            Err(e) => {
                tracing::error!("Pending asset collection failed: {}", e);
                0
            }
        }
    }
}
