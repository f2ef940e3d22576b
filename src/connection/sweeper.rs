//! Idle Store Sweeper
//!
//! A background task that periodically drops per-client stores whose client
//! has gone quiet. Datagram peers rarely announce that they are leaving, so
//! without this the registry would keep one store per source port forever.
//!
//! The sweeper wakes every `idle_timeout / 2` (at least every 10ms), so a
//! store is dropped between one and one and a half timeouts after its
//! client's last request.

use crate::connection::registry::StoreRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Shortest pause between sweeps.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// A handle to the running sweeper.
///
/// When this handle is dropped, the sweeper task stops.
#[derive(Debug)]
pub struct IdleSweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl IdleSweeper {
    /// Starts sweeping `registry` for clients idle longer than `idle_timeout`.
    pub fn start(registry: Arc<StoreRegistry>, idle_timeout: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let interval = (idle_timeout / 2).max(MIN_SWEEP_INTERVAL);

        tokio::spawn(sweeper_loop(registry, idle_timeout, interval, shutdown_rx));
        info!(idle_timeout = ?idle_timeout, "Idle store sweeper started");

        Self { shutdown_tx }
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for IdleSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    registry: Arc<StoreRegistry>,
    idle_timeout: Duration,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Idle store sweeper stopped");
                    return;
                }
            }
        }

        let evicted = registry.evict_idle(idle_timeout);
        if evicted > 0 {
            debug!(
                evicted = evicted,
                remaining = registry.client_count(),
                "Dropped idle client stores"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreScope;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_sweeper_drops_quiet_clients() {
        let registry = Arc::new(StoreRegistry::new(StoreScope::PerClient));
        for port in 1..=100 {
            registry.acquire(addr(port));
        }

        let _sweeper = IdleSweeper::start(Arc::clone(&registry), Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(registry.client_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_sweeper_stops() {
        let registry = Arc::new(StoreRegistry::new(StoreScope::PerClient));

        let sweeper = IdleSweeper::start(Arc::clone(&registry), Duration::from_millis(20));
        drop(sweeper);
        tokio::time::sleep(Duration::from_millis(20)).await;

        registry.acquire(addr(1));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(registry.client_count(), 1);
    }
}
