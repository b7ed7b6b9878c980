// mcp-hub-proxy -- health
// Background health monitor.
//
// Every tick, probes all backends concurrently:
// - healthy + probe ok   → error counter reset
// - unhealthy + probe ok → one full re-harvest; healthy only if it succeeds
// - probe fails          → unhealthy, error counter bumped, nothing purged

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendEndpoint, BackendRecord};
use crate::harvest;
use crate::state::ProxyState;

/// Spawn the monitor. It stops when `cancel` fires; the first probe happens
/// one full interval after spawning, since `start` has just harvested.
pub fn spawn(state: Arc<ProxyState>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.config.health_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("health: started (interval={}ms)", period.as_millis());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = check_all(&state) => {}
                    }
                }
            }
        }

        tracing::info!("health: stopped");
    })
}

/// One monitor pass over every discovered backend.
pub async fn check_all(state: &ProxyState) {
    let backends = state.all_backends().await;
    if backends.is_empty() {
        return;
    }

    join_all(backends.iter().map(|b| check_backend(state, b))).await;

    let healthy = state.healthy_backends().await.len();
    if healthy == backends.len() {
        tracing::debug!("health: all {} backends healthy", healthy);
    } else {
        tracing::info!("health: {}/{} backends healthy", healthy, backends.len());
    }
}

async fn check_backend(state: &ProxyState, backend: &BackendEndpoint) {
    let was_healthy = state.is_healthy(&backend.name).await;

    match harvest::probe(state, backend).await {
        Ok(()) if was_healthy => {
            state.update(&backend.name, harvest::record_probe_ok).await;
        }
        Ok(()) => {
            tracing::info!("health: '{}' is back online, re-harvesting", backend.name);
            if let Err(e) = harvest::harvest(state, backend).await {
                tracing::warn!(
                    "health: '{}' answered probe but harvest failed: {}",
                    backend.name,
                    e
                );
            }
        }
        Err(e) => {
            state
                .update(&backend.name, |rec: &mut BackendRecord| {
                    rec.mark_down();
                    rec.touch();
                })
                .await;
            if was_healthy {
                tracing::warn!("health: '{}' is now offline: {}", backend.name, e);
            } else {
                tracing::debug!("health: '{}' still offline: {}", backend.name, e);
            }
        }
    }
}
