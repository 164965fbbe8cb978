use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::lobby::LobbyHandle;
use crate::rate_limit::IpRateLimiter;

/// Shared handles every connection task and HTTP handler needs. Cheap to
/// clone — everything behind an `Arc`, matching the teacher's `AppState`
/// shape.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub lobby: LobbyHandle,
    pub shutdown: CancellationToken,
    pub connection_count: Arc<AtomicUsize>,
    pub per_ip_connections: Arc<Mutex<HashMap<IpAddr, usize>>>,
    pub ws_rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, lobby: LobbyHandle, shutdown: CancellationToken) -> Self {
        let rate_limiter = Arc::new(IpRateLimiter::new(config.limits.ws_rate_limit_per_sec, config.limits.ws_rate_limit_per_sec));
        Self {
            config,
            lobby,
            shutdown,
            connection_count: Arc::new(AtomicUsize::new(0)),
            per_ip_connections: Arc::new(Mutex::new(HashMap::new())),
            ws_rate_limiter: rate_limiter,
        }
    }

    pub fn connections(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }

    /// Returns `false` (and leaves the counter untouched) once the
    /// configured connection limit is reached.
    pub fn try_acquire_connection_slot(&self) -> bool {
        loop {
            let current = self.connection_count.load(Ordering::Relaxed);
            if current >= self.config.limits.max_ws_connections {
                return false;
            }
            if self
                .connection_count
                .compare_exchange(current, current + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub fn release_connection_slot(&self) {
        self.connection_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Returns `false` once `ip` already holds `max_ws_per_ip` live
    /// connections, leaving the per-IP count untouched.
    pub async fn try_acquire_ip_slot(&self, ip: IpAddr) -> bool {
        let mut counts = self.per_ip_connections.lock().await;
        let count = counts.entry(ip).or_insert(0);
        if *count >= self.config.limits.max_ws_per_ip {
            return false;
        }
        *count += 1;
        true
    }

    pub async fn release_ip_slot(&self, ip: IpAddr) {
        let mut counts = self.per_ip_connections.lock().await;
        if let Some(count) = counts.get_mut(&ip) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&ip);
            }
        }
    }
}
