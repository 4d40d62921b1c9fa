// Server loop module
// Accepts connections until shutdown is signalled, then drains in-flight work

use hyper_util::server::graceful::GracefulShutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` is notified.
///
/// After the signal the listener is closed, readiness starts reporting
/// 503, idle keep-alive connections are closed and requests still in
/// flight get `performance.shutdown_grace` seconds to complete.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state, &graceful),
                    Err(e) => logger::error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => {
                logger::info(&format!("Shutdown requested, closing listener on {local_addr}"));
                break;
            }
        }
    }

    state.begin_shutdown();
    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    let deadline = Instant::now() + grace;

    // Signals every watched connection, then waits for them to finish
    let closed = tokio::time::timeout_at(deadline, graceful.shutdown()).await.is_ok();
    // Counters are released just after each connection future completes
    let remaining = deadline.saturating_duration_since(Instant::now());
    if closed && drain_connections(&state, remaining).await {
        logger::info("All connections closed, server stopped");
    } else {
        logger::warn(&format!(
            "Grace period of {}s elapsed with {} connection(s) still open, stopping anyway",
            grace.as_secs(),
            state.connection_count()
        ));
    }

    Ok(())
}

/// Wait for the active connection count to reach zero; false if `grace` ran out first
async fn drain_connections(state: &AppState, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;

    loop {
        let active = state.connection_count();
        if active == 0 {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        logger::debug(&format!("Draining {active} connection(s)"));
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let state = AppState::new(&Config::load_from_toml("").unwrap());
        assert!(drain_connections(&state, Duration::ZERO).await);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let state = AppState::new(&Config::load_from_toml("").unwrap());
        state.active_connections.fetch_add(1, Ordering::SeqCst);
        assert!(!drain_connections(&state, Duration::from_millis(120)).await);
    }
}
