// Server module entry
// Binds the listener, installs signal handling and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;
use tokio::sync::Notify;

use crate::config::{AppState, Config};
use crate::logger;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;

/// Run the service until SIGINT/SIGTERM
pub async fn run(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr).map_err(|e| {
        logger::error(&format!("Failed to bind {addr}: {e}"));
        e
    })?;

    let state = Arc::new(AppState::new(&cfg));
    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    logger::log_server_start(&addr, &cfg);
    start_server_loop(listener, state, shutdown).await?;
    Ok(())
}
