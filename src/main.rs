mod config;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::resolve_config_path(
        std::env::args().nth(1),
        std::env::var(config::CONFIG_PATH_ENV).ok(),
    );

    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Size the runtime from server.workers, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(server::run(cfg))
}
