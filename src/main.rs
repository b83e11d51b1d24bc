use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;
mod store;

use store::{Store, Table};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    let store = Store::open(&cfg.storage.database_path).await;
    let task_count = store.len(Table::Tasks).await;
    logger::log_server_start(&listener.local_addr()?, &cfg, task_count);

    let state = Arc::new(config::AppState::new(cfg, store));
    for route in state.router.routes() {
        logger::log_debug(&format!("[Router] {} {}", route.method, route.pattern.template()));
    }
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, Arc::clone(&state), shutdown))
        .await?;

    state.store.flush().await;
    logger::log_shutdown_complete();
    Ok(())
}
