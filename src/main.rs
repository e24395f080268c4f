use cms_router::config::{self, Config};
use cms_router::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;
    if let Err(e) = cfg.validate() {
        logger::log_error(&format!("Invalid configuration: {e}"));
        return Err(e.into());
    }

    // Build the runtime explicitly so the worker count comes from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    if let Err(e) = runtime.block_on(server::run(cfg)) {
        logger::log_error(&format!("Startup failed: {e}"));
        return Err(e.into());
    }
    Ok(())
}
