//! Long-running session simulator: loads persisted cookies into a fresh
//! browser each cycle, verifies login against the history page, runs a
//! time-boxed search-and-watch session, and re-persists cookies before the
//! daily cooldown.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ytsession::random::SystemRandom;
use ytsession::{Config, Simulator};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::default();
    info!(
        "simulator starting (headless: {}, store: {})",
        config.browser.headless,
        config.cookie_store.display()
    );

    let mut simulator = Simulator::new(config, Box::new(SystemRandom::new()));
    if let Err(e) = simulator.run().await {
        error!("simulator stopped: {}", e);
        std::process::exit(1);
    }
}
