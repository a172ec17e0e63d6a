use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use guestboard::config::DEFAULT_ADMIN_TOKEN;
use guestboard::{App, Config, Server, Store};

#[tokio::main]
async fn main() -> Result<(), guestboard::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();

    let store = Store::open(&config.db_path)?;
    info!(
        static_root = %config.public_dir.display(),
        db = %config.db_path.display(),
        max_body_mb = config.max_body_mb,
        admin_open = config.admin_token.is_empty(),
        "starting"
    );
    if config.admin_token == DEFAULT_ADMIN_TOKEN {
        warn!("ADMIN_TOKEN is the built-in default; set a real secret");
    }

    let app = App::from_config(&config, store);
    Server::bind(config.bind_addr()).serve(app).await
}
