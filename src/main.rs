use tracing::info;

use corkboard::{Config, Database, WebServer};

#[tokio::main]
async fn main() {
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    if let Err(e) = corkboard::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        corkboard::logging::init_console_only(&config.logging.level);
    }

    info!("Corkboard - community bulletin board");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config, &db) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to configure web server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
