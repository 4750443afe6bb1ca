#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::wildcard_imports
)]

use std::{error::Error, path::PathBuf, sync::Arc};

use masquerade_server::{
    config::ServerConfig,
    console::Console,
    identity::AdapterRegistry,
    server::GameServer,
    store::{JsonFileBackend, ProfileBackend, ProfileStore},
    texture::MojangTextureResolver,
};
use masquerade_shared::*;
use tokio::sync::oneshot;

fn abort_misconfig() -> ! {
    error!("aborting launch due to misconfiguration.");
    std::process::exit(1);
}

fn config_path() -> PathBuf {
    std::env::var("MASQUERADE_CONFIG").map_or_else(|_| PathBuf::from("masquerade.json"), PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // the logger has to exist before anything can be logged, so config errors go to stderr
    let config_path = config_path();
    let config = match ServerConfig::load_or_create(&config_path) {
        Ok(x) => x,
        Err(err) => {
            eprintln!("failed to load the config file ({}): {err}", config_path.display());
            eprintln!("hint: delete the file to have a default one created, or fix the syntax error");
            std::process::exit(1);
        }
    };

    let log_file = config.log_to_file.then(|| PathBuf::from("masquerade.log"));
    log::set_logger(Logger::instance("masquerade_server", log_file.as_deref()))?;

    if std::env::var("MASQUERADE_LESS_LOG").unwrap_or("0".to_string()) == "1" {
        log::set_max_level(LogLevelFilter::Warn);
    } else {
        log::set_max_level(if cfg!(debug_assertions) {
            LogLevelFilter::Trace
        } else {
            LogLevelFilter::Info
        });
    }

    info!("Loaded config from {}", config_path.display());

    let registry = AdapterRegistry::new(config.signed_texture_overrides());
    let adapter = match registry.bind(&config.server_version) {
        Ok(adapter) => {
            info!("Using identity adapter {} for {}", adapter.revision(), config.server_version);
            Some(adapter)
        }
        Err(err) => {
            error!("{err}");
            warn!("character profiles are disabled, players keep their own name and skin");
            None
        }
    };

    let backend = Arc::new(JsonFileBackend::new(&config.storage_path));
    let store = match backend.load() {
        Ok(Some(snapshot)) => {
            info!("Loaded {} profiles from {}", snapshot.profiles.len(), config.storage_path.display());
            ProfileStore::restore(snapshot, config.max_profiles_per_owner)
        }
        Ok(None) => ProfileStore::new(config.max_profiles_per_owner),
        Err(err) => {
            error!("failed to load profiles from {}: {err}", config.storage_path.display());
            warn!("hint: starting with an empty store would overwrite the file on the next save");
            abort_misconfig();
        }
    };

    let resolver = match MojangTextureResolver::new(&config.session_url, &config.api_url) {
        Ok(x) => Arc::new(x),
        Err(err) => {
            error!("failed to create the http client: {err}");
            abort_misconfig();
        }
    };

    let (server, handle) = GameServer::new(config, store, backend, adapter, resolver);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if Console::new(handle).run().await {
            let _ = stop_tx.send(());
        }
    });

    server
        .run(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = stop_rx => {}
            }
        })
        .await;

    Ok(())
}
