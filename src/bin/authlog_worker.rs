use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use authlog::config::Config;
use authlog::dispatch::{LoginQueue, LoginWorker};
use authlog::events::{EventObserver, StoreObserver};
use authlog::factory::{AuthenticationLogFactory, StandardLogFactory};
use authlog::models::LoginParameters;
use authlog::persistence::{AuthLogStore, SqliteAuthLogStore};
use authlog::service::LoginService;

/// Queue worker: reads one JSON-encoded login per line on stdin
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting authlog worker...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("authlog.toml"));

    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        log::warn!("Config file not found, using defaults");
        Config::default()
    };
    config.validate()?;

    // Plain factories; the store observer takes responsibility for every login
    let store: Arc<dyn AuthLogStore> =
        Arc::new(SqliteAuthLogStore::new(&config.storage.database_path)?);
    let factories: Vec<Arc<dyn AuthenticationLogFactory>> = config
        .storage
        .kinds
        .iter()
        .map(|kind| {
            Arc::new(StandardLogFactory::new(kind.clone())) as Arc<dyn AuthenticationLogFactory>
        })
        .collect();
    let observers: Vec<Arc<dyn EventObserver>> = vec![Arc::new(StoreObserver::new(store))];

    let service = Arc::new(LoginService::from_config(&config, factories, observers)?);
    let (queue, rx) = LoginQueue::channel(config.dispatch.queue_capacity);
    let worker = tokio::spawn(LoginWorker::new(service).run(rx));

    log::info!("Reading logins from stdin, one JSON object per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LoginParameters>(&line) {
                    Ok(params) => queue.enqueue(params).await?,
                    Err(e) => log::warn!("Skipping malformed login message: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received shutdown signal, draining queue...");
                break;
            }
        }
    }

    drop(queue);
    let processed = worker.await?;
    log::info!("authlog worker stopped, {} login(s) processed", processed);
    Ok(())
}
