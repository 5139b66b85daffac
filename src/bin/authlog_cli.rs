use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

use authlog::config::Config;
use authlog::dispatch::{ensure_processed, LoginListener, LoginQueue, LoginWorker};
use authlog::factory::{AuthenticationLogFactory, StandardLogFactory};
use authlog::models::LoginParameters;
use authlog::persistence::{AuthLogStore, SqliteAuthLogStore};
use authlog::service::LoginService;

/// Login auditing command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "authlog", about = "Login auditing and new device notifications")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "authlog.toml")]
        output: PathBuf,
    },
    /// Validate a configuration file
    Check {
        /// Path to configuration file
        #[structopt(short, long, default_value = "authlog.toml")]
        config: PathBuf,
    },
    /// Record one successful login
    Record {
        /// Path to configuration file
        #[structopt(short, long, default_value = "authlog.toml")]
        config: PathBuf,
        /// Log factory kind
        #[structopt(short, long, default_value = "standard")]
        kind: String,
        /// Stable user identifier
        #[structopt(long)]
        user: String,
        /// Notification recipient address
        #[structopt(long)]
        email: Option<String>,
        /// Notification recipient display name
        #[structopt(long)]
        name: Option<String>,
        /// Client IP address
        #[structopt(long)]
        ip: Option<String>,
        /// Client user agent
        #[structopt(long)]
        user_agent: Option<String>,
    },
    /// Show recent logins for a user
    History {
        /// Path to configuration file
        #[structopt(short, long, default_value = "authlog.toml")]
        config: PathBuf,
        /// Log factory kind
        #[structopt(short, long, default_value = "standard")]
        kind: String,
        /// Stable user identifier
        #[structopt(long)]
        user: String,
        /// Number of entries to show
        #[structopt(short, long, default_value = "10")]
        limit: usize,
    },
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if !path.exists() {
        eprintln!("Configuration file not found: {:?}", path);
        eprintln!("Run 'authlog config' to generate a default configuration");
        std::process::exit(1);
    }
    let config = Config::from_file(path)?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Check { config } => {
            let config = load_config(&config)?;
            println!("Configuration is valid");
            println!("  Location provider: {:?}", config.location.provider);
            println!("  Async dispatch: {}", config.dispatch.async_enabled);
            println!(
                "  Sender: {} <{}>",
                config.transports.sender_name, config.transports.sender_email
            );
        }
        Cli::Record {
            config,
            kind,
            user,
            email,
            name,
            ip,
            user_agent,
        } => {
            let config = load_config(&config)?;
            let store: Arc<dyn AuthLogStore> =
                Arc::new(SqliteAuthLogStore::new(&config.storage.database_path)?);
            let factories: Vec<Arc<dyn AuthenticationLogFactory>> = config
                .storage
                .kinds
                .iter()
                .map(|k| {
                    Arc::new(StandardLogFactory::with_store(k.clone(), Arc::clone(&store)))
                        as Arc<dyn AuthenticationLogFactory>
                })
                .collect();
            let service = Arc::new(LoginService::from_config(&config, factories, Vec::new())?);

            let params = LoginParameters {
                factory_name: kind,
                user_identifier: user,
                to_email: email,
                to_email_name: name,
                client_ip: ip,
                user_agent,
            };

            let mut listener = LoginListener::new(Arc::clone(&service));
            if config.dispatch.async_enabled {
                let (queue, rx) = LoginQueue::channel(config.dispatch.queue_capacity);
                listener.set_queue(Some(queue));
                let worker = tokio::spawn(LoginWorker::new(service).run(rx));

                listener.on_login(params).await?;
                drop(listener);
                let processed = worker.await?;
                println!("Processed {} queued login(s)", processed);
                ensure_processed(1, processed)?;
            } else {
                listener.on_login(params).await?;
                println!("Login recorded");
            }
        }
        Cli::History {
            config,
            kind,
            user,
            limit,
        } => {
            let config = load_config(&config)?;
            let store = SqliteAuthLogStore::new(&config.storage.database_path)?;
            let logs = store.recent_logs(&kind, &user, limit)?;

            println!("{} login(s) for {} '{}':\n", logs.len(), kind, user);
            for log in &logs {
                println!(
                    "  {}  IP: {}  Location: {}  Agent: {}",
                    log.login_at.to_rfc3339(),
                    log.ip_address.as_deref().unwrap_or("-"),
                    log.location()
                        .map(|l| l.display_location())
                        .unwrap_or_else(|| "-".to_string()),
                    log.user_agent.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
