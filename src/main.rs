use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sermon_feed::board::FeedPoller;
use sermon_feed::config::Config;
use sermon_feed::feed::FeedClient;
use sermon_feed::focal::{FocalPoint, Rect};
use sermon_feed::server::{self, AppState};

/// Get the default config file path (~/.config/sermon-feed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("sermon-feed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "sermon-feed",
    about = "Serves a church YouTube channel's videos as normalized JSON"
)]
struct Args {
    /// Config file (defaults to ~/.config/sermon-feed/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP endpoint (default)
    Serve {
        /// Override `bind_addr` from the config file
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Fetch one channel's feed and print the JSON result
    Fetch {
        /// Channel identifier, e.g. UC...
        channel_id: String,
    },
    /// Convert a pointer position inside an image to a CSS focal point
    Focal {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long, default_value_t = 0.0)]
        left: f64,
        #[arg(long, default_value_t = 0.0)]
        top: f64,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn feed_client(config: &Config) -> Result<FeedClient> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("sermon-feed/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    Ok(FeedClient::new(http, config.feed_base()?)
        .with_timeout(config.request_timeout())
        .with_max_feed_size(config.max_feed_size_bytes))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}

async fn run_server(config: Config, bind: Option<String>) -> Result<()> {
    let client = feed_client(&config)?;

    let poller = config
        .channel_id
        .as_ref()
        .map(|id| FeedPoller::new(client.clone(), id.clone()));

    let _polling = match (&poller, config.poll_interval()) {
        (Some(poller), Some(interval)) => Some(poller.spawn(interval)),
        (Some(_), None) => {
            tracing::info!("Polling disabled; sermon board refreshes on demand only");
            None
        }
        (None, _) => None,
    };

    let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server::serve(listener, AppState { client, poller }, shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn run_fetch(config: Config, channel_id: &str) -> Result<()> {
    let client = feed_client(&config)?;
    let result = client
        .fetch_channel_videos(channel_id)
        .await
        .with_context(|| format!("Failed to fetch videos for channel {}", channel_id))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match args.command {
        Some(Command::Focal {
            x,
            y,
            width,
            height,
            left,
            top,
        }) => {
            let rect = Rect {
                left,
                top,
                width,
                height,
            };
            let point = FocalPoint::from_pointer(x, y, rect)
                .ok_or_else(|| anyhow::anyhow!("Width and height must be positive"))?;
            println!("{}", point);
            Ok(())
        }
        Some(Command::Fetch { channel_id }) => {
            run_fetch(load_config(args.config)?, &channel_id).await
        }
        Some(Command::Serve { bind }) => run_server(load_config(args.config)?, bind).await,
        None => run_server(load_config(args.config)?, None).await,
    }
}
