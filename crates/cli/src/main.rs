use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "opsgate", about = "Opsgate — local ops console gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        /// Interface to bind (overrides config).
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config).
        #[arg(long)]
        port: Option<u16>,
        /// Supervisor run endpoint to proxy to (overrides config).
        #[arg(long)]
        supervisor_url: Option<String>,
        /// Directory to serve the browser UI from (overrides config).
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Query a running gateway's health endpoint.
    Health {
        /// Base URL of the gateway.
        #[arg(long, default_value = "http://127.0.0.1:8088")]
        url: String,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the discovered config path and effective configuration.
    Show,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "opsgate starting");

    match cli.command {
        Commands::Gateway {
            bind,
            port,
            supervisor_url,
            static_dir,
        } => {
            let mut config = opsgate_config::discover_and_load();
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(url) = supervisor_url {
                config.gateway.supervisor_url = url;
            }
            if let Some(dir) = static_dir {
                config.gateway.static_dir = dir;
            }
            opsgate_gateway::server::start_gateway(config).await
        },
        Commands::Health { url } => check_health(&url).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(),
        },
    }
}

/// GET `/api/health` on a running gateway and print the response.
async fn check_health(url: &str) -> anyhow::Result<()> {
    let endpoint = format!("{}/api/health", url.trim_end_matches('/'));
    let response = reqwest::get(&endpoint).await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    anyhow::ensure!(status.is_success(), "gateway reported {status}");
    Ok(())
}

/// Print the discovered config file path (if any) and the effective config.
fn show_config() -> anyhow::Result<()> {
    match opsgate_config::loader::find_config_file() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file found, showing defaults"),
    }
    let config = opsgate_config::discover_and_load();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
