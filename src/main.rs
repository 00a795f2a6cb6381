use clap::{Parser, ValueEnum};
use dmsweep::{ClearanceConfig, ClearanceOrchestrator, ProgressSnapshot};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "dmsweep", about = "Delete your own messages from a direct-message channel")]
struct Args {
    /// Your user ID (the token must belong to this user)
    #[arg(long, env = "DMSWEEP_USER_ID")]
    user_id: String,

    /// Account token, sent as the Authorization header
    #[arg(long, env = "DMSWEEP_TOKEN", hide_env_values = true)]
    token: String,

    /// ID of the direct-message channel to clear
    #[arg(long, env = "DMSWEEP_CHANNEL_ID")]
    channel_id: String,

    /// YAML file with pacing settings; flags below override it
    #[arg(long, env = "DMSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Pause before each history page request, in milliseconds
    #[arg(long, env = "DMSWEEP_SEARCH_DELAY_MS")]
    search_delay_ms: Option<u64>,

    /// Pause before each deletion, in milliseconds
    #[arg(long, env = "DMSWEEP_DELETE_DELAY_MS")]
    delete_delay_ms: Option<u64>,

    /// Attempts per message before giving up
    #[arg(long, env = "DMSWEEP_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Give up on a history page after this many throttled retries
    #[arg(long, env = "DMSWEEP_SEARCH_THROTTLE_RETRY_CAP")]
    search_throttle_retry_cap: Option<u32>,

    /// REST API base URL
    #[arg(long, env = "DMSWEEP_API_URL")]
    api_url: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "DMSWEEP_LOG_FORMAT")]
    log_format: LogFormat,
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dmsweep=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn build_config(args: &Args) -> Result<ClearanceConfig, dmsweep::ConfigError> {
    let mut config = match &args.config {
        Some(path) => ClearanceConfig::load(path)?,
        None => ClearanceConfig::default(),
    };
    if let Some(ms) = args.search_delay_ms {
        config.search_delay_ms = ms;
    }
    if let Some(ms) = args.delete_delay_ms {
        config.delete_delay_ms = ms;
    }
    if let Some(n) = args.max_attempts {
        config.max_attempts = n;
    }
    if let Some(cap) = args.search_throttle_retry_cap {
        config.search_throttle_retry_cap = Some(cap);
    }
    if let Some(url) = &args.api_url {
        config.api_base = url.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_format);

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ProgressSnapshot>(32);
    let reporter = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            info!(
                deleted = p.deleted_count,
                failed = p.failed_count,
                processed = p.total_processed,
                found = p.total_found,
                "Progress"
            );
        }
    });

    let orchestrator = ClearanceOrchestrator::new(config);
    let result = orchestrator
        .clear_channel(&args.user_id, &args.token, &args.channel_id, Some(tx))
        .await;
    let _ = reporter.await;

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize result: {e}"),
    }

    if !result.success {
        std::process::exit(1);
    }
}
