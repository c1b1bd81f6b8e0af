use clap::Parser;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tether_log::{log_error, log_info, LevelFilter};
use tether_rpc::prelude::*;

#[derive(Debug, Parser)]
#[command(version, about = "Issue JSON-RPC calls and watch server events")]
struct Args {
    /// WebSocket URL or bare host:port/path
    #[arg(short, long, default_value = tether_rpc::client::options::DEFAULT_URL)]
    url: String,

    /// Method to invoke once connected
    #[arg(short, long)]
    method: Option<String>,

    /// Call parameters as JSON
    #[arg(short, long)]
    params: Option<String>,

    /// Call timeout in milliseconds
    #[arg(long, default_value_t = 60_000)]
    timeout: u64,

    /// Keep running and print server events until interrupted
    #[arg(short, long)]
    listen: bool,

    /// Maximum reconnection attempts, negative for unbounded
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    retry_max: i64,

    /// Delay between reconnection attempts in milliseconds
    #[arg(long, default_value_t = 10_000)]
    retry_delay: u64,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

struct Status;

impl ConnectionHandler for Status {
    fn connection_changed(&self, connected: bool) {
        log_info!("connection {}", if connected { "established" } else { "lost" });
    }

    fn retries_exhausted(&self, error: &Error) {
        log_error!("{error}");
    }
}

async fn run(args: Args) -> Result<()> {
    let params = match &args.params {
        Some(params) => serde_json::from_str(params)?,
        None => Value::Null,
    };

    let client = Client::new(ClientOptions {
        url: args.url,
        event_handler: Some(Arc::new(|name: &str, payload: &Value| -> HandlerResult {
            log_info!("event `{name}`: {payload}");
            Ok(())
        })),
        error_handler: Some(Arc::new(|error: &ServerError| {
            log_error!("server error {error}");
        })),
        connection_handler: Some(Arc::new(Status)),
        retry: RetryPolicy::from_max(args.retry_max, Duration::from_millis(args.retry_delay)),
        log_level: Some(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }),
        ..Default::default()
    })
    .await?;

    if let Some(method) = &args.method {
        let timeout = Duration::from_millis(args.timeout);
        let result = client.call(method, params, Some(timeout)).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if args.listen {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|err| log_error!("unable to listen for ctrl-c: {err}"));
    }

    client.disconnect().await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Args::parse()).await {
        log_error!("{err}");
        std::process::exit(1);
    }
}
