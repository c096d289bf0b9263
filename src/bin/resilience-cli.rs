use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use resilient_llm::config::{load_config, ResilienceConfig};
use resilient_llm::observability;
use resilient_llm::resilience::{
    CircuitBreaker, CircuitBreakerConfig, RemoteError, ResilientExecutor, RetryClass, RetryPolicy,
};
use resilient_llm::RemoteClient;

#[derive(Parser)]
#[command(name = "resilience-cli")]
#[command(about = "Call a hosted model endpoint with retry and circuit breaking", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and print the effective values
    Check,
    /// POST a JSON body to the endpoint
    Send {
        /// Override the configured endpoint URL
        #[arg(short, long)]
        url: Option<String>,

        /// Request body as a JSON document
        #[arg(short, long)]
        body: String,

        /// Number of sequential requests to send
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };

    observability::init_logging(&config.observability)?;
    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        observability::init_metrics(addr)?;
    }

    match cli.command {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Send { url, body, count } => {
            send(&config, url, &body, count).await?;
        }
    }

    Ok(())
}

async fn send(
    config: &ResilienceConfig,
    url: Option<String>,
    body: &str,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let body: Value = serde_json::from_str(body)?;
    let url = url.unwrap_or_else(|| config.endpoint.url.clone());
    let client = RemoteClient::new(&url, None)?;

    let policy = RetryPolicy::try_from(&config.retry)?;
    let timeout_class = if config.timeouts.retry_on_timeout {
        RetryClass::Retryable
    } else {
        RetryClass::Fatal
    };
    let executor: ResilientExecutor<RemoteError> = ResilientExecutor::new(&config.endpoint.name)
        .with_attempt_timeout(config.timeouts.attempt_ms.map(Duration::from_millis))
        .with_timeout_class(timeout_class);

    let breaker = if config.circuit_breaker.enabled {
        let breaker_config = CircuitBreakerConfig::try_from(&config.circuit_breaker)?;
        Some(Arc::new(CircuitBreaker::new(&config.endpoint.name, breaker_config)))
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling in-flight request");
            trigger.cancel();
        }
    });

    tracing::info!(url = %url, count, max_attempts = policy.max_attempts(), "Sending requests");

    for request in 1..=count {
        let op = || client.post_json(&body);
        let result = match &breaker {
            Some(breaker) => {
                breaker
                    .execute_cancellable(&executor, &policy, &cancel, op)
                    .await
            }
            None => executor.execute_cancellable(&policy, &cancel, op).await,
        };

        match result {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) if e.is_cancelled() => {
                eprintln!("Cancelled");
                break;
            }
            Err(e) => {
                tracing::error!(request, kind = e.kind(), error = %e, "Request failed");
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}
