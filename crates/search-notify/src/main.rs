//! Search Notify smoke CLI
//!
//! Pushes one synthetic request through the interceptor against a live
//! broker. Verifies connectivity, stream declaration and the configured
//! policy without wiring the notifier into the host proxy.

use clap::Parser;
use search_notify::{Interceptor, NatsPublisher, NatsPublisherConfig, NotifyOutcome};
use search_notify_core::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "search-notify")]
#[command(about = "Publish a synthetic object-storage request to the search topic")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SEARCH_NOTIFY_CONFIG")]
    config: Option<String>,

    /// Broker connection URI (overrides configuration)
    #[arg(long, env = "BROKER_URL")]
    broker: Option<String>,

    /// HTTP method of the synthetic request
    #[arg(long, default_value = "PUT")]
    method: String,

    /// Resource path of the synthetic request
    #[arg(long, default_value = "/v1/smoke/container/object")]
    path: String,

    /// Request header as `Name: value` (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = NotifierConfig::load(args.config.as_deref())?;
    if let Some(broker) = args.broker {
        config.broker_connection = broker;
        config.validate()?;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %config.broker_connection,
        topic = %config.topic_name,
        "Starting smoke publish"
    );

    let method = http::Method::try_from(args.method.to_ascii_uppercase().as_str())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method `{}`", args.method))?;

    let headers = args
        .headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let publisher = NatsPublisher::new(NatsPublisherConfig::from_notifier(&config));
    let interceptor = Interceptor::from_config(&config, publisher)?;

    match interceptor.observe(&method, &args.path, &headers).await {
        NotifyOutcome::Published => {
            info!(path = %args.path, "Envelope published");
            Ok(())
        }
        NotifyOutcome::Skipped => {
            warn!(%method, "Method not in notify_methods, nothing published");
            Ok(())
        }
        NotifyOutcome::PublishFailed(error) => {
            Err(anyhow::Error::new(error).context("publish failed"))
        }
    }
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("header `{raw}` must be `Name: value`"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}
