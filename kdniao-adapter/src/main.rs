//! KDNiao Client - signed one-shot calls to the KDNiao API.
//!
//! Usage:
//!
//! ```text
//! kdniao-client create-order <order.json>
//! kdniao-client subscribe <shipper-code> <logistic-code>
//! ```
//!
//! Credentials and the target environment come from the same environment
//! variables as the web server.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kdniao::{Client, Config, EOrderRequest, SubscribeTracingRequest};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    CreateOrder(PathBuf),
    Subscribe {
        shipper_code: String,
        logistic_code: String,
    },
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [cmd, path] if cmd == "create-order" => Ok(Command::CreateOrder(PathBuf::from(path))),
        [cmd, shipper, logistic] if cmd == "subscribe" => Ok(Command::Subscribe {
            shipper_code: shipper.clone(),
            logistic_code: logistic.clone(),
        }),
        _ => bail!(
            "usage: kdniao-client create-order <order.json> | subscribe <shipper-code> <logistic-code>"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = Config::from_env();
    tracing::info!(
        base_url = %config.base_url(),
        business_id = %config.credentials.business_id,
        sign_scheme = %config.credentials.sign_scheme,
        request_timeout_ms = ?config.request_timeout_ms,
        "config_loaded"
    );

    let mut http = reqwest::Client::builder();
    if let Some(ms) = config.request_timeout_ms {
        http = http.timeout(Duration::from_millis(ms));
    }
    let http = http.build().context("Failed to build HTTP client")?;

    let client = Client::from_config(&config, http);

    match command {
        Command::CreateOrder(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let order: EOrderRequest =
                serde_json::from_str(&raw).context("Failed to parse order JSON")?;

            let reply = client
                .create_eorder(&order)
                .await
                .context("Create e-order failed")?;

            tracing::info!(
                order_code = %reply.order.order_code,
                logistic_code = %reply.order.logistic_code,
                unique_request_number = %reply.unique_request_number,
                has_print_template = reply.print_template.is_some(),
                "create_order_complete"
            );
        }
        Command::Subscribe {
            shipper_code,
            logistic_code,
        } => {
            let sub = SubscribeTracingRequest::new(shipper_code, logistic_code);
            let reply = client
                .subscribe_tracing(&sub)
                .await
                .context("Subscribe tracing failed")?;

            tracing::info!(
                update_time = %reply.update_time,
                estimated_delivery_time = %reply.estimated_delivery_time,
                "subscribe_complete"
            );
        }
    }

    Ok(())
}
