//! AWS Lambda entry point for sitewatch
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! Attach an EventBridge schedule for periodic sweeps and, optionally, an
//! HTTP trigger for RPC requests.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::Value;
use sitewatch::lambda;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("sitewatch Lambda starting...");
    let scheduler = Arc::new(lambda::build_scheduler().await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        lambda::handler(Arc::clone(&scheduler), event)
    }))
    .await
}
