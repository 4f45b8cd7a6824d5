// src/lambda/mod.rs

//! AWS Lambda handler for the scheduler.
//!
//! One function serves two kinds of invocation:
//! 1. RPC payloads (`{"action": ...}`, directly or as an HTTP proxy `body`)
//!    are dispatched through [`crate::api`]
//! 2. Anything else (e.g. a scheduled EventBridge rule) runs one due sweep

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::api::{self, parse_request};
use crate::config::apply_env_overrides;
use crate::error::{AppError, Result};
use crate::models::Config;
use crate::report::{ErrorBody, SweepReport};
use crate::scheduler::{Scheduler, SweepSummary};
use crate::storage::ObjectStore;
use crate::storage::s3::S3Storage;

/// What an invocation asks for.
#[derive(Debug, PartialEq)]
enum Invocation {
    Rpc(Vec<u8>),
    Sweep,
}

fn classify(payload: &Value) -> Invocation {
    if payload.get("action").is_some() {
        return Invocation::Rpc(payload.to_string().into_bytes());
    }
    match payload.get("body") {
        Some(Value::String(body)) => Invocation::Rpc(body.clone().into_bytes()),
        _ => Invocation::Sweep,
    }
}

/// Configuration suitable for the Lambda environment: defaults plus
/// environment overrides.
pub fn load_lambda_config() -> Config {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Build the scheduler over S3 storage.
pub async fn build_scheduler() -> Result<Scheduler> {
    let config = load_lambda_config();
    config.validate()?;
    let store: Arc<dyn ObjectStore> = Arc::new(S3Storage::from_env().await?);
    Scheduler::open(&config, store).await
}

/// Main Lambda handler function.
#[instrument(skip(scheduler, event))]
pub async fn handler(
    scheduler: Arc<Scheduler>,
    event: LambdaEvent<Value>,
) -> std::result::Result<Value, LambdaError> {
    let start = std::time::Instant::now();
    let (payload, _context) = event.into_parts();

    let response = match classify(&payload) {
        Invocation::Rpc(body) => match dispatch(&scheduler, &body).await {
            Ok(value) => value,
            Err(e) => {
                error!("Request failed: {}", e);
                serde_json::to_value(ErrorBody::from(&e))?
            }
        },
        Invocation::Sweep => {
            let results = scheduler.check_due().await;
            let summary = SweepSummary::from_results(&results);
            info!(
                "Sweep completed: {} checked, {} updated, {} error(s) in {}ms",
                summary.checked,
                summary.updated,
                summary.errors,
                start.elapsed().as_millis()
            );
            let total = scheduler.registry().len().await;
            serde_json::to_value(SweepReport::new(&results, total))?
        }
    };

    Ok(response)
}

async fn dispatch(scheduler: &Scheduler, body: &[u8]) -> Result<Value> {
    let request = parse_request(body)?;
    let response = api::handle(scheduler, request).await?;
    serde_json::to_value(response).map_err(AppError::from)
}
