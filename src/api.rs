// src/api.rs

//! RPC surface.
//!
//! A single JSON request shape with an `action` discriminator. Transports
//! (HTTP server, Lambda) parse the body with [`parse_request`] and hand the
//! result to [`handle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::report::{CheckReport, SiteSummary};
use crate::scheduler::Scheduler;

/// Incoming RPC request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    ListSites,
    AddSite {
        url: String,
        #[serde(default)]
        max_pages: Option<usize>,
        /// Seconds between checks
        #[serde(default)]
        check_interval: Option<u64>,
    },
    RemoveSite {
        url: String,
    },
    /// Check one site, or every due site when `url` is omitted
    CheckUpdates {
        #[serde(default)]
        url: Option<String>,
    },
    #[serde(alias = "get_llms_txt")]
    GetArtifacts {
        url: String,
    },
}

/// Outgoing RPC response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Sites {
        monitored_sites: Vec<SiteSummary>,
    },
    Added {
        message: String,
        url: String,
        max_pages: usize,
        check_interval: u64,
        check_interval_hours: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_result: Option<CheckReport>,
    },
    Removed {
        removed: String,
    },
    Checked(CheckReport),
    Sweep {
        checked_sites: Vec<CheckReport>,
        total_sites: usize,
    },
    Artifacts {
        url: String,
        llms_txt: Option<String>,
        llms_full_txt: Option<String>,
        last_update: Option<DateTime<Utc>>,
    },
}

/// Parse a raw request body.
pub fn parse_request(body: &[u8]) -> Result<Request> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::bad_request("No request body provided"));
    }
    let request: Request = serde_json::from_slice(body).map_err(|e| {
        AppError::bad_request(format!(
            "{e}. Use one of: add_site, remove_site, check_updates, list_sites, get_artifacts"
        ))
    })?;

    match &request {
        Request::AddSite { url, .. } | Request::RemoveSite { url } | Request::GetArtifacts { url }
            if url.trim().is_empty() =>
        {
            Err(AppError::bad_request("URL is required"))
        }
        _ => Ok(request),
    }
}

/// Execute a request against the scheduler.
pub async fn handle(scheduler: &Scheduler, request: Request) -> Result<Response> {
    log::debug!("Handling {:?}", request);

    match request {
        Request::ListSites => {
            let sites = scheduler.list_sites().await;
            Ok(Response::Sites {
                monitored_sites: sites.iter().map(SiteSummary::from).collect(),
            })
        }

        Request::AddSite {
            url,
            max_pages,
            check_interval,
        } => {
            let added = scheduler.add_site(&url, check_interval, max_pages).await?;
            let site = added.site;
            Ok(Response::Added {
                message: format!("Site {} added to monitoring", site.url),
                check_interval_hours: site.check_interval_hours(),
                check_interval: site.check_interval_secs,
                max_pages: site.max_pages,
                url: site.url,
                initial_result: added.initial_result.as_ref().map(CheckReport::from),
            })
        }

        Request::RemoveSite { url } => {
            let site = scheduler.remove_site(&url).await?;
            Ok(Response::Removed { removed: site.url })
        }

        Request::CheckUpdates { url } => match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                let result = scheduler.check_site(&url).await?;
                Ok(Response::Checked(CheckReport::from(&result)))
            }
            None => {
                let results = scheduler.check_due().await;
                Ok(Response::Sweep {
                    total_sites: results.len(),
                    checked_sites: results.iter().map(CheckReport::from).collect(),
                })
            }
        },

        Request::GetArtifacts { url } => {
            let (site, artifacts) = scheduler.artifacts(&url).await?;
            let (llms_txt, llms_full_txt) = match artifacts {
                Some(a) => (Some(a.llms_txt), Some(a.llms_full_txt)),
                None => (None, None),
            };
            Ok(Response::Artifacts {
                url: site.url,
                llms_txt,
                llms_full_txt,
                last_update: site.last_update_at,
            })
        }
    }
}
