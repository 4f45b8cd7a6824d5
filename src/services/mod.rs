//! Service layer: the collaborators the check pipeline calls out to.
//!
//! - `SiteCrawler`: fetches a fresh page set for a site (`HttpSiteCrawler`)
//! - `ArtifactGenerator`: turns an accepted page set into output documents
//!   (`LlmsTxtGenerator`)

mod crawler;
mod generator;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{PageSet, Site};

pub use crawler::HttpSiteCrawler;
pub use generator::{LlmsTxtGenerator, Section, importance_score};

/// Crawls a site into a page set.
#[async_trait]
pub trait SiteCrawler: Send + Sync {
    /// Crawl `url`, fetching at most `max_pages` pages.
    async fn crawl(&self, url: &str, max_pages: usize) -> Result<PageSet>;
}

/// Where a generation run left its documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub llms_txt_location: String,
    pub llms_full_txt_location: String,
    pub page_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Previously generated documents for a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredArtifacts {
    pub llms_txt: String,
    pub llms_full_txt: String,
}

/// Produces the output documents for an accepted page set.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    /// Generate and persist documents for `site` from `pages`.
    async fn generate(&self, site: &Site, pages: &PageSet) -> Result<GeneratedArtifacts>;

    /// Load the documents last generated for `url`.
    async fn load(&self, _url: &str) -> Result<Option<StoredArtifacts>> {
        Ok(None)
    }

    /// Forget the documents of a site that is no longer monitored.
    async fn discard(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
