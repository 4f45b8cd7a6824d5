// src/models/snapshot.rs

//! Page-set snapshots and content fingerprints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::collapse_whitespace;
use crate::utils::url::normalize_url;

/// A page as returned by the crawler, with its full extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrawledPage {
    /// Normalized page URL
    pub url: String,

    /// Page title
    pub title: String,

    /// Meta description (empty if absent)
    #[serde(default)]
    pub description: String,

    /// Main extracted text
    pub content: String,

    /// Same-site links discovered on the page
    #[serde(default)]
    pub links: Vec<String>,
}

impl CrawledPage {
    /// Content fingerprint of this page.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.content)
    }
}

/// Output of one crawl of a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSet {
    /// Site the crawl started from
    pub base_url: String,

    /// Pages in crawl order
    pub pages: Vec<CrawledPage>,

    /// When the crawl finished
    pub captured_at: DateTime<Utc>,
}

impl PageSet {
    pub fn new(base_url: impl Into<String>, pages: Vec<CrawledPage>, captured_at: DateTime<Utc>) -> Self {
        Self {
            base_url: base_url.into(),
            pages,
            captured_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Reduce the crawl to the fingerprinted form kept between checks.
    ///
    /// Pages are keyed by normalized URL; URLs that do not normalize are
    /// kept as given. Duplicate URLs keep their first occurrence.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut pages = BTreeMap::new();
        for page in &self.pages {
            let key = normalize_url(&page.url).unwrap_or_else(|_| page.url.clone());
            pages.entry(key).or_insert_with(|| PageRecord::from(page));
        }
        Snapshot {
            pages,
            captured_at: self.captured_at,
        }
    }
}

/// Fingerprinted summary of a single page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// SHA-256 of the whitespace-normalized content
    pub fingerprint: String,

    /// Length of the normalized content in characters
    pub content_length: usize,
}

impl From<&CrawledPage> for PageRecord {
    fn from(page: &CrawledPage) -> Self {
        Self {
            title: page.title.clone(),
            description: page.description.clone(),
            fingerprint: page.fingerprint(),
            content_length: collapse_whitespace(&page.content).chars().count(),
        }
    }
}

/// State of a site's page set as of one accepted crawl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Page URL to page record
    pub pages: BTreeMap<String, PageRecord>,

    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Fingerprint extracted text so that formatting churn is ignored.
pub fn fingerprint(content: &str) -> String {
    let normalized = collapse_whitespace(content);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
