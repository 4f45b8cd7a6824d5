// src/services/generator.rs

//! llms.txt generation service.
//!
//! Ranks crawled pages by a keyword/depth/length heuristic, groups them into
//! sections and writes two documents per site:
//!
//! - `llms.txt`: summary plus the important pages of each section, each
//!   truncated for readability
//! - `llms-full.txt`: every page with its full text

use std::fmt::{self, Write as _};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawledPage, PageSet, Site, site_key};
use crate::services::{ArtifactGenerator, GeneratedArtifacts, StoredArtifacts};
use crate::storage::{ObjectStore, artifact_key, read_text};

pub const LLMS_TXT: &str = "llms.txt";
pub const LLMS_FULL_TXT: &str = "llms-full.txt";

/// Pages at or below this score are left out of `llms.txt`.
const MIN_IMPORTANCE: f64 = 0.3;

/// Graphemes of page text kept per entry in `llms.txt`.
const EXCERPT_GRAPHEMES: usize = 1000;

/// Pages listed under "Key Pages" in the summary.
const KEY_PAGES: usize = 5;

const IMPORTANT_KEYWORDS: &[&str] = &[
    "api",
    "docs",
    "documentation",
    "guide",
    "tutorial",
    "getting started",
    "quickstart",
    "reference",
];

/// Section a page is filed under, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    GettingStarted,
    Documentation,
    ApiReference,
    Examples,
    Support,
    General,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::GettingStarted,
        Section::Documentation,
        Section::ApiReference,
        Section::Examples,
        Section::Support,
        Section::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::GettingStarted => "Getting Started",
            Section::Documentation => "Documentation",
            Section::ApiReference => "API Reference",
            Section::Examples => "Examples",
            Section::Support => "Support",
            Section::General => "General",
        }
    }

    /// File a page by keywords in its URL path or title. API terms win over
    /// guides.
    pub fn categorize(page: &CrawledPage) -> Self {
        // Only the path: hosts like example.com would match "example".
        let url = Url::parse(&page.url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| page.url.to_lowercase());
        let title = page.title.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| url.contains(w) || title.contains(w));

        if mentions(&["api", "reference"]) {
            Section::ApiReference
        } else if mentions(&["guide", "tutorial", "getting-started", "quickstart"]) {
            Section::GettingStarted
        } else if mentions(&["docs", "documentation"]) {
            Section::Documentation
        } else if mentions(&["example", "demo"]) {
            Section::Examples
        } else if mentions(&["faq", "help", "support"]) {
            Section::Support
        } else {
            Section::General
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score a page between 0 and 1.
pub fn importance_score(page: &CrawledPage) -> f64 {
    let mut score = 0.0;

    let title = page.title.to_lowercase();
    let url = page.url.to_lowercase();
    for keyword in IMPORTANT_KEYWORDS {
        if title.contains(keyword) {
            score += 0.3;
        }
        if url.contains(keyword) {
            score += 0.2;
        }
    }

    // Shallow pages rank higher.
    let depth = Url::parse(&page.url)
        .map(|u| u.path().split('/').count().saturating_sub(1))
        .unwrap_or(0);
    score += 5usize.saturating_sub(depth) as f64 * 0.1;

    let length = page.content.chars().count();
    if length > 500 && length < 5000 {
        score += 0.2;
    } else if length >= 5000 {
        score += 0.1;
    }

    score.min(1.0)
}

/// A page with its ranking.
struct RankedPage<'a> {
    page: &'a CrawledPage,
    section: Section,
    score: f64,
}

fn rank(pages: &[CrawledPage]) -> Vec<RankedPage<'_>> {
    let mut ranked: Vec<RankedPage<'_>> = pages
        .iter()
        .map(|page| RankedPage {
            page,
            section: Section::categorize(page),
            score: importance_score(page),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

fn domain_of(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| base_url.to_string())
}

fn excerpt(content: &str) -> String {
    let mut graphemes = content.graphemes(true);
    let head: String = graphemes.by_ref().take(EXCERPT_GRAPHEMES).collect();
    if graphemes.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Render the summary document.
pub fn render_llms_txt(pages: &PageSet) -> String {
    let domain = domain_of(&pages.base_url);
    let ranked = rank(&pages.pages);
    let mut out = String::new();

    let _ = writeln!(out, "# {domain}\n");
    let _ = writeln!(
        out,
        "This documentation covers {} pages from {domain}.\n",
        ranked.len()
    );

    out.push_str("## Sections\n\n");
    for section in Section::ALL {
        let count = ranked.iter().filter(|r| r.section == section).count();
        if count > 0 {
            let _ = writeln!(out, "- **{section}**: {count} pages");
        }
    }

    out.push_str("\n## Key Pages\n\n");
    for r in ranked.iter().take(KEY_PAGES) {
        let _ = writeln!(out, "- [{}]({})", r.page.title, r.page.url);
    }
    out.push('\n');

    for section in Section::ALL {
        let members: Vec<&RankedPage<'_>> =
            ranked.iter().filter(|r| r.section == section).collect();
        if members.is_empty() {
            continue;
        }

        let _ = writeln!(out, "## {section}\n");
        for r in members.into_iter().filter(|r| r.score > MIN_IMPORTANCE) {
            let _ = writeln!(out, "### {}", r.page.title);
            let _ = writeln!(out, "URL: {}", r.page.url);
            if !r.page.description.is_empty() {
                let _ = writeln!(out, "Description: {}", r.page.description);
            }
            let _ = writeln!(out, "\n{}\n", excerpt(&r.page.content));
            out.push_str("---\n\n");
        }
    }

    out
}

/// Render the complete document.
pub fn render_llms_full_txt(pages: &PageSet) -> String {
    let domain = domain_of(&pages.base_url);
    let ranked = rank(&pages.pages);
    let mut out = String::new();

    let _ = writeln!(out, "# {domain} - Complete Documentation\n");
    let _ = writeln!(out, "Generated from {} pages\n", ranked.len());

    for r in &ranked {
        let _ = writeln!(out, "## {}", r.page.title);
        let _ = writeln!(out, "URL: {}", r.page.url);
        let _ = writeln!(out, "Section: {}", r.section);
        let _ = writeln!(out, "Importance: {:.2}", r.score);
        if !r.page.description.is_empty() {
            let _ = writeln!(out, "Description: {}", r.page.description);
        }
        let _ = writeln!(out, "\n{}\n", r.page.content);
        let _ = writeln!(out, "{}\n", "=".repeat(80));
    }

    out
}

/// Generates and stores llms.txt documents.
pub struct LlmsTxtGenerator {
    store: Arc<dyn ObjectStore>,
}

impl LlmsTxtGenerator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ArtifactGenerator for LlmsTxtGenerator {
    async fn generate(&self, site: &Site, pages: &PageSet) -> Result<GeneratedArtifacts> {
        if pages.is_empty() {
            return Err(AppError::regeneration(&site.url, "no pages to generate from"));
        }

        let key = site.storage_key();
        let llms_txt_key = artifact_key(&key, LLMS_TXT);
        let llms_full_key = artifact_key(&key, LLMS_FULL_TXT);

        let write = |k: String, body: String| async move {
            self.store
                .write_bytes(&k, body.as_bytes())
                .await
                .map_err(|e| AppError::regeneration(&site.url, e))
        };
        write(llms_txt_key.clone(), render_llms_txt(pages)).await?;
        write(llms_full_key.clone(), render_llms_full_txt(pages)).await?;

        log::info!(
            "Generated llms.txt for {} from {} pages",
            site.url,
            pages.pages.len()
        );
        Ok(GeneratedArtifacts {
            llms_txt_location: self.store.location(&llms_txt_key),
            llms_full_txt_location: self.store.location(&llms_full_key),
            page_count: pages.pages.len(),
            generated_at: Utc::now(),
        })
    }

    async fn load(&self, url: &str) -> Result<Option<StoredArtifacts>> {
        let key = site_key(url);
        let llms_txt = read_text(self.store.as_ref(), &artifact_key(&key, LLMS_TXT)).await?;
        let llms_full_txt =
            read_text(self.store.as_ref(), &artifact_key(&key, LLMS_FULL_TXT)).await?;

        Ok(match (llms_txt, llms_full_txt) {
            (Some(llms_txt), Some(llms_full_txt)) => Some(StoredArtifacts {
                llms_txt,
                llms_full_txt,
            }),
            _ => None,
        })
    }

    async fn discard(&self, url: &str) -> Result<()> {
        let key = site_key(url);
        self.store.delete(&artifact_key(&key, LLMS_TXT)).await?;
        self.store.delete(&artifact_key(&key, LLMS_FULL_TXT)).await
    }
}
