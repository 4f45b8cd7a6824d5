// src/services/crawler.rs

//! Site crawler service.
//!
//! Breadth-first, same-host crawl from a site's root URL that extracts each
//! page's title, description, main text and outgoing links.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawledPage, CrawlerConfig, PageSet};
use crate::services::SiteCrawler;
use crate::utils::url::normalize_url;
use crate::utils::{collapse_whitespace, http, resolve_url};

/// Elements whose text never counts as page content.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "noscript", "nav", "footer", "header", "aside"];

/// Content roots, tried in order.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "div[class*='content']",
    "div[class*='main']",
    "body",
];

/// Links to resources that are never HTML pages.
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".zip", ".gz", ".mp4", ".mp3",
    ".css", ".js", ".xml", ".json",
];

/// Service for crawling a monitored site over HTTP.
pub struct HttpSiteCrawler {
    config: CrawlerConfig,
    client: Client,
}

impl HttpSiteCrawler {
    /// Create a new crawler with the given configuration.
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let client = http::create_async_client(&config)?;
        Ok(Self { config, client })
    }

    /// Create a crawler sharing an existing HTTP client.
    pub fn with_client(config: CrawlerConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::config(format!("invalid selector '{s}': {e:?}")))
    }

    /// Parse one fetched document into a page record.
    fn extract_page(&self, url: &str, html: &str, host: &str) -> Result<CrawledPage> {
        let document = Html::parse_document(html);
        let base = Url::parse(url)?;

        let title_sel = Self::parse_selector("title")?;
        let description_sel = Self::parse_selector("meta[name='description']")?;
        let link_sel = Self::parse_selector("a[href]")?;

        let title = document
            .select(&title_sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback_title(&base));

        let description = document
            .select(&description_sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(collapse_whitespace)
            .unwrap_or_default();

        let mut content = String::new();
        for selector in CONTENT_SELECTORS {
            let sel = Self::parse_selector(selector)?;
            if let Some(root) = document.select(&sel).next() {
                content = visible_text(root);
                break;
            }
        }

        let mut seen = HashSet::new();
        let links: Vec<String> = document
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| !href.starts_with("mailto:") && !href.starts_with("javascript:"))
            .filter_map(|href| normalize_url(&resolve_url(&base, href)).ok())
            .filter(|link| is_crawlable(link, host) && link != url)
            .filter(|link| seen.insert(link.clone()))
            .take(self.config.links_per_page)
            .collect();

        Ok(CrawledPage {
            url: url.to_string(),
            title,
            description,
            content,
            links,
        })
    }
}

#[async_trait]
impl SiteCrawler for HttpSiteCrawler {
    async fn crawl(&self, url: &str, max_pages: usize) -> Result<PageSet> {
        let root = normalize_url(url)?;
        let host = Url::parse(&root)?
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::crawl(&root, "URL has no host"))?;
        let delay = Duration::from_millis(self.config.request_delay_ms);

        let mut queue = VecDeque::from([(root.clone(), 0usize)]);
        let mut visited = HashSet::new();
        let mut pages = Vec::new();
        let mut failures = 0usize;

        while let Some((page_url, depth)) = queue.pop_front() {
            if visited.len() >= max_pages {
                break;
            }
            if depth > self.config.depth_limit || !visited.insert(page_url.clone()) {
                continue;
            }

            let html = match http::fetch_html(&self.client, &page_url).await {
                Ok(Some(html)) => html,
                Ok(None) => continue,
                Err(e) => {
                    failures += 1;
                    log::warn!("Failed to fetch {}: {}", page_url, e);
                    continue;
                }
            };

            match self.extract_page(&page_url, &html, &host) {
                Ok(page) => {
                    for link in &page.links {
                        if !visited.contains(link) {
                            queue.push_back((link.clone(), depth + 1));
                        }
                    }
                    pages.push(page);
                }
                Err(e) => {
                    failures += 1;
                    log::warn!("Failed to parse {}: {}", page_url, e);
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        log::debug!(
            "Crawled {}: {} page(s), {} failure(s), {} attempted",
            root,
            pages.len(),
            failures,
            visited.len()
        );
        Ok(PageSet::new(root, pages, Utc::now()))
    }
}

/// Text of an element, skipping non-content subtrees.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| EXCLUDED_TAGS.contains(&el.name()))
        });
        if !hidden {
            parts.push(&text.text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

fn fallback_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back().map(str::to_string))
        .filter(|s| !s.is_empty())
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn is_crawlable(link: &str, host: &str) -> bool {
    let Ok(parsed) = Url::parse(link) else {
        return false;
    };
    if parsed.host_str() != Some(host) {
        return false;
    }
    let path = parsed.path().to_lowercase();
    !SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
