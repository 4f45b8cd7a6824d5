// src/config.rs

//! Configuration loading utilities.
//!
//! Reads `config.toml`, falling back to defaults, then applies environment
//! overrides. Both the CLI and the Lambda entry point go through here.

use std::path::Path;
use std::str::FromStr;

use crate::models::Config;

/// Environment variables that override file settings.
pub const ENV_DATA_DIR: &str = "SITEWATCH_DATA_DIR";
pub const ENV_BIND: &str = "SITEWATCH_BIND";
pub const ENV_CRAWL_TIMEOUT: &str = "CRAWL_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENT: &str = "MAX_CONCURRENT_CHECKS";
pub const ENV_REQUEST_DELAY: &str = "REQUEST_DELAY_MS";

/// Load configuration from a TOML file, then apply process environment
/// overrides.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Config {
    let mut config = Config::load_or_default(path);
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Apply overrides looked up through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
        config.storage.data_dir = dir.into();
    }
    if let Some(bind) = lookup(ENV_BIND).filter(|b| !b.trim().is_empty()) {
        config.server.bind = bind;
    }
    if let Some(secs) = parsed(&lookup, ENV_CRAWL_TIMEOUT) {
        config.scheduler.crawl_timeout_secs = secs;
    }
    if let Some(n) = parsed(&lookup, ENV_MAX_CONCURRENT) {
        config.scheduler.max_concurrent_checks = n;
    }
    if let Some(ms) = parsed(&lookup, ENV_REQUEST_DELAY) {
        config.crawler.request_delay_ms = ms;
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                (ENV_DATA_DIR, "/tmp/sitewatch"),
                (ENV_BIND, "0.0.0.0:9000"),
                (ENV_CRAWL_TIMEOUT, "120"),
                (ENV_MAX_CONCURRENT, "8"),
                (ENV_REQUEST_DELAY, "250"),
            ]),
        );

        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/sitewatch"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.scheduler.crawl_timeout_secs, 120);
        assert_eq!(config.scheduler.max_concurrent_checks, 8);
        assert_eq!(config.crawler.request_delay_ms, 250);
    }

    #[test]
    fn test_unparsable_override_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, lookup(&[(ENV_CRAWL_TIMEOUT, "soon")]));
        assert_eq!(config.scheduler.crawl_timeout_secs, 300);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("absent.toml"));
        assert_eq!(config.server.bind, "127.0.0.1:8001");
    }

    #[test]
    fn test_partial_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[scheduler]\ncheck_on_add = false\nmax_concurrent_checks = 2\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.scheduler.check_on_add);
        assert_eq!(config.scheduler.max_concurrent_checks, 2);
        assert_eq!(config.scheduler.default_max_pages, 20);
    }
}
