/*!
 * Broken link checker.
 *
 * This module scans a working tree for URLs and checks each of them once:
 *
 * - `scan_files`: walk the tree and collect URLs with the files they appear in
 * - `UrlChecker`: seam for checking one URL (`HttpUrlChecker` over reqwest)
 * - `LinkChecker`: runs a full check and produces a `LinkReport`
 * - `report`: renders the report and reconciles it with the bot's issue
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use walkdir::WalkDir;

use crate::app_config::LinkCheckerOptions;
use crate::file_utils;

pub mod report;

pub use self::report::{IssueAction, reconcile_issue};

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"'`()\[\]{}|\\^]+"#).unwrap());

/// Trailing characters that end a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '*', '_'];

/// Outcome of checking one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
    /// Whether the URL counts as broken
    pub broken: bool,
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    /// Reason phrase or transport error
    pub message: String,
}

/// Everything known about one URL after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResult {
    pub broken: bool,
    pub status: Option<u16>,
    pub message: String,
    /// Files the URL was found in
    pub locations: BTreeSet<String>,
}

/// Result of a full link check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Number of files scanned
    pub number_files: usize,
    /// Every URL found, including skipped ones (never broken)
    pub urls: BTreeMap<String, UrlResult>,
}

impl LinkReport {
    /// Only the broken URLs
    pub fn broken_links(&self) -> BTreeMap<&str, &UrlResult> {
        self.urls
            .iter()
            .filter(|(_, result)| result.broken)
            .map(|(url, result)| (url.as_str(), result))
            .collect()
    }

    /// Whether any URL is broken
    pub fn has_broken_links(&self) -> bool {
        self.urls.values().any(|result| result.broken)
    }
}

/// Checks a single URL
#[async_trait]
pub trait UrlChecker: Send + Sync + Debug {
    async fn check(&self, url: &str) -> UrlCheck;
}

/// [`UrlChecker`] issuing a GET request per URL
#[derive(Debug, Clone)]
pub struct HttpUrlChecker {
    client: Client,
}

impl HttpUrlChecker {
    /// Create a checker with a per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(concat!("arnold/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl UrlChecker for HttpUrlChecker {
    async fn check(&self, url: &str) -> UrlCheck {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                UrlCheck {
                    broken: status.is_client_error() || status.is_server_error(),
                    status: Some(status.as_u16()),
                    message: status.canonical_reason().unwrap_or_default().to_string(),
                }
            }
            Err(e) => UrlCheck {
                broken: true,
                status: None,
                message: e.to_string(),
            },
        }
    }
}

/// Extract URLs from text, without trailing punctuation
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION).to_string())
        .filter(|url| url.len() > "https://".len())
        .collect()
}

fn is_excluded(relative: &str, is_dir: bool, options: &LinkCheckerOptions) -> bool {
    let candidate = if is_dir {
        format!("{}/", relative)
    } else {
        relative.to_string()
    };
    options
        .exclude_directories
        .iter()
        .any(|excluded| candidate.starts_with(excluded.trim_start_matches("./")))
}

/// Walk `root` in name order and collect every URL with the files it appears in
///
/// Returns the number of files scanned and the URL map.
pub fn scan_files(root: &Path, options: &LinkCheckerOptions) -> Result<(usize, BTreeMap<String, BTreeSet<String>>)> {
    let mut number_files = 0;
    let mut urls: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
        match entry.path().strip_prefix(root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                !is_excluded(&file_utils::to_slash_path(relative), entry.file_type().is_dir(), options)
            }
            _ => true,
        }
    });

    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !options.file_types.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map(file_utils::to_slash_path)
            .unwrap_or_else(|_| name.to_string());
        // Binary or non UTF-8 files hold no links we can report
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            debug!("Skipping unreadable file {}", relative);
            continue;
        };

        number_files += 1;
        for url in extract_urls(&content) {
            urls.entry(url).or_default().insert(relative.clone());
        }
    }

    Ok((number_files, urls))
}

/// Runs a full link check over a working tree
#[derive(Debug, Clone)]
pub struct LinkChecker {
    options: LinkCheckerOptions,
    show_progress: bool,
}

impl LinkChecker {
    /// Create a checker for the given options
    pub fn new(options: LinkCheckerOptions) -> Self {
        Self {
            options,
            show_progress: false,
        }
    }

    /// Show a progress bar while URLs are checked
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// HTTP checker honouring the configured timeout
    pub fn http_checker(&self) -> HttpUrlChecker {
        HttpUrlChecker::new(Duration::from_secs(self.options.timeout_secs))
    }

    /// Scan `root` and check every URL found, one at a time
    pub async fn run(&self, root: &Path, checker: &dyn UrlChecker) -> Result<LinkReport> {
        let (number_files, found) = scan_files(root, &self.options)?;
        info!("Found {} unique URLs in {} files", found.len(), number_files);

        let progress = if self.show_progress {
            let bar = ProgressBar::new(found.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} URLs ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("█▓▒░"));
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut urls = BTreeMap::new();
        for (url, locations) in found {
            let check = if self.options.skip_urls.iter().any(|skip| skip == &url) {
                debug!("Skipping {}", url);
                UrlCheck {
                    broken: false,
                    status: None,
                    message: "Skipped".to_string(),
                }
            } else {
                progress.set_message(url.clone());
                checker.check(&url).await
            };
            progress.inc(1);

            urls.insert(
                url,
                UrlResult {
                    broken: check.broken,
                    status: check.status,
                    message: check.message,
                    locations,
                },
            );
        }
        progress.finish_and_clear();

        let report = LinkReport { number_files, urls };
        info!("{} broken links found", report.broken_links().len());
        Ok(report)
    }
}
