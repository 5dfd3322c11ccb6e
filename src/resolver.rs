use crate::config::{ExtractorConfig, ResolverSettings};
use crate::error::{Result, TuneError};
use crate::types::{Requester, ResolvedTrack};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

/// Raw extraction result
///
/// Mirrors the subset of `yt-dlp`'s JSON dump the resolver needs. Playlists
/// and searches carry their items in `entries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractInfo {
    #[serde(default)]
    pub title: Option<String>,

    /// Direct stream URL
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub webpage_url: Option<String>,

    #[serde(default)]
    pub entries: Option<Vec<ExtractInfo>>,
}

impl ExtractInfo {
    /// The playable entry: the first entry of a playlist, or self
    fn into_first_entry(self) -> Option<ExtractInfo> {
        match self.entries {
            Some(entries) => entries.into_iter().next()?.into_first_entry(),
            None => Some(self),
        }
    }
}

/// Metadata extraction backend
///
/// The resolver drops the returned future when its timeout passes, so
/// implementations must release whatever they hold (child processes,
/// connections) on drop.
pub trait Extractor: Send + Sync + 'static {
    fn extract<'a>(&'a self, term: &'a str) -> BoxFuture<'a, Result<ExtractInfo>>;
}

/// How a query is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Direct media locator
    Url,
    /// Free-text search
    Search,
}

impl QueryKind {
    pub fn classify(query: &str) -> Self {
        let lower = query.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            QueryKind::Url
        } else {
            QueryKind::Search
        }
    }
}

/// Turns user queries into [`ResolvedTrack`]s
#[derive(Clone)]
pub struct SourceResolver {
    extractor: Arc<dyn Extractor>,
    search_prefix: String,
    timeout: Duration,
}

impl SourceResolver {
    pub fn new(extractor: Arc<dyn Extractor>, settings: &ResolverSettings) -> Self {
        Self {
            extractor,
            search_prefix: settings.search_prefix.clone(),
            timeout: settings.timeout(),
        }
    }

    /// Override the extraction timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extractor input for a user query
    pub fn lookup_term(&self, query: &str) -> String {
        let query = query.trim();
        match QueryKind::classify(query) {
            QueryKind::Url => query.to_string(),
            QueryKind::Search => format!("{}{}", self.search_prefix, query),
        }
    }

    /// Resolve a query on behalf of `requester`
    ///
    /// Playlists and searches yield their first entry only. An extraction
    /// still running at the timeout is cancelled.
    pub async fn resolve(&self, query: &str, requester: Requester) -> Result<ResolvedTrack> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TuneError::EmptyQuery);
        }

        let term = self.lookup_term(query);
        tracing::debug!("Resolving '{}' as '{}'", query, term);

        let info = match timeout(self.timeout, self.extractor.extract(&term)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Resolving '{}' timed out after {:?}", query, self.timeout);
                return Err(TuneError::ResolveTimeout(query.to_string()));
            }
        };

        let track = track_from_info(query, info, requester)?;
        tracing::info!("Resolved '{}' to '{}'", query, track.title);
        Ok(track)
    }
}

fn track_from_info(query: &str, info: ExtractInfo, requester: Requester) -> Result<ResolvedTrack> {
    let entry = info
        .into_first_entry()
        .ok_or_else(|| TuneError::NoResults(query.to_string()))?;

    let stream_locator = entry
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| TuneError::resolution(query, "no playable stream in result"))?;

    Ok(ResolvedTrack {
        id: Uuid::new_v4(),
        title: entry.title.unwrap_or_else(|| "Unknown title".to_string()),
        stream_locator,
        duration_seconds: entry.duration.filter(|d| d.is_finite() && *d >= 0.0),
        thumbnail_url: entry.thumbnail,
        webpage_url: entry.webpage_url,
        requested_by: requester,
    })
}

/// Extractor backed by the `yt-dlp` command line tool
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to `yt-dlp` for `term`
    pub fn command_args(&self, term: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--format".to_string(),
            self.config.format.clone(),
        ];

        if let Some(search) = &self.config.default_search {
            args.push("--default-search".to_string());
            args.push(search.clone());
        }
        if let Some(address) = &self.config.source_address {
            args.push("--source-address".to_string());
            args.push(address.clone());
        }
        if let Some(cookies) = &self.config.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(term.to_string());
        args
    }
}

impl YtDlpExtractor {
    async fn run(&self, term: &str) -> Result<ExtractInfo> {
        let output = Command::new(&self.config.binary)
            .args(self.command_args(term))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TuneError::resolution(
                    term,
                    format!("failed to run {}: {}", self.config.binary.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("extractor exited with an error")
                .trim()
                .to_string();
            tracing::warn!("yt-dlp failed for '{}': {}", term, reason);
            return Err(TuneError::resolution(term, reason));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl Extractor for YtDlpExtractor {
    fn extract<'a>(&'a self, term: &'a str) -> BoxFuture<'a, Result<ExtractInfo>> {
        Box::pin(self.run(term))
    }
}
