//! Tool binary downloads with bounded concurrency, verification and an
//! idempotent on-disk cache.
//!
//! Cache layout is a stable contract reused across runs:
//! `cache_dir/<name>/<version-or-"latest">/<basename(url)>`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cryptoxide::{digest::Digest as _, sha2::Sha256};
use futures::StreamExt as _;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{DownloadStatus, Tool, ToolRegistry};

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Outcome of one tool's download attempt.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub name: String,
    pub status: DownloadStatus,
    pub error: Option<Error>,
}

/// Per-tool outcomes for a whole download run. Individual failures never
/// fail the run; the caller decides whether the failure count is
/// acceptable.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    pub fn count(&self, status: DownloadStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn verified(&self) -> usize {
        self.count(DownloadStatus::Verified)
    }

    pub fn skipped(&self) -> usize {
        self.count(DownloadStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(DownloadStatus::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DownloadStatus::Failed)
    }
}

struct FetchFailure {
    error: Error,
    transient: bool,
}

/// Download manager. Cheap to clone; one instance is shared across the
/// worker tasks of a run.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
    concurrency: usize,
    max_retries: u32,
    backoff: Duration,
}

impl Downloader {
    pub fn new(concurrency: usize, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("artman/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::Network {
                url: String::new(),
                reason: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            client,
            concurrency: concurrency.max(1),
            max_retries: max_retries.max(1),
            backoff: Duration::from_secs(1),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES)
    }

    /// Fetch every `Pending` tool in the registry into `cache_dir`.
    ///
    /// Each spawned task owns exactly one [`Tool`] for the duration of its
    /// download, so tool state needs no locking; updated records are
    /// merged back into the registry as tasks complete.
    pub async fn download_all(
        &self,
        registry: &mut ToolRegistry,
        cache_dir: &Path,
    ) -> DownloadReport {
        let pending = registry.take_pending();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::new();

        for tool in pending {
            let downloader = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let cache_dir = cache_dir.to_path_buf();

            tasks.push(tokio::spawn(async move {
                // the semaphore is never closed during a run; a failed
                // acquire only means the task runs unthrottled
                let _permit = semaphore.acquire_owned().await.ok();
                downloader.fetch_tool(tool, &cache_dir).await
            }));
        }

        let mut report = DownloadReport::default();

        for task in tasks {
            match task.await {
                Ok((tool, error)) => {
                    report.outcomes.push(DownloadOutcome {
                        name: tool.name.clone(),
                        status: tool.status,
                        error,
                    });
                    registry.restore(tool);
                }
                Err(err) => {
                    warn!(%err, "download task aborted");
                }
            }
        }

        report
    }

    /// Drive one tool from `Pending` to a terminal state.
    async fn fetch_tool(&self, mut tool: Tool, cache_dir: &Path) -> (Tool, Option<Error>) {
        if let Some((path, hash)) = cached_copy(&tool, cache_dir) {
            debug!(tool = %tool.name, path = %path.display(), "cache hit");
            tool.status = DownloadStatus::Skipped;
            tool.local_path = Some(path);
            tool.actual_hash = Some(hash);
            return (tool, None);
        }

        let Some(url) = tool.url.clone() else {
            tool.status = DownloadStatus::Failed;
            let error = Error::MissingUrl {
                name: tool.name.clone(),
            };
            return (tool, Some(error));
        };

        tool.status = DownloadStatus::InProgress;

        let dest_dir = cache_path(cache_dir, &tool)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cache_dir.to_path_buf());

        if let Err(err) = std::fs::create_dir_all(&dest_dir) {
            tool.status = DownloadStatus::Failed;
            return (tool, Some(Error::Io(err)));
        }

        let expected = tool.expected_hash.clone();
        match self
            .fetch_with_retry(&tool.name, &url, expected.as_deref(), &dest_dir)
            .await
        {
            Ok((path, hash)) => {
                tool.status = DownloadStatus::Verified;
                tool.local_path = Some(path);
                tool.actual_hash = Some(hash);
                (tool, None)
            }
            Err(error) => {
                tool.status = DownloadStatus::Failed;
                (tool, Some(error))
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        name: &str,
        url: &str,
        expected_hash: Option<&str>,
        dest_dir: &Path,
    ) -> Result<(PathBuf, String)> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.try_fetch(name, url, expected_hash, dest_dir).await {
                Ok(done) => return Ok(done),
                // max_retries counts retries after the initial attempt,
                // so the default of 3 gives the 1s/2s/4s backoff schedule
                Err(failure) if failure.transient && attempt <= self.max_retries => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        tool = name,
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %failure.error,
                        "transient download failure, retrying"
                    );
                    sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    /// One download attempt: stream the body to a temp file in the
    /// destination directory, hash while writing, verify, then persist
    /// via atomic rename. A partial body never appears at the final path.
    async fn try_fetch(
        &self,
        name: &str,
        url: &str,
        expected_hash: Option<&str>,
        dest_dir: &Path,
    ) -> std::result::Result<(PathBuf, String), FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchFailure {
                transient: err.is_timeout() || err.is_connect(),
                error: Error::Network {
                    url: url.to_string(),
                    reason: err.to_string(),
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure {
                transient: status.is_server_error(),
                error: Error::Network {
                    url: url.to_string(),
                    reason: format!("http status {status}"),
                },
            });
        }

        let final_path = dest_dir.join(remote_file_name(url, name));

        let mut temp = NamedTempFile::new_in(dest_dir).map_err(|err| FetchFailure {
            transient: false,
            error: Error::Io(err),
        })?;

        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| FetchFailure {
                transient: true,
                error: Error::Network {
                    url: url.to_string(),
                    reason: format!("body read failed: {err}"),
                },
            })?;

            hasher.input(&chunk);
            temp.write_all(&chunk).map_err(|err| FetchFailure {
                transient: false,
                error: Error::Io(err),
            })?;
        }

        let actual = hasher.result_str();

        if let Some(expected) = expected_hash {
            if !expected.eq_ignore_ascii_case(&actual) {
                // temp file is dropped and removed; nothing reaches final_path
                return Err(FetchFailure {
                    transient: false,
                    error: Error::HashMismatch {
                        name: name.to_string(),
                        expected: expected.to_string(),
                        actual,
                    },
                });
            }
        }

        temp.flush().map_err(|err| FetchFailure {
            transient: false,
            error: Error::Io(err),
        })?;

        temp.persist(&final_path).map_err(|err| FetchFailure {
            transient: false,
            error: Error::Io(err.error),
        })?;

        Ok((final_path, actual))
    }
}

/// Deterministic cache location for a tool.
pub fn cache_path(cache_dir: &Path, tool: &Tool) -> PathBuf {
    let version = tool.version.as_deref().unwrap_or("latest");
    let file_name = tool
        .url
        .as_deref()
        .map(|url| remote_file_name(url, &tool.name))
        .unwrap_or_else(|| tool.name.clone());

    cache_dir.join(&tool.name).join(version).join(file_name)
}

fn remote_file_name(url: &str, fallback: &str) -> String {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');

    match trimmed.rsplit('/').next() {
        Some(name) if !name.is_empty() && !name.contains(':') => name.to_string(),
        _ => fallback.to_string(),
    }
}

/// Returns the cached file and its hash when a valid copy already exists.
/// An unreadable or hash-mismatched cache entry counts as absent.
fn cached_copy(tool: &Tool, cache_dir: &Path) -> Option<(PathBuf, String)> {
    let path = cache_path(cache_dir, tool);

    if !path.is_file() {
        return None;
    }

    let actual = hash_file(&path).ok()?;

    match &tool.expected_hash {
        Some(expected) if !expected.eq_ignore_ascii_case(&actual) => None,
        _ => Some((path, actual)),
    }
}

/// Walk the registry and mark every `Pending` tool with a valid cached
/// copy as `Skipped`, without touching the network. Lets the package
/// assembler run against a warm cache in a process that never fetched.
pub fn mark_cached(registry: &mut ToolRegistry, cache_dir: &Path) -> usize {
    let pending = registry.take_pending();
    let mut marked = 0;

    for mut tool in pending {
        if let Some((path, hash)) = cached_copy(&tool, cache_dir) {
            tool.status = DownloadStatus::Skipped;
            tool.local_path = Some(path);
            tool.actual_hash = Some(hash);
            marked += 1;
        }
        registry.restore(tool);
    }

    marked
}

/// SHA-256 of a file's content, hex encoded.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.input(&buffer[..read]);
    }

    Ok(hasher.result_str())
}
