use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Closed error taxonomy for the artifact tool manager.
///
/// Recoverable failures (a single malformed definition file, a single
/// tool that fails to download) are accumulated into reports by the
/// operation that encountered them; only path-level misconfiguration
/// and destructive output collisions abort a whole operation.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("artifact path not found: {path}")]
    #[diagnostic(help("check that the scan root exists and is readable"))]
    NotFound { path: PathBuf },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid include pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("hash mismatch for {name}: expected {expected}, got {actual}")]
    #[diagnostic(help("the upstream binary changed or the declared hash is stale"))]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("tool {name} has no download url")]
    MissingUrl { name: String },

    #[error("output path collision: {path} claimed by {first} and {second}")]
    AssemblyCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
