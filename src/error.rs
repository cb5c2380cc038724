// Error types for each layer of the importer. The binary maps `RunError`
// onto process exit codes so scripts can tell fatal categories apart.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the remote collection service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status. `detail` is the most
    /// specific message found in the response body.
    #[error("server returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("could not decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read upload file {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid server url '{0}'")]
    BaseUrl(String),

    /// A delete was acknowledged but the resource is still listed.
    #[error("server still lists {what} {id} after deleting it")]
    NotDeleted { what: &'static str, id: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Build a `Status` error, pulling the most useful message out of an
    /// error body. API Platform answers with `detail` or
    /// `hydra:description`; the login endpoint uses `message`.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["detail", "hydra:description", "message"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(|d| d.as_str()).map(str::to_owned))
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("no response body")
                        .to_owned()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });
        ApiError::Status { status, detail }
    }
}

/// Failure while reading records from the items directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error decoding {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure importing a single item. The item is abandoned; anything already
/// created remotely stays where it is.
#[derive(Debug, Error)]
pub enum ImportError {
    /// `item_id` is set once the remote item exists, so the partial item
    /// can be found and cleaned up by hand.
    #[error("failed to {step}: {source}")]
    Remote {
        step: String,
        item_id: Option<String>,
        #[source]
        source: ApiError,
    },

    #[error("item has no pictures to use as its primary photo")]
    NoPictures,

    #[error("primary photo index {index} is out of range for {count} pictures")]
    PhotoIndexOutOfRange { index: i64, count: usize },

    #[error("primary photo {index} has no filename")]
    PhotoWithoutFilename { index: usize },
}

impl ImportError {
    pub(crate) fn remote(step: impl Into<String>, source: ApiError) -> Self {
        ImportError::Remote {
            step: step.into(),
            item_id: None,
            source,
        }
    }

    pub(crate) fn on_item(item_id: &str, step: impl Into<String>, source: ApiError) -> Self {
        ImportError::Remote {
            step: step.into(),
            item_id: Some(item_id.to_owned()),
            source,
        }
    }

    /// Id of the remote item left behind by a failed import, if any.
    pub fn orphan(&self) -> Option<&str> {
        match self {
            ImportError::Remote { item_id, .. } => item_id.as_deref(),
            _ => None,
        }
    }

    /// True for problems with the local record rather than the server.
    pub fn is_config(&self) -> bool {
        !matches!(self, ImportError::Remote { .. })
    }
}

/// Fatal outcome of a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("login failed: {0}")]
    Auth(#[source] ApiError),

    #[error("failed to delete all data: {0}")]
    Delete(#[source] ApiError),

    #[error("failed to find or create collection '{name}': {source}")]
    Collection {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to process items in directory {dir}: {source}")]
    Load {
        dir: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("failed to list items: {0}")]
    List(#[source] ApiError),

    #[error("{failed} of {total} items failed to import")]
    ItemsFailed { failed: usize, total: usize },
}

impl RunError {
    /// Process exit code for this category. Usage errors from clap exit
    /// with 2, so numbering starts above that.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Auth(_) => 3,
            RunError::Load { .. } => 4,
            RunError::Collection { .. } => 5,
            RunError::Delete(_) => 6,
            RunError::List(_) => 7,
            RunError::ItemsFailed { .. } => 8,
        }
    }
}
