//! CMS transport errors

use thiserror::Error;

/// Failure talking to the content repository
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("invalid repository endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("repository {0} has no master ref")]
    MissingMasterRef(String),

    #[error("cursor {0:?} does not belong to this repository")]
    ForeignCursor(String),
}
