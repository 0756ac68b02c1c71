//! Errors from shaping CMS documents into display models

use thiserror::Error;

use crate::cms::CmsError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no {doc_type} document with uid {slug:?}")]
    NotFound { doc_type: String, slug: String },

    #[error("document {document} is missing required field `{field}`")]
    MissingField { document: String, field: String },

    #[error("document {document} has an unreadable publication date {value:?}")]
    InvalidDate { document: String, value: String },

    #[error(transparent)]
    Cms(#[from] CmsError),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
