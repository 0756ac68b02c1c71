//! Raw CMS documents and query responses, as returned by the API

use serde::{Deserialize, Serialize};

/// A dynamically shaped CMS document
///
/// `data` is narrowed into typed models by the fetchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Document {
    /// A document with empty data, mostly useful for fixtures
    pub fn new(id: &str, doc_type: &str, uid: &str) -> Self {
        Self {
            id: id.to_string(),
            uid: Some(uid.to_string()),
            doc_type: doc_type.to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Identifier for error messages: the UID when present
    pub fn label(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub total_pages: usize,
    /// Cursor of the following page; `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
}
