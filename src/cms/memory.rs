//! In-memory repository over a fixed document list

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::{CmsError, Document, Predicate, QueryOptions, QueryResponse, Repository};

/// Default page size of the Prismic API
const DEFAULT_PAGE_SIZE: usize = 20;

const CURSOR_PREFIX: &str = "memory://search";

/// Documents loaded from a JSON dump (a document array or a search response)
#[derive(Deserialize)]
#[serde(untagged)]
enum Dump {
    Documents(Vec<Document>),
    Response(QueryResponse),
}

/// Repository answering queries from memory, paged like the real API
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    documents: Vec<Document>,
}

impl MemoryRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures {:?}", path))?;
        let dump: Dump = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures {:?}", path))?;

        let documents = match dump {
            Dump::Documents(documents) => documents,
            Dump::Response(response) => response.results,
        };
        tracing::debug!("Loaded {} fixture documents", documents.len());
        Ok(Self::new(documents))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn search(&self, predicates: &[Predicate], options: &QueryOptions) -> QueryResponse {
        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = options.page.unwrap_or(1).max(1);

        let matching: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| predicates.iter().all(|p| matches(doc, p)))
            .collect();

        let total = matching.len();
        let total_pages = total.div_ceil(page_size);
        // Pages past the end are empty, however far past
        let offset = (page - 1).checked_mul(page_size).unwrap_or(usize::MAX);
        let results = matching
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(|doc| restrict_fields(doc, &options.fetch))
            .collect();

        let cursor_for = |page: usize| {
            let mut next = options.clone();
            next.page = Some(page);
            encode_cursor(predicates, &next)
        };

        QueryResponse {
            page,
            results_per_page: page_size,
            total_results_size: total,
            total_pages,
            next_page: (page < total_pages).then(|| cursor_for(page + 1)),
            prev_page: (page > 1 && page - 1 <= total_pages).then(|| cursor_for(page - 1)),
            results,
        }
    }
}

impl Repository for MemoryRepository {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError> {
        Ok(self.search(predicates, options))
    }

    async fn query_cursor(&self, cursor: &str) -> Result<QueryResponse, CmsError> {
        let (predicates, options) = decode_cursor(cursor)?;
        Ok(self.search(&predicates, &options))
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => {
            let mut parts = path.splitn(3, '.');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("document"), Some("type"), None) => doc.doc_type == *value,
                (Some("document"), Some("id"), None) => doc.id == *value,
                (Some("my"), Some(doc_type), Some("uid")) => {
                    doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str())
                }
                (Some("my"), Some(doc_type), Some(field)) => {
                    doc.doc_type == doc_type && doc.data[field].as_str() == Some(value.as_str())
                }
                _ => false,
            }
        }
    }
}

/// Apply a `fetch` list (`posts.title`, ...) to a document's data
fn restrict_fields(doc: &Document, fetch: &[String]) -> Document {
    let mut doc = doc.clone();
    if fetch.is_empty() {
        return doc;
    }

    if let serde_json::Value::Object(data) = &mut doc.data {
        let prefix = format!("{}.", doc.doc_type);
        data.retain(|key, _| {
            fetch
                .iter()
                .any(|f| f.strip_prefix(&prefix) == Some(key.as_str()))
        });
    }
    doc
}

fn encode_cursor(predicates: &[Predicate], options: &QueryOptions) -> String {
    let mut pairs: Vec<(&str, String)> = predicates
        .iter()
        .map(|Predicate::At { path, value }| ("at", format!("{}={}", path, value)))
        .collect();
    if !options.fetch.is_empty() {
        pairs.push(("fetch", options.fetch.join(",")));
    }
    if let Some(page_size) = options.page_size {
        pairs.push(("pageSize", page_size.to_string()));
    }
    if let Some(page) = options.page {
        pairs.push(("page", page.to_string()));
    }

    let query: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(&value, NON_ALPHANUMERIC)))
        .collect();
    format!("{}?{}", CURSOR_PREFIX, query.join("&"))
}

fn decode_cursor(cursor: &str) -> Result<(Vec<Predicate>, QueryOptions), CmsError> {
    let foreign = || CmsError::ForeignCursor(cursor.to_string());
    if !cursor.starts_with(CURSOR_PREFIX) {
        return Err(foreign());
    }
    let url = Url::parse(cursor).map_err(|_| foreign())?;

    let mut predicates = Vec::new();
    let mut options = QueryOptions::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "at" => {
                let (path, value) = value.split_once('=').ok_or_else(foreign)?;
                predicates.push(Predicate::at(path, value));
            }
            "fetch" => {
                options.fetch = value.split(',').map(String::from).collect();
            }
            "pageSize" => options.page_size = Some(value.parse().map_err(|_| foreign())?),
            "page" => options.page = Some(value.parse().map_err(|_| foreign())?),
            _ => return Err(foreign()),
        }
    }
    Ok((predicates, options))
}
