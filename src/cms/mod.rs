//! CMS Client Adapter
//!
//! Everything the fetchers know about the content repository goes through
//! [`Repository`]: a predicate query, a lookup by UID and following an opaque
//! `next_page` cursor. [`PrismicClient`] talks to the Prismic REST API and
//! [`MemoryRepository`] serves a fixed set of documents for previews and tests.

mod document;
mod error;
mod memory;
mod predicate;
mod prismic;

use std::future::Future;
use std::path::Path;

pub use document::{Document, QueryResponse};
pub use error::CmsError;
pub use memory::MemoryRepository;
pub use predicate::Predicate;
pub use prismic::PrismicClient;

use crate::config::PrismicConfig;

/// Options of a predicate query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Restrict document data to these fields (`posts.title`, ...); empty means all
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    /// 1-based page number
    pub page: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch only `fields` of documents of type `doc_type`
    pub fn fetch<I, S>(mut self, doc_type: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fetch = fields
            .into_iter()
            .map(|f| format!("{}.{}", doc_type, f.as_ref()))
            .collect();
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

/// Query-capable handle on a content repository
pub trait Repository: Send + Sync {
    /// Run a predicate query
    fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> impl Future<Output = Result<QueryResponse, CmsError>> + Send;

    /// Follow a `next_page` cursor returned by an earlier query
    fn query_cursor(
        &self,
        cursor: &str,
    ) -> impl Future<Output = Result<QueryResponse, CmsError>> + Send;

    /// Look up a single document of `doc_type` by its UID
    fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> impl Future<Output = Result<Option<Document>, CmsError>> + Send {
        async move {
            let predicates = [Predicate::at(format!("my.{}.uid", doc_type), uid)];
            let options = QueryOptions::new().page_size(1);
            let response = self.query(&predicates, &options).await?;
            Ok(response.results.into_iter().next())
        }
    }
}

/// The repository selected at startup
pub enum Backend {
    Prismic(PrismicClient),
    Memory(MemoryRepository),
}

impl Backend {
    /// Fixture documents when `fixtures` is given, the Prismic API otherwise
    pub fn from_config(config: &PrismicConfig, fixtures: Option<&Path>) -> anyhow::Result<Self> {
        match fixtures {
            Some(path) => {
                tracing::info!("Serving CMS documents from {:?}", path);
                Ok(Backend::Memory(MemoryRepository::load(path)?))
            }
            None => {
                tracing::info!("Using Prismic repository at {}", config.endpoint);
                Ok(Backend::Prismic(PrismicClient::new(config)?))
            }
        }
    }
}

impl Repository for Backend {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError> {
        match self {
            Backend::Prismic(client) => client.query(predicates, options).await,
            Backend::Memory(repo) => repo.query(predicates, options).await,
        }
    }

    async fn query_cursor(&self, cursor: &str) -> Result<QueryResponse, CmsError> {
        match self {
            Backend::Prismic(client) => client.query_cursor(cursor).await,
            Backend::Memory(repo) => repo.query_cursor(cursor).await,
        }
    }
}
