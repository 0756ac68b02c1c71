//! Prismic REST API (v2) client

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{CmsError, Predicate, QueryOptions, QueryResponse, Repository};
use crate::config::PrismicConfig;

/// API entry document; only the refs matter here
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Stateless Prismic client
///
/// No retries and no caching: every query resolves the current master ref and
/// then searches. Transport failures surface as [`CmsError`].
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    /// Build a client for the configured endpoint and credentials
    pub fn new(config: &PrismicConfig) -> Result<Self, CmsError> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|_| CmsError::InvalidEndpoint(config.endpoint.clone()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CmsError::InvalidEndpoint(config.endpoint.clone()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CmsError::Transport {
                url: config.endpoint.clone(),
                source,
            })?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone(),
        })
    }

    /// Current master ref of the repository
    async fn master_ref(&self) -> Result<String, CmsError> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let info: ApiInfo = self.get_json(url).await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| CmsError::MissingMasterRef(self.endpoint.to_string()))
    }

    /// `{endpoint}/documents/search` with the query parameters filled in
    fn search_url(
        &self,
        master_ref: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Url, CmsError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CmsError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", master_ref);
            if !predicates.is_empty() {
                query.append_pair("q", &Predicate::to_query(predicates));
            }
            if !options.fetch.is_empty() {
                query.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(page_size) = options.page_size {
                query.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page) = options.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }

        Ok(url)
    }

    /// Validate a cursor against the endpoint and add credentials if missing
    fn cursor_url(&self, cursor: &str) -> Result<Url, CmsError> {
        let foreign = || CmsError::ForeignCursor(cursor.to_string());
        let mut url = Url::parse(cursor).map_err(|_| foreign())?;

        let base_path = self.endpoint.path().trim_end_matches('/');
        let under_base = url
            .path()
            .strip_prefix(base_path)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if url.scheme() != self.endpoint.scheme()
            || url.host_str() != self.endpoint.host_str()
            || url.port_or_known_default() != self.endpoint.port_or_known_default()
            || !under_base
        {
            return Err(foreign());
        }

        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CmsError> {
        let shown = redact(&url);
        tracing::debug!("GET {}", shown);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CmsError::Transport {
                url: shown.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| CmsError::Decode {
            url: shown,
            message: e.without_url().to_string(),
        })
    }
}

impl Repository for PrismicClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, CmsError> {
        let master_ref = self.master_ref().await?;
        let url = self.search_url(&master_ref, predicates, options)?;
        self.get_json(url).await
    }

    async fn query_cursor(&self, cursor: &str) -> Result<QueryResponse, CmsError> {
        let url = self.cursor_url(cursor)?;
        self.get_json(url).await
    }
}

/// URL for logs and errors, without the access token
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    if pairs.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}
