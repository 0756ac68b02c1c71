//! Post Summary Fetcher and Post Detail Fetcher
//!
//! Each operation issues its CMS query and narrows the untyped documents into
//! [`PostSummary`] / [`PostDetail`], failing on missing required fields.

use serde_json::Value;

use super::error::FetchError;
use super::post::{ContentBlock, PostDetail, PostSummary, PostsPage};
use super::richtext::{as_text, RichTextBlock};
use crate::cms::{Document, Predicate, QueryOptions, QueryResponse, Repository};
use crate::helpers::DateFormatter;

/// Fields the listing needs
const SUMMARY_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// Largest page size the CMS accepts, used when walking every document
const ENUMERATION_PAGE_SIZE: usize = 100;

/// Fetches posts of one document type and shapes them for display
pub struct PostFetcher<R> {
    repo: R,
    doc_type: String,
    page_size: usize,
    dates: DateFormatter,
}

impl<R: Repository> PostFetcher<R> {
    pub fn new(repo: R, doc_type: &str, page_size: usize, dates: DateFormatter) -> Self {
        Self {
            repo,
            doc_type: doc_type.to_string(),
            page_size: page_size.max(1),
            dates,
        }
    }

    fn type_predicate(&self) -> [Predicate; 1] {
        [Predicate::at("document.type", self.doc_type.as_str())]
    }

    /// First page of the listing, in CMS order
    pub async fn fetch_summaries(&self) -> Result<PostsPage, FetchError> {
        let options = QueryOptions::new()
            .fetch(&self.doc_type, SUMMARY_FIELDS)
            .page_size(self.page_size);
        let response = self.repo.query(&self.type_predicate(), &options).await?;
        tracing::debug!(
            "Fetched {} of {} {} documents",
            response.results.len(),
            response.total_results_size,
            self.doc_type
        );
        self.summaries_page(response)
    }

    /// The page a `next_page` cursor points at
    pub async fn fetch_more(&self, cursor: &str) -> Result<PostsPage, FetchError> {
        let response = self.repo.query_cursor(cursor).await?;
        self.summaries_page(response)
    }

    /// UIDs of every post, following cursors to the end
    pub async fn enumerate_slugs(&self) -> Result<Vec<String>, FetchError> {
        let options = QueryOptions::new()
            .fetch(&self.doc_type, ["title"])
            .page_size(ENUMERATION_PAGE_SIZE);
        let mut response = self.repo.query(&self.type_predicate(), &options).await?;
        let mut slugs = Vec::new();

        loop {
            for doc in &response.results {
                slugs.push(required_uid(doc)?);
            }
            match response.next_page.take() {
                Some(cursor) => response = self.repo.query_cursor(&cursor).await?,
                None => break,
            }
        }

        tracing::debug!("Enumerated {} {} slugs", slugs.len(), self.doc_type);
        Ok(slugs)
    }

    /// Resolve a single post by slug
    pub async fn fetch_post(&self, slug: &str) -> Result<PostDetail, FetchError> {
        let doc = self
            .repo
            .get_by_uid(&self.doc_type, slug)
            .await?
            .ok_or_else(|| FetchError::NotFound {
                doc_type: self.doc_type.clone(),
                slug: slug.to_string(),
            })?;
        self.detail(&doc)
    }

    fn summaries_page(&self, response: QueryResponse) -> Result<PostsPage, FetchError> {
        let results = response
            .results
            .iter()
            .map(|doc| self.summary(doc))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PostsPage {
            results,
            next_page: response.next_page,
        })
    }

    fn summary(&self, doc: &Document) -> Result<PostSummary, FetchError> {
        Ok(PostSummary {
            uid: required_uid(doc)?,
            first_publication_date: self.publication_date(doc)?,
            title: text_field(doc, "title")?,
            subtitle: text_field(doc, "subtitle")?,
            author: text_field(doc, "author")?,
        })
    }

    fn detail(&self, doc: &Document) -> Result<PostDetail, FetchError> {
        let banner_url = doc.data["banner"]["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| missing(doc, "banner.url"))?;

        Ok(PostDetail {
            uid: required_uid(doc)?,
            first_publication_date: self.publication_date(doc)?,
            title: text_field(doc, "title")?,
            banner_url,
            author: text_field(doc, "author")?,
            content: content_field(doc)?,
        })
    }

    fn publication_date(&self, doc: &Document) -> Result<String, FetchError> {
        let raw = doc
            .first_publication_date
            .as_deref()
            .ok_or_else(|| missing(doc, "first_publication_date"))?;
        self.dates
            .format_timestamp(raw)
            .ok_or_else(|| FetchError::InvalidDate {
                document: doc.label().to_string(),
                value: raw.to_string(),
            })
    }
}

fn missing(doc: &Document, field: &str) -> FetchError {
    FetchError::MissingField {
        document: doc.label().to_string(),
        field: field.to_string(),
    }
}

fn required_uid(doc: &Document) -> Result<String, FetchError> {
    doc.uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| missing(doc, "uid"))
}

/// A key text field, or a title field stored as rich text
fn text_field(doc: &Document, field: &str) -> Result<String, FetchError> {
    match &doc.data[field] {
        Value::String(s) => Ok(s.clone()),
        value @ Value::Array(_) => {
            let blocks: Vec<RichTextBlock> =
                serde_json::from_value(value.clone()).map_err(|_| missing(doc, field))?;
            Ok(as_text(&blocks))
        }
        _ => Err(missing(doc, field)),
    }
}

fn content_field(doc: &Document) -> Result<Vec<ContentBlock>, FetchError> {
    let Value::Array(sections) = &doc.data["content"] else {
        return Err(missing(doc, "content"));
    };

    sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let heading = match &section["heading"] {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                value @ Value::Array(_) => serde_json::from_value::<Vec<RichTextBlock>>(value.clone())
                    .map(|blocks| as_text(&blocks))
                    .map_err(|_| missing(doc, &format!("content[{}].heading", i)))?,
                _ => return Err(missing(doc, &format!("content[{}].heading", i))),
            };
            let body = match &section["body"] {
                Value::Null => Vec::new(),
                value => serde_json::from_value(value.clone())
                    .map_err(|_| missing(doc, &format!("content[{}].body", i)))?,
            };
            Ok(ContentBlock { heading, body })
        })
        .collect()
}
