//! Display models built from CMS documents

use serde::{Deserialize, Serialize};

use super::richtext::RichTextBlock;

/// A post as listed on the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    /// Already formatted for display, e.g. `15 mar 2021`
    pub first_publication_date: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of post summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsPage {
    pub results: Vec<PostSummary>,
    /// Cursor of the next page; `None` when this is the last one
    pub next_page: Option<String>,
}

impl PostsPage {
    /// Replace the cursor with whatever URL the client should call for more
    pub fn with_next_link<F>(mut self, link: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        self.next_page = self.next_page.as_deref().map(link);
        self
    }
}

/// A titled section of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// May be empty
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: Vec<RichTextBlock>,
}

/// A fully resolved post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    /// Sections in authored order
    pub content: Vec<ContentBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_next_link() {
        let page = PostsPage {
            results: Vec::new(),
            next_page: Some("cursor".to_string()),
        };
        let page = page.with_next_link(|c| format!("/more?c={}", c));
        assert_eq!(page.next_page.as_deref(), Some("/more?c=cursor"));

        let last = PostsPage {
            results: Vec::new(),
            next_page: None,
        };
        assert_eq!(last.with_next_link(|c| c.to_string()).next_page, None);
    }
}
