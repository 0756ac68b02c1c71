//! Page builders: bind fetched posts to templates
//!
//! Both the server and the static generator go through [`Pages`], so a page
//! looks the same whichever way it was produced.

use anyhow::Result;
use tera::Context;

use crate::cms::Repository;
use crate::config::SiteConfig;
use crate::content::{as_html, reading_time, PostDetail, PostFetcher, PostsPage};
use crate::helpers::DateFormatter;
use crate::i18n::I18n;
use crate::templates::{PostView, SectionView, SiteData, TemplateRenderer};

/// Renders the listing, detail and status pages of the blog
pub struct Pages<R> {
    fetcher: PostFetcher<R>,
    renderer: TemplateRenderer,
    i18n: I18n,
    site: SiteData,
    words_per_minute: usize,
}

impl<R: Repository> Pages<R> {
    /// Wire fetcher, templates and strings together from the site config
    pub fn new(repo: R, config: &SiteConfig, i18n: I18n) -> Result<Self> {
        let dates = DateFormatter::new(config.tz()?, i18n.month_abbreviations()?);
        let fetcher = PostFetcher::new(
            repo,
            &config.prismic.document_type,
            config.listing.page_size,
            dates,
        );

        Ok(Self {
            fetcher,
            renderer: TemplateRenderer::new()?,
            site: SiteData {
                title: config.title.clone(),
                language: i18n.language().to_string(),
            },
            i18n,
            words_per_minute: config.post.words_per_minute,
        })
    }

    pub fn fetcher(&self) -> &PostFetcher<R> {
        &self.fetcher
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("t", &self.i18n.as_value());
        context
    }

    /// Listing page; the load-more button only appears when `load_more` is set
    pub fn render_home(&self, page: &PostsPage, load_more: Option<&str>) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", &page.results);
        context.insert("load_more", &load_more);
        self.renderer.render("index.html", &context)
    }

    /// Detail page with the computed reading time
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &self.post_view(post));
        self.renderer.render("post.html", &context)
    }

    /// Placeholder shown while a page is generated in the background
    pub fn render_loading(&self, retry_after_secs: u64) -> Result<String> {
        let mut context = self.base_context();
        context.insert("retry_after", &retry_after_secs);
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context())
    }

    pub fn render_error(&self) -> Result<String> {
        self.renderer.render("error.html", &self.base_context())
    }

    fn post_view(&self, post: &PostDetail) -> PostView {
        let minutes = reading_time(&post.content, self.words_per_minute);
        PostView {
            title: post.title.clone(),
            banner_url: post.banner_url.clone(),
            date: post.first_publication_date.clone(),
            author: post.author.clone(),
            reading_time: self.i18n.get_count("post.reading_time", minutes),
            sections: post
                .content
                .iter()
                .map(|block| SectionView {
                    heading: block.heading.clone(),
                    html: as_html(&block.body),
                })
                .collect(),
        }
    }

    /// Fetch the first listing page and render it; `link` turns the cursor
    /// into the URL the load-more button calls
    pub async fn build_home<F>(&self, link: F) -> Result<String>
    where
        F: FnOnce(&str) -> String,
    {
        let page = self.fetcher.fetch_summaries().await?;
        let load_more = page.next_page.as_deref().map(link);
        self.render_home(&page, load_more.as_deref())
    }

    /// Fetch and render one post; `None` when the slug does not exist
    pub async fn build_post(&self, slug: &str) -> Result<Option<String>> {
        match self.fetcher.fetch_post(slug).await {
            Ok(post) => Ok(Some(self.render_post(&post)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cms::{Document, MemoryRepository};
    use serde_json::json;

    /// Two posts, newest first, with enough words for a 2 minute read
    pub(crate) fn fixture_repository() -> MemoryRepository {
        let long_body = vec!["palavra"; 250].join(" ");
        let mut docs = Vec::new();
        for (id, uid, title, date) in [
            ("1", "como-utilizar-hooks", "Como utilizar Hooks", "2021-03-15T19:25:28+0000"),
            ("2", "criando-um-app-cra-do-zero", "Criando um app CRA do zero", "2021-03-25T19:27:35+0000"),
        ] {
            let mut doc = Document::new(id, "posts", uid);
            doc.first_publication_date = Some(date.to_string());
            doc.data = json!({
                "title": title,
                "subtitle": "Pensando em sincronização em vez de ciclos de vida.",
                "author": "Joseph Oliveira",
                "banner": {"url": "https://images.prismic.io/criando-app.png"},
                "content": [
                    {"heading": "Proin et varius", "body": [
                        {"type": "paragraph", "text": long_body, "spans": []}
                    ]},
                    {"heading": "", "body": [
                        {"type": "paragraph", "text": "Nullam <b>dolor</b> sit amet", "spans": [
                            {"start": 0, "end": 6, "type": "strong"}
                        ]}
                    ]}
                ]
            });
            docs.push(doc);
        }
        MemoryRepository::new(docs)
    }

    pub(crate) fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.timezone = "UTC".to_string();
        config
    }

    pub(crate) fn pages() -> Pages<MemoryRepository> {
        let config = test_config();
        let i18n = I18n::new(&config.language).unwrap();
        Pages::new(fixture_repository(), &config, i18n).unwrap()
    }

    #[tokio::test]
    async fn test_build_home_with_load_more() {
        let pages = pages();
        let html = pages
            .build_home(|cursor| format!("/more?c={}", cursor.len()))
            .await
            .unwrap();
        assert!(html.contains("Como utilizar Hooks"));
        assert!(!html.contains("Criando um app CRA do zero"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("data-next=\"&#x2F;more?c=") || html.contains("data-next=\"/more?c="));
    }

    #[test]
    fn test_render_home_without_next_page() {
        let pages = pages();
        let page = PostsPage {
            results: Vec::new(),
            next_page: None,
        };
        let html = pages.render_home(&page, None).unwrap();
        assert!(!html.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_build_post() {
        let pages = pages();
        let html = pages
            .build_post("como-utilizar-hooks")
            .await
            .unwrap()
            .expect("post exists");
        assert!(html.contains("<h1>Como utilizar Hooks</h1>"));
        assert!(html.contains("criando-app.png"));
        // 3 heading words + 250 + 4 body words
        assert!(html.contains("2 min"));
        assert!(html.contains("<h2>Proin et varius</h2>"));
        assert_eq!(html.matches("<h2>").count(), 1);
        // Markup typed into the CMS stays text
        assert!(html.contains("<strong>Nullam</strong> &lt;b&gt;dolor&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn test_build_post_not_found() {
        let pages = pages();
        assert!(pages.build_post("nope").await.unwrap().is_none());
    }

    #[test]
    fn test_status_pages() {
        let pages = pages();
        assert!(pages.render_loading(1).unwrap().contains("Carregando..."));
        assert!(pages
            .render_not_found()
            .unwrap()
            .contains("Post não encontrado"));
        assert!(pages.render_error().unwrap().contains("Algo deu errado"));
    }
}
