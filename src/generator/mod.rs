//! Generator module - exports the blog as static files
//!
//! Layout of the output directory:
//! - `index.html`                 first listing page
//! - `api/posts/<n>.json`         listing page `n` (from 2), chained by `next_page`
//! - `post/<slug>/index.html`     one per enumerated post
//! - `404.html`
//! - everything under the static directory

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cms::Repository;
use crate::helpers::{is_safe_slug, static_page_url};
use crate::pages::Pages;

/// What a generation run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub listing_pages: usize,
    pub assets: usize,
}

/// Static site exporter
pub struct Generator<R> {
    pages: Pages<R>,
    public_dir: PathBuf,
    static_dir: PathBuf,
}

impl<R: Repository> Generator<R> {
    pub fn new(pages: Pages<R>, public_dir: PathBuf, static_dir: PathBuf) -> Self {
        Self {
            pages,
            public_dir,
            static_dir,
        }
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.public_dir)?;

        let assets = self.copy_static_assets()?;
        let listing_pages = self.generate_listing().await?;
        let posts = self.generate_post_pages().await?;

        let not_found = self.pages.render_not_found()?;
        write_file(&self.public_dir.join("404.html"), &not_found)?;

        Ok(GenerateStats {
            posts,
            listing_pages,
            assets,
        })
    }

    /// Write the home page, then every following page as JSON for load-more
    async fn generate_listing(&self) -> Result<usize> {
        let fetcher = self.pages.fetcher();
        let first = fetcher.fetch_summaries().await?;
        let mut cursor = first.next_page.clone();

        let load_more = cursor.as_ref().map(|_| static_page_url(2));
        let html = self.pages.render_home(&first, load_more.as_deref())?;
        write_file(&self.public_dir.join("index.html"), &html)?;

        let mut number = 1;
        while let Some(current) = cursor {
            number += 1;
            let page = fetcher.fetch_more(&current).await?;
            cursor = page.next_page.clone();

            let page = page.with_next_link(|_| static_page_url(number + 1));
            let output_path = self
                .public_dir
                .join("api")
                .join("posts")
                .join(format!("{}.json", number));
            write_file(&output_path, &serde_json::to_string(&page)?)?;
            tracing::debug!("Generated listing page {}", number);
        }

        Ok(number)
    }

    async fn generate_post_pages(&self) -> Result<usize> {
        let slugs = self.pages.fetcher().enumerate_slugs().await?;
        let mut generated = 0;

        for slug in slugs {
            if !is_safe_slug(&slug) {
                tracing::warn!("Skipping post with unusable slug {:?}", slug);
                continue;
            }
            let Some(html) = self.pages.build_post(&slug).await? else {
                tracing::warn!("Post {} disappeared during generation", slug);
                continue;
            };

            let output_path = self.public_dir.join("post").join(&slug).join("index.html");
            write_file(&output_path, &html)?;
            tracing::debug!("Generated post: {:?}", output_path);
            generated += 1;
        }

        Ok(generated)
    }

    /// Copy the static directory (styles, logo, ...) into the output
    fn copy_static_assets(&self) -> Result<usize> {
        if !self.static_dir.exists() {
            tracing::debug!("No static directory at {:?}", self.static_dir);
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.static_dir)?;
            let dest = self.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostsPage;
    use crate::pages::tests::pages;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generate_site() {
        let temp = TempDir::new().unwrap();
        let public_dir = temp.path().join("public");
        let static_dir = temp.path().join("static");
        fs::create_dir_all(static_dir.join("css")).unwrap();
        fs::write(static_dir.join("css").join("style.css"), "body {}").unwrap();

        let generator = Generator::new(pages(), public_dir.clone(), static_dir);
        let stats = generator.generate().await.unwrap();
        assert_eq!(
            stats,
            GenerateStats {
                posts: 2,
                listing_pages: 2,
                assets: 1,
            }
        );

        let index = fs::read_to_string(public_dir.join("index.html")).unwrap();
        assert!(index.contains("Como utilizar Hooks"));
        assert!(
            index.contains("data-next=\"/api/posts/2.json\"")
                || index.contains("data-next=\"&#x2F;api&#x2F;posts&#x2F;2.json\"")
        );

        let json = fs::read_to_string(public_dir.join("api/posts/2.json")).unwrap();
        let page: PostsPage = serde_json::from_str(&json).unwrap();
        assert_eq!(page.results[0].uid, "criando-um-app-cra-do-zero");
        assert!(page.next_page.is_none());
        assert!(!public_dir.join("api/posts/3.json").exists());

        let post =
            fs::read_to_string(public_dir.join("post/como-utilizar-hooks/index.html")).unwrap();
        assert!(post.contains("2 min"));
        assert!(public_dir
            .join("post/criando-um-app-cra-do-zero/index.html")
            .exists());
        assert!(public_dir.join("404.html").exists());
        assert_eq!(
            fs::read_to_string(public_dir.join("css/style.css")).unwrap(),
            "body {}"
        );
    }

    #[tokio::test]
    async fn test_generate_without_static_dir() {
        let temp = TempDir::new().unwrap();
        let generator = Generator::new(
            pages(),
            temp.path().join("public"),
            temp.path().join("missing"),
        );
        let stats = generator.generate().await.unwrap();
        assert_eq!(stats.assets, 0);
        assert!(temp.path().join("public/index.html").exists());
    }
}
