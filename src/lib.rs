//! spacetraveling: a blog served from a Prismic repository
//!
//! Posts are fetched from the CMS, rendered with Tera templates and either
//! served on demand with periodic regeneration or exported as static files.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pages;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use cms::{Backend, Repository};
use i18n::I18n;
use pages::Pages;

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();
        config.validate()?;

        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        })
    }

    /// Interface strings, with overrides from `languages/` merged in
    pub fn i18n(&self) -> Result<I18n> {
        let mut i18n = I18n::new(&self.config.language)?;
        i18n.load_languages(self.base_dir.join("languages"))?;
        Ok(i18n)
    }

    /// CMS backend: a fixture dump when `fixtures` is given, Prismic otherwise
    pub fn repository(&self, fixtures: Option<&Path>) -> Result<Backend> {
        let fixtures = fixtures.map(|path| self.base_dir.join(path));
        Backend::from_config(&self.config.prismic, fixtures.as_deref())
    }

    /// Page builders over `repo`
    pub fn pages<R: Repository>(&self, repo: R) -> Result<Pages<R>> {
        Pages::new(repo, &self.config, self.i18n()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_without_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let blog = Blog::new(temp.path()).unwrap();
        assert_eq!(blog.config.title, "spacetraveling");
        assert_eq!(blog.public_dir, temp.path().join("public"));
        assert_eq!(blog.static_dir, temp.path().join("static"));
    }

    #[test]
    fn test_new_reads_config_and_languages() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("_config.yml"),
            "title: My Blog\npublic_dir: out\nlisting:\n  page_size: 5\n",
        )
        .unwrap();
        fs::create_dir_all(temp.path().join("languages")).unwrap();
        fs::write(
            temp.path().join("languages").join("pt-BR.yml"),
            "listing:\n  load_more: Mais posts\n",
        )
        .unwrap();

        let blog = Blog::new(temp.path()).unwrap();
        assert_eq!(blog.config.title, "My Blog");
        assert_eq!(blog.config.listing.page_size, 5);
        assert_eq!(blog.public_dir, temp.path().join("out"));

        let i18n = blog.i18n().unwrap();
        assert_eq!(i18n.get("listing.load_more"), "Mais posts");
        assert_eq!(i18n.get("post.loading"), "Carregando...");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("_config.yml"), "listing:\n  page_size: 0\n").unwrap();
        assert!(Blog::new(temp.path()).is_err());
    }
}
