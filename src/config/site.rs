//! Site configuration (_config.yml)

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::content::DEFAULT_WORDS_PER_MINUTE;

/// Environment variable overriding `prismic.endpoint`
pub const ENV_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `prismic.access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content repository
    #[serde(default)]
    pub prismic: PrismicConfig,

    // Pages
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub post: PostConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            prismic: PrismicConfig::default(),

            listing: ListingConfig::default(),
            post: PostConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_ENDPOINT).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Using Prismic endpoint from {}", ENV_ENDPOINT);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Using Prismic access token from {}", ENV_ACCESS_TOKEN);
            self.prismic.access_token = Some(token);
        }
    }

    /// Reject values the fetchers and estimator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size == 0 {
            bail!("listing.page_size must be at least 1");
        }
        if self.post.words_per_minute == 0 {
            bail!("post.words_per_minute must be at least 1");
        }
        if self.prismic.document_type.trim().is_empty() {
            bail!("prismic.document_type must not be empty");
        }
        self.tz()?;
        Ok(())
    }

    /// Resolve the configured IANA timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", self.timezone, e))
    }
}

/// Prismic repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API entry point, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
        }
    }
}

/// Home page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
    /// Revalidation interval in seconds
    pub revalidate: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            revalidate: 60 * 30,
        }
    }
}

impl ListingConfig {
    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }
}

/// Post detail page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Revalidation interval in seconds
    pub revalidate: u64,
    pub fallback: FallbackMode,
    pub words_per_minute: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            revalidate: 60 * 60,
            fallback: FallbackMode::Blocking,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl PostConfig {
    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }
}

/// How a slug outside the enumerated path set is handled
///
/// Written in YAML as `blocking`, `loading` or `disabled`; `true` and `false`
/// are accepted for `loading` and `disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FallbackRepr", into = "FallbackRepr")]
pub enum FallbackMode {
    /// Render on demand; the client waits for the result
    Blocking,
    /// Answer with the loading page while rendering in the background
    Loading,
    /// Unknown slugs are 404
    Disabled,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FallbackRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<FallbackRepr> for FallbackMode {
    type Error = String;

    fn try_from(repr: FallbackRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            FallbackRepr::Flag(true) => Ok(Self::Loading),
            FallbackRepr::Flag(false) => Ok(Self::Disabled),
            FallbackRepr::Name(name) => match name.as_str() {
                "blocking" => Ok(Self::Blocking),
                "loading" | "true" => Ok(Self::Loading),
                "disabled" | "false" => Ok(Self::Disabled),
                other => Err(format!(
                    "unknown fallback mode {:?}, expected blocking, loading or disabled",
                    other
                )),
            },
        }
    }
}

impl From<FallbackMode> for FallbackRepr {
    fn from(mode: FallbackMode) -> Self {
        match mode {
            FallbackMode::Blocking => FallbackRepr::Name("blocking".to_string()),
            FallbackMode::Loading => FallbackRepr::Name("loading".to_string()),
            FallbackMode::Disabled => FallbackRepr::Name("disabled".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.listing.page_size, 1);
        assert_eq!(config.listing.revalidate, 1800);
        assert_eq!(config.post.revalidate, 3600);
        assert_eq!(config.post.fallback, FallbackMode::Blocking);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
timezone: UTC
prismic:
  endpoint: https://example.cdn.prismic.io/api/v2
  access_token: secret
listing:
  page_size: 5
post:
  fallback: false
  words_per_minute: 250
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.prismic.endpoint, "https://example.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.access_token.as_deref(), Some("secret"));
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.listing.revalidate, 1800);
        assert_eq!(config.post.fallback, FallbackMode::Disabled);
        assert_eq!(config.post.words_per_minute, 250);
        assert_eq!(config.tz().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_fallback_mode_names() {
        let mode: FallbackMode = serde_yaml::from_str("blocking").unwrap();
        assert_eq!(mode, FallbackMode::Blocking);
        let mode: FallbackMode = serde_yaml::from_str("loading").unwrap();
        assert_eq!(mode, FallbackMode::Loading);
        let mode: FallbackMode = serde_yaml::from_str("disabled").unwrap();
        assert_eq!(mode, FallbackMode::Disabled);
        let mode: FallbackMode = serde_yaml::from_str("true").unwrap();
        assert_eq!(mode, FallbackMode::Loading);
        let mode: FallbackMode = serde_yaml::from_str("false").unwrap();
        assert_eq!(mode, FallbackMode::Disabled);
        assert!(serde_yaml::from_str::<FallbackMode>("sometimes").is_err());

        let written = serde_yaml::to_string(&FallbackMode::Loading).unwrap();
        assert_eq!(written.trim(), "loading");
        let written = serde_yaml::to_string(&FallbackMode::Disabled).unwrap();
        assert_eq!(written.trim(), "disabled");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SiteConfig::default();
        config.listing.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let mut config = SiteConfig::default();
        config.apply_overrides(Some("https://other.prismic.io/api/v2".into()), Some("  ".into()));
        assert_eq!(config.prismic.endpoint, "https://other.prismic.io/api/v2");
        assert_eq!(config.prismic.access_token, None);
    }
}
