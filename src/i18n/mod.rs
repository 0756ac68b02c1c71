//! Internationalization (i18n) support
//!
//! Interface strings and month names ship for `pt-BR` and `en`. A site may
//! override or add languages with YAML files in its `languages/` directory.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

type Translations = HashMap<String, serde_yaml::Value>;

const BUILTIN: &[(&str, &str)] = &[
    ("pt-BR", include_str!("languages/pt-BR.yml")),
    ("en", include_str!("languages/en.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, Translations>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Result<Self> {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN {
            let data: Translations = serde_yaml::from_str(source)
                .with_context(|| format!("Built-in language {} is invalid", lang))?;
            translations.insert(lang.to_string(), data);
        }

        Ok(Self {
            language: language.to_string(),
            translations,
        })
    }

    /// Load language files from a directory, merging over the built-in ones
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Translations>(&content) {
                Ok(data) => {
                    let target = self.translations.entry(lang.to_string()).or_default();
                    for (key, value) in data {
                        match target.get_mut(&key) {
                            Some(existing) => merge_values(existing, value),
                            None => {
                                target.insert(key, value);
                            }
                        }
                    }
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key; nested keys look like "post.loading"
    pub fn get(&self, key: &str) -> String {
        self.lookup(key)
            .map(yaml_value_to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translation with `%d` replaced by a count
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// The twelve abbreviated month names used by date formatting
    pub fn month_abbreviations(&self) -> Result<[String; 12]> {
        let months: Vec<String> = self
            .lookup("date.months_short")
            .and_then(|v| v.as_sequence())
            .map(|seq| seq.iter().map(yaml_value_to_string).collect())
            .unwrap_or_default();

        months.try_into().map_err(|found: Vec<String>| {
            anyhow::anyhow!(
                "date.months_short for {} must list 12 months, found {}",
                self.language,
                found.len()
            )
        })
    }

    /// All strings for the current language as one nested value, English
    /// filling any gaps
    pub fn as_value(&self) -> serde_yaml::Value {
        let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        for lang in ["en", self.language.as_str()] {
            if let Some(data) = self.translations.get(lang) {
                for (key, value) in data {
                    if let serde_yaml::Value::Mapping(map) = &mut merged {
                        let key = serde_yaml::Value::String(key.clone());
                        match map.get_mut(&key) {
                            Some(existing) => merge_values(existing, value.clone()),
                            None => {
                                map.insert(key, value.clone());
                            }
                        }
                    }
                }
            }
        }
        merged
    }

    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.translations
            .get(&self.language)
            .and_then(|data| get_nested_value(data, key))
            .or_else(|| {
                self.translations
                    .get("en")
                    .and_then(|data| get_nested_value(data, key))
            })
    }
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(data: &'a Translations, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    current
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}
