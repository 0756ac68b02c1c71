//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template; rendered rich text is the only value marked `safe`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers::post_path;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        tera.register_filter("post_url", post_url_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: uid -> detail page route
fn post_url_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let uid = tera::try_get_value!("post_url", "value", String, value);
    Ok(tera::Value::String(post_path(&uid)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub banner_url: String,
    pub date: String,
    pub author: String,
    /// Display text such as `4 min`
    pub reading_time: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    /// Trusted HTML from the rich text renderer
    pub html: String,
}
