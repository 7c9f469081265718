//! Tera template engine wrapper with the custom `human_date` filter.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use chrono::DateTime;
use tera::{Context, Tera, Value};

/// Every page and partial under this glob is parsed once at startup.
pub const TEMPLATE_GLOB: &str = "ui/html/**/*.html";

#[derive(Debug)]
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(glob: &str) -> Result<Self> {
        let mut tera = Tera::new(glob).context("failed to parse templates")?;
        tera.register_filter("human_date", human_date);
        Ok(Self { tera })
    }

    pub fn render(&self, page: &str, context: &Context) -> Result<String> {
        self.tera
            .render(page, context)
            .with_context(|| format!("failed to render template {page:?}"))
    }
}

/// `26 Aug 2026 at 15:04` from an RFC 3339 timestamp.
fn human_date(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("human_date expects a string timestamp"))?;
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|error| tera::Error::msg(format!("human_date: {error}")))?;
    Ok(Value::String(parsed.format("%d %b %Y at %H:%M").to_string()))
}
