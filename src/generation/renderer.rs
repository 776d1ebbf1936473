//! Template rendering collaborator

use super::registration::{FileRegistration, TemplateRef};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

/// Turns a file registration plus aggregated placeholder values into content
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Placeholders the template references beyond those the registration lists
    fn placeholders(&self, _file: &FileRegistration) -> Vec<String> {
        Vec::new()
    }

    async fn render(&self, file: &FileRegistration, values: &IndexMap<String, String>) -> Result<String>;
}

/// Renderer that substitutes `{{name}}` tokens
///
/// Named templates are looked up in a registry populated with
/// [`PlaceholderRenderer::with_template`]. Tokens without a value render empty.
#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    token: Regex,
    templates: HashMap<String, String>,
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self {
            token: Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid regex"),
            templates: HashMap::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(name.into(), text.into());
        self
    }

    fn template_text<'a>(&'a self, template: &'a TemplateRef) -> Result<&'a str> {
        match template {
            TemplateRef::Inline(text) => Ok(text.as_str()),
            TemplateRef::Named(name) => self
                .templates
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("unknown template `{}`", name)),
        }
    }
}

#[async_trait]
impl TemplateRenderer for PlaceholderRenderer {
    fn placeholders(&self, file: &FileRegistration) -> Vec<String> {
        let Ok(text) = self.template_text(&file.template) else {
            return Vec::new();
        };
        let mut names: Vec<String> = Vec::new();
        for captures in self.token.captures_iter(text) {
            let name = &captures[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    async fn render(&self, file: &FileRegistration, values: &IndexMap<String, String>) -> Result<String> {
        let text = self.template_text(&file.template)?;
        let rendered = self.token.replace_all(text, |captures: &regex::Captures| {
            values.get(&captures[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(template: TemplateRef) -> FileRegistration {
        FileRegistration::new("readme", "README.md", template, "test")
    }

    #[test]
    fn test_discovers_placeholders_in_order() {
        let renderer = PlaceholderRenderer::new();
        let f = file(TemplateRef::Inline(
            "{{header}}\n{{ body }}\n{{header}}{{footer}}".into(),
        ));
        assert_eq!(renderer.placeholders(&f), vec!["header", "body", "footer"]);
    }

    #[tokio::test]
    async fn test_render_inline() {
        let renderer = PlaceholderRenderer::new();
        let f = file(TemplateRef::Inline("class {{name}} { {{members}} }".into()));
        let mut values = IndexMap::new();
        values.insert("name".to_string(), "Customer".to_string());

        let out = renderer.render(&f, &values).await.unwrap();
        assert_eq!(out, "class Customer {  }");
    }

    #[tokio::test]
    async fn test_render_named_template() {
        let renderer = PlaceholderRenderer::new().with_template("entity", "// {{entity}}");
        let f = file(TemplateRef::Named("entity".into()));
        assert_eq!(renderer.placeholders(&f), vec!["entity"]);

        let mut values = IndexMap::new();
        values.insert("entity".to_string(), "Order".to_string());
        assert_eq!(renderer.render(&f, &values).await.unwrap(), "// Order");
    }

    #[tokio::test]
    async fn test_unknown_named_template_fails() {
        let renderer = PlaceholderRenderer::new();
        let f = file(TemplateRef::Named("missing".into()));
        assert!(renderer.placeholders(&f).is_empty());

        let err = renderer.render(&f, &IndexMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("unknown template `missing`"));
    }
}
