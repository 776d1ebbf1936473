//! Contributions subscribers make during a run

use crate::artifact::PropertyBag;
use serde::Serialize;
use std::path::PathBuf;

/// Request to create a project, pushed during `CreatingSolution`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRegistration {
    pub name: String,
    pub layer: String,
    pub scope: String,
    pub registered_by: String,
    pub properties: PropertyBag,
}

impl ProjectRegistration {
    pub fn new(
        name: impl Into<String>,
        layer: impl Into<String>,
        scope: impl Into<String>,
        registered_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
            scope: scope.into(),
            registered_by: registered_by.into(),
            properties: PropertyBag::new(),
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Template a file is rendered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TemplateRef {
    /// Template text carried on the registration
    Inline(String),
    /// Name resolved by the template renderer
    Named(String),
}

/// Request to create a file, pushed during `CreatingProject`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRegistration {
    pub name: String,
    /// Path relative to the project directory
    pub relative_path: PathBuf,
    pub template: TemplateRef,
    pub overwrite: bool,
    /// Placeholder names requested in declaration order
    pub placeholders: Vec<String>,
    pub registered_by: String,
    pub properties: PropertyBag,
}

impl FileRegistration {
    pub fn new(
        name: impl Into<String>,
        relative_path: impl Into<PathBuf>,
        template: TemplateRef,
        registered_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            template,
            overwrite: true,
            placeholders: Vec::new(),
            registered_by: registered_by.into(),
            properties: PropertyBag::new(),
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholders.push(name.into());
        self
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Text contributed for one placeholder
///
/// Lower priorities come first in the combined text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderContent {
    pub text: String,
    pub priority: i32,
    pub registered_by: String,
}

impl PlaceholderContent {
    pub fn new(text: impl Into<String>, priority: i32, registered_by: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority,
            registered_by: registered_by.into(),
        }
    }
}
