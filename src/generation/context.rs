//! Schema model and per-run context

use crate::artifact::PropertyBag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

/// Data model a run generates code for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>, attributes: &[(&str, &str)]) -> Self {
        self.entities.push(EntityDef {
            name: name.into(),
            attributes: attributes
                .iter()
                .map(|(name, data_type)| AttributeDef {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
        });
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// Everything one run is scoped to: a schema and a layer/scope target
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub schema: Arc<Schema>,
    pub layer: String,
    pub scope: String,
    /// Root persistence paths are resolved against
    pub output_root: PathBuf,
    pub properties: PropertyBag,
}

impl GenerationContext {
    pub fn new(schema: Arc<Schema>, layer: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            schema,
            layer: layer.into(),
            scope: scope.into(),
            output_root: PathBuf::new(),
            properties: PropertyBag::new(),
        }
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// `layer/scope`, used in log fields and subjects
    pub fn target(&self) -> String {
        format!("{}/{}", self.layer, self.scope)
    }
}

/// Source of the schema a run is scoped to
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn load(&self) -> Result<Arc<Schema>>;
}

/// Reads a [`Schema`] from a JSON file
#[derive(Debug, Clone)]
pub struct JsonSchemaProvider {
    path: PathBuf,
}

impl JsonSchemaProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SchemaProvider for JsonSchemaProvider {
    async fn load(&self) -> Result<Arc<Schema>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read schema {}", self.path.display()))?;
        let schema: Schema = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse schema {}", self.path.display()))?;
        Ok(Arc::new(schema))
    }
}

/// Provider returning a schema built in code
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    schema: Arc<Schema>,
}

impl StaticSchemaProvider {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn load(&self) -> Result<Arc<Schema>> {
        Ok(Arc::clone(&self.schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_json_schema_provider() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name": "Shop", "entities": [{{"name": "Customer", "attributes": [{{"name": "Email", "type": "string"}}]}}, {{"name": "Order"}}]}}"#
        )
        .unwrap();

        let schema = JsonSchemaProvider::new(file.path()).load().await.unwrap();
        assert_eq!(schema.name, "Shop");
        assert_eq!(schema.entities.len(), 2);
        let customer = schema.entity("Customer").unwrap();
        assert_eq!(customer.attributes[0].data_type, "string");
        assert!(schema.entity("Order").unwrap().attributes.is_empty());
    }

    #[tokio::test]
    async fn test_json_schema_provider_missing_file() {
        let err = JsonSchemaProvider::new("/nonexistent/schema.json")
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read schema"));
    }

    #[tokio::test]
    async fn test_static_provider_shares_schema() {
        let provider = StaticSchemaProvider::new(Schema::new("Shop").with_entity("Customer", &[]));
        let a = provider.load().await.unwrap();
        let b = provider.load().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_context_target() {
        let context = GenerationContext::new(Arc::new(Schema::new("Shop")), "Domain", "Shared");
        assert_eq!(context.target(), "Domain/Shared");
    }
}
