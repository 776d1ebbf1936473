//! Declarative TOML manifest
//!
//! ```toml
//! name = "shop-backend"
//!
//! [solution]
//! name = "Shop"
//!
//! [[projects]]
//! name = "{layer}.{scope}"
//! layer = "Domain"
//!
//! [[projects.files]]
//! name = "{entity}"
//! path = "Entities/{entity}.cs"
//! per_entity = true
//! template = "public class {{entity}}\n{\n{{members}}\n}\n"
//!
//! [[contributions]]
//! placeholder = "members"
//! per_attribute = true
//! text = "    public {type} {attribute} { get; set; }"
//! priority = 20
//!
//! [[skip]]
//! file = "Legacy"
//! reason = "hand-written"
//! ```
//!
//! `{layer}`, `{scope}`, `{schema}`, `{project}` and `{entity}` are expanded in
//! names and paths. Inside templates the same values are available as
//! `{{layer}}`-style placeholders.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

fn default_generator_name() -> String {
    "manifest".to_string()
}

fn default_overwrite() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {message}")]
    Parse { message: String },

    #[error("invalid manifest: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionSpec {
    /// Solution id; the schema name when unset
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub name: String,
    pub path: String,
    /// Inline template text
    pub template: Option<String>,
    /// Template resolved by the renderer
    pub template_name: Option<String>,
    /// One file per schema entity
    #[serde(default)]
    pub per_entity: bool,
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    /// Placeholders to request even if the template does not mention them
    #[serde(default)]
    pub placeholders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    /// Only registered when the run targets this layer
    pub layer: Option<String>,
    /// Only registered when the run targets this scope
    pub scope: Option<String>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

impl ProjectSpec {
    pub fn applies_to(&self, layer: &str, scope: &str) -> bool {
        self.layer.as_deref().map_or(true, |l| l == layer)
            && self.scope.as_deref().map_or(true, |s| s == scope)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSpec {
    pub placeholder: String,
    pub text: String,
    #[serde(default)]
    pub priority: i32,
    /// Restrict to files with this name, before or after expansion
    pub file: Option<String>,
    /// Emit one contribution per attribute of the file's entity
    #[serde(default)]
    pub per_attribute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    /// File name, before or after expansion, or project-relative path
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Provenance recorded on every registration this manifest makes
    #[serde(default = "default_generator_name")]
    pub name: String,
    #[serde(default)]
    pub solution: SolutionSpec,
    #[serde(default)]
    pub projects: Vec<ProjectSpec>,
    #[serde(default)]
    pub contributions: Vec<ContributionSpec>,
    #[serde(default)]
    pub skip: Vec<SkipRule>,
}

impl GenerationManifest {
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(content).map_err(|e| ManifestError::Parse {
            message: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks every file names exactly one template source
    pub fn validate(&self) -> Result<(), ManifestError> {
        for project in &self.projects {
            for file in &project.files {
                match (&file.template, &file.template_name) {
                    (Some(_), None) | (None, Some(_)) => {}
                    (None, None) => {
                        return Err(ManifestError::Invalid(format!(
                            "file `{}` in project `{}` has no template or template_name",
                            file.name, project.name
                        )))
                    }
                    (Some(_), Some(_)) => {
                        return Err(ManifestError::Invalid(format!(
                            "file `{}` in project `{}` sets both template and template_name",
                            file.name, project.name
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

/// Replaces `{key}` occurrences with their values
pub fn expand(text: &str, vars: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
name = "shop-backend"

[solution]
name = "Shop"

[[projects]]
name = "{layer}.{scope}"
layer = "Domain"

[[projects.files]]
name = "{entity}"
path = "Entities/{entity}.cs"
per_entity = true
template = "public class {{entity}} {}"

[[projects.files]]
name = "Module"
path = "Module.cs"
template_name = "module"
overwrite = false
placeholders = ["registrations"]

[[contributions]]
placeholder = "members"
text = "    public Guid Id { get; set; }"
priority = 10

[[skip]]
file = "Legacy"
reason = "hand-written"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = GenerationManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.name, "shop-backend");
        assert_eq!(manifest.solution.name.as_deref(), Some("Shop"));
        assert_eq!(manifest.projects.len(), 1);

        let files = &manifest.projects[0].files;
        assert!(files[0].per_entity);
        assert!(files[0].overwrite);
        assert!(!files[1].overwrite);
        assert_eq!(files[1].placeholders, vec!["registrations"]);
        assert_eq!(manifest.contributions[0].priority, 10);
        assert_eq!(manifest.skip[0].reason, "hand-written");
    }

    #[test]
    fn test_defaults() {
        let manifest = GenerationManifest::parse("").unwrap();
        assert_eq!(manifest.name, "manifest");
        assert!(manifest.solution.name.is_none());
        assert!(manifest.projects.is_empty());
    }

    #[test]
    fn test_file_without_template_is_invalid() {
        let err = GenerationManifest::parse(
            r#"
[[projects]]
name = "Web"

[[projects.files]]
name = "index"
path = "index.html"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = GenerationManifest::parse("projects = 3").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = GenerationManifest::from_file(file.path()).unwrap();
        assert_eq!(manifest.projects[0].name, "{layer}.{scope}");

        let err = GenerationManifest::from_file(Path::new("/nonexistent/manifest.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn test_applies_to() {
        let manifest = GenerationManifest::parse(MANIFEST).unwrap();
        let project = &manifest.projects[0];
        assert!(project.applies_to("Domain", "Shared"));
        assert!(project.applies_to("Domain", "Billing"));
        assert!(!project.applies_to("Web", "Shared"));
    }

    #[test]
    fn test_expand() {
        let vars = [("layer", "Domain"), ("scope", "Shared")];
        assert_eq!(expand("{layer}.{scope}", &vars), "Domain.Shared");
        assert_eq!(expand("{{layer}}", &vars), "{Domain}");
        assert_eq!(expand("{other}", &vars), "{other}");
    }
}
