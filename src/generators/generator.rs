//! Generator module driven by a [`GenerationManifest`]

use super::manifest::{expand, ContributionSpec, FileSpec, GenerationManifest, ProjectSpec};
use crate::bus::{HandlerResult, MessageBus};
use crate::generation::{
    CreatingFile, CreatingProject, CreatingSolution, FileRegistration, GenerationContext,
    PlaceholderContent, PlaceholderContentRequested, ProjectRegistration, TemplateRef,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Registration property holding the index of the manifest project
pub const PROJECT_INDEX_PROPERTY: &str = "manifest_project";
/// Registration property holding the unexpanded file name
pub const FILE_NAME_PROPERTY: &str = "manifest_file";
/// Registration property holding the entity a file was expanded for
pub const ENTITY_PROPERTY: &str = "entity";

/// Placeholders answered from the run context, at priority 0
const BUILTIN_PLACEHOLDERS: &[&str] = &["entity", "layer", "scope", "project", "schema"];

/// Subscribes to the generation bus and registers what its manifest declares
///
/// ```
/// use artigen::bus::MessageBus;
/// use artigen::generators::{GenerationManifest, ManifestGenerator};
/// use std::sync::Arc;
///
/// let bus = MessageBus::new("generation");
/// let manifest = GenerationManifest::parse("name = \"docs\"").unwrap();
/// let generator = Arc::new(ManifestGenerator::new(manifest));
/// generator.clone().install(&bus);
/// assert_eq!(bus.subscriber_count(), 4);
/// assert_eq!(generator.uninstall(&bus), 4);
/// ```
#[derive(Debug)]
pub struct ManifestGenerator {
    manifest: GenerationManifest,
}

impl ManifestGenerator {
    pub fn new(manifest: GenerationManifest) -> Self {
        Self { manifest }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn manifest(&self) -> &GenerationManifest {
        &self.manifest
    }

    /// Subscribes one handler per phase, owned by the manifest name
    pub fn install(self: Arc<Self>, bus: &MessageBus) {
        let owner = self.manifest.name.clone();

        let this = Arc::clone(&self);
        bus.subscribe_owned(owner.clone(), move |m: &CreatingSolution| {
            this.on_creating_solution(m)
        });

        let this = Arc::clone(&self);
        bus.subscribe_owned(owner.clone(), move |m: &CreatingProject| {
            this.on_creating_project(m)
        });

        let this = Arc::clone(&self);
        bus.subscribe_owned(owner.clone(), move |m: &CreatingFile| this.on_creating_file(m));

        let this = self;
        bus.subscribe_owned(owner.clone(), move |m: &PlaceholderContentRequested| {
            this.on_placeholder_requested(m)
        });

        info!(generator = %owner, bus = %bus.name(), "Manifest generator installed");
    }

    /// Removes every subscription made by [`ManifestGenerator::install`]
    pub fn uninstall(&self, bus: &MessageBus) -> usize {
        bus.unsubscribe_owner(&self.manifest.name)
    }

    fn is_own(&self, registered_by: &str) -> bool {
        registered_by == self.manifest.name
    }

    fn on_creating_solution(&self, message: &CreatingSolution) -> HandlerResult {
        let context = &message.context;
        for (index, spec) in self.manifest.projects.iter().enumerate() {
            if !spec.applies_to(&context.layer, &context.scope) {
                continue;
            }
            let name = expand(&spec.name, &context_vars(context));
            debug!(generator = %self.manifest.name, project = %name, "Registering project");
            message.projects.push(
                ProjectRegistration::new(
                    name,
                    context.layer.clone(),
                    context.scope.clone(),
                    self.manifest.name.clone(),
                )
                .with_property(PROJECT_INDEX_PROPERTY, index),
            )?;
        }
        Ok(())
    }

    fn on_creating_project(&self, message: &CreatingProject) -> HandlerResult {
        let registration = &message.registration;
        if !self.is_own(&registration.registered_by) {
            return Ok(());
        }
        let Some(spec) = self.project_spec(registration) else {
            return Ok(());
        };

        for file in &spec.files {
            if file.per_entity {
                for entity in &message.context.schema.entities {
                    message
                        .files
                        .push(self.file_registration(&message.context, registration, file, Some(&entity.name)))?;
                }
            } else {
                message
                    .files
                    .push(self.file_registration(&message.context, registration, file, None))?;
            }
        }
        Ok(())
    }

    fn on_creating_file(&self, message: &CreatingFile) -> HandlerResult {
        let registration = &message.registration;
        let path = registration.relative_path.to_string_lossy();
        let rule = self.manifest.skip.iter().find(|rule| {
            rule.file == registration.name
                || rule.file == path
                || property_str(registration, FILE_NAME_PROPERTY) == Some(rule.file.as_str())
        });
        if let Some(rule) = rule {
            debug!(file = %registration.name, reason = %rule.reason, "Skipping file");
            message.cancel(rule.reason.clone())?;
        }
        Ok(())
    }

    fn on_placeholder_requested(&self, message: &PlaceholderContentRequested) -> HandlerResult {
        let registration = &message.registration;
        let entity = property_str(registration, ENTITY_PROPERTY);
        let mut vars = context_vars(&message.context);
        vars.push(("project", message.project.name.as_str()));
        if let Some(entity) = entity {
            vars.push(("entity", entity));
        }

        if self.is_own(&registration.registered_by)
            && BUILTIN_PLACEHOLDERS.contains(&message.placeholder.as_str())
        {
            if let Some((_, value)) = vars.iter().find(|(key, _)| *key == message.placeholder) {
                message
                    .contents
                    .push(PlaceholderContent::new(*value, 0, self.manifest.name.clone()))?;
            }
        }

        for contribution in &self.manifest.contributions {
            if contribution.placeholder != message.placeholder || !applies_to_file(contribution, registration) {
                continue;
            }
            if contribution.per_attribute {
                let Some(entity) = entity.and_then(|name| message.context.schema.entity(name)) else {
                    continue;
                };
                for attribute in &entity.attributes {
                    let mut attribute_vars = vars.clone();
                    attribute_vars.push(("attribute", attribute.name.as_str()));
                    attribute_vars.push(("type", attribute.data_type.as_str()));
                    message.contents.push(PlaceholderContent::new(
                        expand(&contribution.text, &attribute_vars),
                        contribution.priority,
                        self.manifest.name.clone(),
                    ))?;
                }
            } else {
                message.contents.push(PlaceholderContent::new(
                    expand(&contribution.text, &vars),
                    contribution.priority,
                    self.manifest.name.clone(),
                ))?;
            }
        }
        Ok(())
    }

    fn project_spec(&self, registration: &ProjectRegistration) -> Option<&ProjectSpec> {
        let index = registration
            .properties
            .get(PROJECT_INDEX_PROPERTY)
            .and_then(Value::as_u64)?;
        self.manifest.projects.get(usize::try_from(index).ok()?)
    }

    fn file_registration(
        &self,
        context: &GenerationContext,
        project: &ProjectRegistration,
        file: &FileSpec,
        entity: Option<&str>,
    ) -> FileRegistration {
        let mut vars = context_vars(context);
        vars.push(("project", project.name.as_str()));
        if let Some(entity) = entity {
            vars.push(("entity", entity));
        }

        let template = match (&file.template, &file.template_name) {
            (_, Some(name)) => TemplateRef::Named(name.clone()),
            (Some(text), None) => TemplateRef::Inline(text.clone()),
            (None, None) => TemplateRef::Inline(String::new()),
        };

        let mut registration = FileRegistration::new(
            expand(&file.name, &vars),
            expand(&file.path, &vars),
            template,
            self.manifest.name.clone(),
        )
        .with_overwrite(file.overwrite)
        .with_property(FILE_NAME_PROPERTY, file.name.clone());
        for placeholder in &file.placeholders {
            registration = registration.with_placeholder(placeholder.clone());
        }
        if let Some(entity) = entity {
            registration = registration.with_property(ENTITY_PROPERTY, entity);
        }
        registration
    }
}

fn context_vars(context: &GenerationContext) -> Vec<(&str, &str)> {
    vec![
        ("layer", context.layer.as_str()),
        ("scope", context.scope.as_str()),
        ("schema", context.schema.name.as_str()),
    ]
}

fn property_str<'a>(registration: &'a FileRegistration, key: &str) -> Option<&'a str> {
    registration.properties.get(key).and_then(Value::as_str)
}

fn applies_to_file(contribution: &ContributionSpec, registration: &FileRegistration) -> bool {
    match &contribution.file {
        None => true,
        Some(file) => {
            *file == registration.name
                || property_str(registration, FILE_NAME_PROPERTY) == Some(file.as_str())
        }
    }
}
