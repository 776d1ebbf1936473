use super::registration::TemplateRef;
use crate::artifact::{ArtifactDecorator, DecoratorBase};
use indexmap::IndexMap;

/// Key [`TemplateBinding`] is attached under
pub const TEMPLATE_BINDING_KEY: &str = "template-binding";

/// Records which template and placeholder values produced a file artifact
#[derive(Debug)]
pub struct TemplateBinding {
    base: DecoratorBase,
    template: TemplateRef,
    values: IndexMap<String, String>,
}

impl TemplateBinding {
    pub fn new(template: TemplateRef, values: IndexMap<String, String>) -> Self {
        Self {
            base: DecoratorBase::new(TEMPLATE_BINDING_KEY),
            template,
            values,
        }
    }

    pub fn template(&self) -> &TemplateRef {
        &self.template
    }

    /// Aggregated placeholder text, in request order
    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }
}

impl ArtifactDecorator for TemplateBinding {
    fn base(&self) -> &DecoratorBase {
        &self.base
    }
}
