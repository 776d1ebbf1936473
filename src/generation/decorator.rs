use super::cancel::CancellationSignal;
use super::context::{GenerationContext, SchemaProvider};
use super::error::GenerationError;
use super::messages::Phase;
use super::orchestrator::GenerationOrchestrator;
use super::result::RunReport;
use crate::artifact::{
    Artifact, ArtifactDecorator, DecoratorBase, GenerationCapability, Layer, Scope, Solution,
};
use crate::progress::ProgressHandler;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key [`GenerationDecorator`] is attached under
pub const GENERATION_KEY: &str = "generation";

/// Scope used when the owner does not name one
pub const DEFAULT_SCOPE: &str = "Shared";

/// Generation capability for layer and scope artifacts
///
/// Runs the orchestrator for the owner's layer/scope and attaches the resulting
/// solution under the owner, replacing the one from a previous run.
pub struct GenerationDecorator {
    base: DecoratorBase,
    orchestrator: Arc<GenerationOrchestrator>,
    schema: Arc<dyn SchemaProvider>,
    output_root: PathBuf,
    running: AtomicBool,
}

impl GenerationDecorator {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, schema: Arc<dyn SchemaProvider>) -> Self {
        Self {
            base: DecoratorBase::new(GENERATION_KEY),
            orchestrator,
            schema,
            output_root: PathBuf::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn orchestrator(&self) -> &Arc<GenerationOrchestrator> {
        &self.orchestrator
    }

    /// Layer and scope a run on `owner` targets
    pub fn target_of(owner: &Artifact) -> (String, String) {
        if owner.is::<Scope>() {
            let layer = owner
                .parent()
                .filter(|p| p.is::<Layer>())
                .map(|p| p.id().to_string())
                .or_else(|| owner.property_str("layer"))
                .unwrap_or_default();
            return (layer, owner.id().to_string());
        }

        let layer = if owner.is::<Layer>() {
            owner.id().to_string()
        } else {
            owner
                .property_str("layer")
                .unwrap_or_else(|| owner.id().to_string())
        };
        let scope = owner
            .property_str("scope")
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        (layer, scope)
    }

    fn attach_solution(owner: &Artifact, solution: &Artifact) -> Result<(), GenerationError> {
        let tree_error = |source| GenerationError::Tree {
            subject: owner.id().to_string(),
            source,
        };
        for previous in owner.children_of::<Solution>() {
            if previous.id() == solution.id() {
                debug!(owner = %owner.id(), solution = %previous.id(), "Replacing previous solution");
                owner.remove_child(&previous).map_err(tree_error)?;
            }
        }
        owner.add_child(solution).map_err(tree_error)
    }
}

/// Clears the running flag when a run ends, including on early return
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ArtifactDecorator for GenerationDecorator {
    fn base(&self) -> &DecoratorBase {
        &self.base
    }

    fn generator(&self) -> Option<&dyn GenerationCapability> {
        Some(self)
    }
}

#[async_trait]
impl GenerationCapability for GenerationDecorator {
    fn can_generate(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    async fn generate(
        &self,
        owner: &Artifact,
        progress: &dyn ProgressHandler,
        cancel: &CancellationSignal,
    ) -> Result<RunReport, GenerationError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GenerationError::AlreadyRunning(owner.id().to_string()));
        }
        let _guard = RunningGuard(&self.running);

        let schema = self.schema.load().await.map_err(GenerationError::Schema)?;
        let (layer, scope) = Self::target_of(owner);
        info!(owner = %owner.id(), layer = %layer, scope = %scope, "Generating from artifact");

        let context =
            GenerationContext::new(schema, layer, scope).with_output_root(self.output_root.clone());
        let mut report = self
            .orchestrator
            .run(owner.bus(), context, progress, cancel)
            .await;

        if let Some(solution) = report.solution.clone() {
            if let Err(e) = Self::attach_solution(owner, &solution) {
                warn!(owner = %owner.id(), solution = %solution.id(), error = %e, "Failed to attach solution");
                report.record_failure(Phase::CreatedSolution, solution.id(), e);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{
        ArtifactGenerated, ArtifactGenerating, ChildAdded, GenerationOutcome, WorkspaceRoot,
    };
    use crate::bus::MessageBus;
    use crate::generation::{
        CreatingSolution, MemoryPersistence, PlaceholderRenderer, ProjectRegistration, RunStatus,
        Schema, StaticSchemaProvider,
    };
    use crate::progress::NoOpHandler;
    use std::sync::Mutex;

    fn decorator(generation: &MessageBus) -> Arc<GenerationDecorator> {
        let orchestrator = GenerationOrchestrator::new(
            generation.clone(),
            Arc::new(PlaceholderRenderer::new()),
            Arc::new(MemoryPersistence::new()),
        );
        Arc::new(GenerationDecorator::new(
            Arc::new(orchestrator),
            Arc::new(StaticSchemaProvider::new(Schema::new("Shop"))),
        ))
    }

    #[test]
    fn test_target_of_scope_uses_parent_layer() {
        let tree = MessageBus::new("tree");
        let layer = Artifact::construct_as::<Layer>(&tree, "Domain").unwrap();
        let scope = Artifact::construct_as::<Scope>(&tree, "Billing").unwrap();
        layer.add_child(&scope).unwrap();

        assert_eq!(
            GenerationDecorator::target_of(&scope),
            ("Domain".to_string(), "Billing".to_string())
        );
        assert_eq!(
            GenerationDecorator::target_of(&layer),
            ("Domain".to_string(), DEFAULT_SCOPE.to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_attaches_solution_and_publishes_lifecycle() {
        let tree = MessageBus::new("tree");
        let generation = MessageBus::new("generation");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        tree.subscribe(move |m: &ArtifactGenerating| {
            s.lock().unwrap().push(format!("generating {}", m.decorator));
            Ok(())
        });
        let s = seen.clone();
        tree.subscribe(move |m: &ArtifactGenerated| {
            s.lock().unwrap().push(format!("generated {:?}", m.outcome));
            Ok(())
        });
        generation.subscribe(|m: &CreatingSolution| {
            m.projects.push(ProjectRegistration::new(
                format!("{}.{}", m.context.layer, m.context.scope),
                m.context.layer.clone(),
                m.context.scope.clone(),
                "test",
            ))?;
            Ok(())
        });

        let layer = Artifact::construct_as::<Layer>(&tree, "Domain").unwrap();
        layer.add_decorator(decorator(&generation)).unwrap();
        assert!(layer.can_generate());

        let cancel = CancellationSignal::new();
        let reports = layer.generate(&NoOpHandler, &cancel).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_completed());

        let solutions = layer.children_of::<Solution>();
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].children()[0].id(), "Domain.Shared");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "generating generation".to_string(),
                format!("generated {:?}", GenerationOutcome::Completed)
            ]
        );

        layer.generate(&NoOpHandler, &cancel).await.unwrap();
        assert_eq!(layer.children_of::<Solution>().len(), 1);
        assert!(layer.can_generate());
    }

    #[tokio::test]
    async fn test_running_decorator_rejects_second_run() {
        let tree = MessageBus::new("tree");
        let generation = MessageBus::new("generation");
        let root = Artifact::construct_as::<WorkspaceRoot>(&tree, "ws").unwrap();
        let decorator = decorator(&generation);

        decorator.running.store(true, Ordering::SeqCst);
        assert!(!decorator.can_generate());
        let err = decorator
            .generate(&root, &NoOpHandler, &CancellationSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::AlreadyRunning(_)));
        assert!(!decorator.can_generate());
    }

    fn register_project(generation: &MessageBus) {
        generation.subscribe(|m: &CreatingSolution| {
            m.projects
                .push(ProjectRegistration::new("Core", "Domain", "Shared", "test"))?;
            Ok(())
        });
    }

    #[tokio::test]
    async fn test_attach_failure_keeps_report() {
        let tree = MessageBus::new("tree");
        let generation = MessageBus::new("generation");
        register_project(&generation);
        tree.subscribe(|m: &ChildAdded| {
            if m.child().is::<Solution>() {
                anyhow::bail!("solutions are read-only here");
            }
            Ok(())
        });
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();
        tree.subscribe(move |m: &ArtifactGenerated| {
            sink.lock().unwrap().push(m.outcome.clone());
            Ok(())
        });

        let layer = Artifact::construct_as::<Layer>(&tree, "Domain").unwrap();
        layer.add_decorator(decorator(&generation)).unwrap();

        let reports = layer
            .generate(&NoOpHandler, &CancellationSignal::new())
            .await
            .unwrap();
        let report = &reports[0];
        assert!(report.is_aborted());
        assert!(matches!(
            &report.status,
            RunStatus::Aborted { phase: Phase::CreatedSolution, subject, .. } if subject == "Shop"
        ));
        assert!(matches!(report.error, Some(GenerationError::Tree { .. })));
        assert_eq!(report.result.projects()[0].name, "Core");
        assert!(matches!(
            outcomes.lock().unwrap()[0],
            GenerationOutcome::Aborted(_)
        ));
    }

    #[tokio::test]
    async fn test_generated_handler_failure_keeps_report() {
        let tree = MessageBus::new("tree");
        let generation = MessageBus::new("generation");
        register_project(&generation);
        tree.subscribe(|_: &ArtifactGenerated| anyhow::bail!("audit log unavailable"));

        let layer = Artifact::construct_as::<Layer>(&tree, "Domain").unwrap();
        layer.add_decorator(decorator(&generation)).unwrap();

        let reports = layer
            .generate(&NoOpHandler, &CancellationSignal::new())
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_aborted());
        assert_eq!(reports[0].result.projects().len(), 1);
        assert_eq!(layer.children_of::<Solution>().len(), 1);
        assert!(layer.can_generate());
    }
}
