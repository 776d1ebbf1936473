use super::binding::TemplateBinding;
use super::cancel::CancellationSignal;
use super::context::GenerationContext;
use super::error::GenerationError;
use super::messages::{
    CreatedFile, CreatedProject, CreatedSolution, CreatingFile, CreatingProject, CreatingSolution,
    Phase, PipelineNotice, PlaceholderContentRequested,
};
use super::persistence::{Persistence, WriteOutcome};
use super::placeholder::aggregate;
use super::registration::{FileRegistration, ProjectRegistration};
use super::renderer::TemplateRenderer;
use super::result::{
    FileRecord, FileStatus, GenerationResult, ProjectRecord, RunReport, RunStatus, SolutionRecord,
};
use crate::artifact::{Artifact, File, Project, Solution};
use crate::bus::{Bucket, Message, MessageBus};
use crate::progress::{ProgressEvent, ProgressHandler};
use chrono::Utc;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default separator between placeholder contributions
pub const DEFAULT_PLACEHOLDER_SEPARATOR: &str = "\n";

/// Run-wide knobs for [`GenerationOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub placeholder_separator: String,
    /// Abort the run on the first persistence error instead of recording a failed file
    pub abort_on_write_failure: bool,
    /// Solution artifact id; defaults to the schema name
    pub solution_name: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            placeholder_separator: DEFAULT_PLACEHOLDER_SEPARATOR.to_string(),
            abort_on_write_failure: false,
            solution_name: None,
        }
    }
}

/// Mutable state of one run
struct Run<'a> {
    id: Uuid,
    context: Arc<GenerationContext>,
    tree: &'a MessageBus,
    progress: &'a dyn ProgressHandler,
    cancel: &'a CancellationSignal,
    phase: Phase,
    subject: String,
    result: GenerationResult,
    solution: Option<Artifact>,
}

impl Run<'_> {
    /// Moves to `phase` and returns the notice for its message
    fn enter(&mut self, phase: Phase, subject: impl Into<String>) -> PipelineNotice {
        self.phase = phase;
        self.subject = subject.into();
        PipelineNotice {
            run_id: self.id,
            phase,
            subject: self.subject.clone(),
        }
    }

    fn check_cancelled(&self, phase: Phase, subject: &str) -> Result<(), GenerationError> {
        if self.cancel.is_cancelled() {
            return Err(GenerationError::Cancelled {
                phase,
                subject: subject.to_string(),
            });
        }
        Ok(())
    }

    fn tree_error(&self, source: crate::artifact::TreeError) -> GenerationError {
        GenerationError::Tree {
            subject: self.subject.clone(),
            source,
        }
    }
}

/// Drives the solution → project → file phase sequence
///
/// Each phase publishes one message on the generation bus and waits for every
/// subscriber before moving on. Projects and files are processed one at a time
/// in the order subscribers registered them. Materialized solutions, projects
/// and files are added to the artifact tree through the tree bus passed to
/// [`GenerationOrchestrator::run`].
pub struct GenerationOrchestrator {
    bus: MessageBus,
    renderer: Arc<dyn TemplateRenderer>,
    persistence: Arc<dyn Persistence>,
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        bus: MessageBus,
        renderer: Arc<dyn TemplateRenderer>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            bus,
            renderer,
            persistence,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Bus generator modules subscribe to
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Executes one run for `context`
    ///
    /// Never fails outright: cancellation and aborts are reported through
    /// [`RunReport::status`] with whatever was recorded before they happened.
    pub async fn run(
        &self,
        tree: &MessageBus,
        context: GenerationContext,
        progress: &dyn ProgressHandler,
        cancel: &CancellationSignal,
    ) -> RunReport {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(run = %run_id, target = %context.target(), "Starting generation run");
        progress.on_progress(&ProgressEvent::Started {
            run_id,
            target: context.target(),
        });

        let mut run = Run {
            id: run_id,
            subject: self.solution_name(&context),
            context: Arc::new(context),
            tree,
            progress,
            cancel,
            phase: Phase::CreatingSolution,
            result: GenerationResult::default(),
            solution: None,
        };

        let outcome = self.execute(&mut run).await;
        let (status, error) = match outcome {
            Ok(()) => {
                info!(
                    run = %run_id,
                    projects = run.result.projects().len(),
                    files = run.result.files().len(),
                    "Generation run complete"
                );
                progress.on_progress(&ProgressEvent::Completed {
                    projects: run.result.projects().len(),
                    files: run.result.files().len(),
                    total_time: start.elapsed(),
                });
                (RunStatus::Completed, None)
            }
            Err(GenerationError::Cancelled { phase, subject }) => {
                info!(run = %run_id, phase = %phase, subject = %subject, "Generation run cancelled");
                progress.on_progress(&ProgressEvent::Cancelled {
                    phase: phase.to_string(),
                    subject: subject.clone(),
                });
                (RunStatus::Cancelled { phase, subject }, None)
            }
            Err(e) => {
                warn!(
                    run = %run_id,
                    phase = %run.phase,
                    subject = %run.subject,
                    error = %e,
                    "Generation run aborted"
                );
                progress.on_progress(&ProgressEvent::Failed {
                    error: e.to_string(),
                });
                let status = RunStatus::Aborted {
                    phase: run.phase,
                    subject: run.subject.clone(),
                    error: e.to_string(),
                };
                (status, Some(e))
            }
        };

        RunReport {
            run_id,
            status,
            result: run.result,
            error,
            solution: run.solution,
            started_at,
            duration: start.elapsed(),
        }
    }

    fn solution_name(&self, context: &GenerationContext) -> String {
        self.config
            .solution_name
            .clone()
            .unwrap_or_else(|| context.schema.name.clone())
    }

    fn publish<M: Message>(&self, run: &Run<'_>, message: &M) -> Result<(), GenerationError> {
        debug!(phase = %run.phase, subject = %run.subject, "Publishing phase message");
        self.bus
            .publish(message)
            .map_err(|source| GenerationError::SubscriberFault {
                phase: run.phase,
                subject: run.subject.clone(),
                source,
            })
    }

    async fn execute(&self, run: &mut Run<'_>) -> Result<(), GenerationError> {
        let name = self.solution_name(&run.context);
        run.check_cancelled(Phase::CreatingSolution, &name)?;

        let notice = run.enter(Phase::CreatingSolution, name.clone());
        let solution = Artifact::construct_as::<Solution>(run.tree, name.clone())
            .map_err(|e| run.tree_error(e))?;
        solution.set_property("layer", run.context.layer.clone());
        solution.set_property("scope", run.context.scope.clone());
        run.solution = Some(solution.clone());

        let message = CreatingSolution {
            notice,
            context: Arc::clone(&run.context),
            solution: solution.clone(),
            projects: Bucket::new("projects"),
        };
        self.publish(run, &message)?;
        let registrations = message.projects.drain();

        run.progress.on_progress(&ProgressEvent::SolutionPlanned {
            solution: name.clone(),
            projects: registrations.len(),
        });

        let total = registrations.len();
        for (index, registration) in registrations.into_iter().enumerate() {
            run.check_cancelled(Phase::CreatingProject, &registration.name)?;
            self.create_project(run, &solution, registration, index + 1, total)
                .await?;
        }

        run.check_cancelled(Phase::CreatedSolution, &name)?;
        let notice = run.enter(Phase::CreatedSolution, name.clone());
        let projects = run.result.projects().to_vec();
        let message = CreatedSolution {
            notice,
            solution,
            projects,
        };
        self.publish(run, &message)?;

        run.result.record_solution(SolutionRecord {
            name,
            projects: message.projects.iter().map(|p| p.name.clone()).collect(),
        });
        Ok(())
    }

    async fn create_project(
        &self,
        run: &mut Run<'_>,
        solution: &Artifact,
        registration: ProjectRegistration,
        index: usize,
        total: usize,
    ) -> Result<(), GenerationError> {
        let start = Instant::now();
        let notice = run.enter(Phase::CreatingProject, registration.name.clone());

        let project = Artifact::construct_as::<Project>(run.tree, registration.name.clone())
            .map_err(|e| run.tree_error(e))?;
        project.set_property("layer", registration.layer.clone());
        project.set_property("scope", registration.scope.clone());
        project.set_property("registered_by", registration.registered_by.clone());
        for (key, value) in &registration.properties {
            project.set_property(key.clone(), value.clone());
        }
        solution
            .add_child(&project)
            .map_err(|e| run.tree_error(e))?;

        let message = CreatingProject {
            notice,
            context: Arc::clone(&run.context),
            project: project.clone(),
            registration,
            files: Bucket::new("files"),
        };
        self.publish(run, &message)?;
        let files = message.files.drain();
        let registration = message.registration;

        info!(project = %registration.name, files = files.len(), "Creating project");
        run.progress.on_progress(&ProgressEvent::ProjectStarted {
            project: registration.name.clone(),
            index,
            total,
            files: files.len(),
        });

        let mut records = Vec::with_capacity(files.len());
        for file in files {
            let path = Self::relative_path(&registration, &file);
            run.check_cancelled(Phase::CreatingFile, &path.display().to_string())?;
            let record = self.create_file(run, &project, &registration, file).await?;
            records.push(record);
        }
        run.check_cancelled(Phase::CreatedProject, &registration.name)?;

        let record = ProjectRecord {
            name: registration.name.clone(),
            layer: registration.layer.clone(),
            scope: registration.scope.clone(),
            registered_by: registration.registered_by.clone(),
            files: records,
        };

        let notice = run.enter(Phase::CreatedProject, registration.name.clone());
        let message = CreatedProject {
            notice,
            record,
            project,
        };
        self.publish(run, &message)?;

        run.progress.on_progress(&ProgressEvent::ProjectComplete {
            project: registration.name.clone(),
            files: message.record.files.len(),
            duration: start.elapsed(),
        });
        run.result.record_project(message.record);
        Ok(())
    }

    /// Project-relative location of a file, as reported in records and subjects
    fn relative_path(project: &ProjectRegistration, file: &FileRegistration) -> PathBuf {
        PathBuf::from(&project.name).join(&file.relative_path)
    }

    async fn create_file(
        &self,
        run: &mut Run<'_>,
        project: &Artifact,
        project_registration: &ProjectRegistration,
        registration: FileRegistration,
    ) -> Result<FileRecord, GenerationError> {
        let path = Self::relative_path(project_registration, &registration);
        let subject = path.display().to_string();
        let notice = run.enter(Phase::CreatingFile, subject.clone());

        let message = CreatingFile::new(
            notice,
            Arc::clone(&run.context),
            project.clone(),
            project_registration.clone(),
            registration,
        );
        let published = self.publish(run, &message);
        message.seal();
        published?;

        let cancel_reason = message.cancel_reason();
        let registration = message.registration;

        if let Some(reason) = cancel_reason {
            debug!(path = %subject, reason = %reason, "File cancelled by subscriber");
            let record = FileRecord {
                project: project_registration.name.clone(),
                name: registration.name.clone(),
                path,
                status: FileStatus::Skipped { reason },
                registered_by: registration.registered_by.clone(),
            };
            return self.finish_file(run, record, None);
        }

        let values = self
            .collect_placeholders(run, project_registration, &registration, &subject)
            .await?;
        run.check_cancelled(Phase::CreatingFile, &subject)?;
        run.enter(Phase::CreatingFile, subject.clone());

        let content = self
            .renderer
            .render(&registration, &values)
            .await
            .map_err(|error| GenerationError::Render {
                path: path.clone(),
                error,
            })?;

        let artifact = Artifact::construct_as::<File>(run.tree, registration.name.clone())
            .map_err(|e| run.tree_error(e))?;
        artifact.set_property("path", subject.clone());
        artifact
            .add_decorator(Arc::new(TemplateBinding::new(
                registration.template.clone(),
                values,
            )))
            .map_err(|e| run.tree_error(e))?;
        project
            .add_child(&artifact)
            .map_err(|e| run.tree_error(e))?;

        let target = run.context.output_root.join(&path);
        let (status, failure) = match self
            .persistence
            .write(&target, &content, registration.overwrite)
            .await
        {
            Ok(WriteOutcome { written: true }) => (FileStatus::Written, None),
            Ok(WriteOutcome { written: false }) => (FileStatus::Unchanged, None),
            Err(error) => {
                warn!(path = %target.display(), error = %format!("{:#}", error), "Failed to persist file");
                let status = FileStatus::Failed {
                    error: format!("{:#}", error),
                };
                (status, Some(error))
            }
        };
        artifact.set_property("status", status.label());

        let record = FileRecord {
            project: project_registration.name.clone(),
            name: registration.name.clone(),
            path,
            status,
            registered_by: registration.registered_by.clone(),
        };
        let record = self.finish_file(run, record, Some(artifact))?;

        match failure {
            Some(error) if self.config.abort_on_write_failure => {
                run.enter(Phase::CreatingFile, subject);
                Err(GenerationError::Io {
                    path: target,
                    error,
                })
            }
            _ => Ok(record),
        }
    }

    /// Requests content for every placeholder of `registration`, in declaration order
    async fn collect_placeholders(
        &self,
        run: &mut Run<'_>,
        project: &ProjectRegistration,
        registration: &FileRegistration,
        subject: &str,
    ) -> Result<IndexMap<String, String>, GenerationError> {
        let mut names = registration.placeholders.clone();
        for discovered in self.renderer.placeholders(registration) {
            if !names.contains(&discovered) {
                names.push(discovered);
            }
        }

        let mut values = IndexMap::with_capacity(names.len());
        for name in names {
            let placeholder_subject = format!("{}#{}", subject, name);
            run.check_cancelled(Phase::PlaceholderContentRequested, &placeholder_subject)?;
            let notice = run.enter(Phase::PlaceholderContentRequested, placeholder_subject);

            let message = PlaceholderContentRequested {
                notice,
                context: Arc::clone(&run.context),
                project: project.clone(),
                registration: registration.clone(),
                placeholder: name.clone(),
                contents: Bucket::new("contents"),
            };
            self.publish(run, &message)?;
            let contents = message.contents.drain();

            let text = aggregate(&contents, &self.config.placeholder_separator);
            debug!(placeholder = %name, contributions = contents.len(), "Aggregated placeholder");
            values.insert(name, text);
        }
        Ok(values)
    }

    /// Records the file, then announces it
    fn finish_file(
        &self,
        run: &mut Run<'_>,
        record: FileRecord,
        artifact: Option<Artifact>,
    ) -> Result<FileRecord, GenerationError> {
        run.result.record_file(record.clone());
        run.progress.on_progress(&ProgressEvent::FileFinished {
            project: record.project.clone(),
            path: record.path.clone(),
            status: record.status.clone(),
        });

        let notice = run.enter(Phase::CreatedFile, record.path.display().to_string());
        let message = CreatedFile {
            notice,
            record,
            artifact,
        };
        self.publish(run, &message)?;
        Ok(message.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{MemoryPersistence, PlaceholderRenderer, Schema, TemplateRef};
    use crate::progress::NoOpHandler;

    fn orchestrator(bus: &MessageBus) -> GenerationOrchestrator {
        GenerationOrchestrator::new(
            bus.clone(),
            Arc::new(PlaceholderRenderer::new()),
            Arc::new(MemoryPersistence::new()),
        )
    }

    fn context() -> GenerationContext {
        GenerationContext::new(Arc::new(Schema::new("Shop")), "Domain", "Shared")
    }

    #[tokio::test]
    async fn test_empty_run_completes() {
        let bus = MessageBus::new("generation");
        let tree = MessageBus::new("tree");
        let report = orchestrator(&bus)
            .run(&tree, context(), &NoOpHandler, &CancellationSignal::new())
            .await;

        assert!(report.is_completed());
        assert!(report.result.projects().is_empty());
        assert_eq!(report.result.solution().unwrap().name, "Shop");
        assert_eq!(report.solution.unwrap().id(), "Shop");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let bus = MessageBus::new("generation");
        let tree = MessageBus::new("tree");
        let cancel = CancellationSignal::new();
        cancel.cancel();

        let report = orchestrator(&bus)
            .run(&tree, context(), &NoOpHandler, &cancel)
            .await;
        assert_eq!(
            report.status,
            RunStatus::Cancelled {
                phase: Phase::CreatingSolution,
                subject: "Shop".into()
            }
        );
        assert!(report.solution.is_none());
    }

    #[tokio::test]
    async fn test_solution_name_override() {
        let bus = MessageBus::new("generation");
        let tree = MessageBus::new("tree");
        let orchestrator = orchestrator(&bus).with_config(GenerationConfig {
            solution_name: Some("Backend".into()),
            ..Default::default()
        });

        let report = orchestrator
            .run(&tree, context(), &NoOpHandler, &CancellationSignal::new())
            .await;
        assert_eq!(report.result.solution().unwrap().name, "Backend");
    }

    #[tokio::test]
    async fn test_render_failure_aborts_run() {
        let bus = MessageBus::new("generation");
        let tree = MessageBus::new("tree");
        bus.subscribe(|m: &CreatingSolution| {
            m.projects
                .push(ProjectRegistration::new("Domain.Shared", "Domain", "Shared", "test"))?;
            Ok(())
        });
        bus.subscribe(|m: &CreatingProject| {
            m.files.push(FileRegistration::new(
                "Customer",
                "Customer.cs",
                TemplateRef::Named("missing".into()),
                "test",
            ))?;
            Ok(())
        });

        let report = orchestrator(&bus)
            .run(&tree, context(), &NoOpHandler, &CancellationSignal::new())
            .await;
        assert!(report.is_aborted());
        assert!(matches!(report.error, Some(GenerationError::Render { .. })));
        assert!(report.result.files().is_empty());

        let project = &report.solution.unwrap().children()[0];
        assert_eq!(project.id(), "Domain.Shared");
        assert_eq!(project.child_count(), 0);
    }
}
