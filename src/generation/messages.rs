//! Phase messages published on the generation bus
//!
//! Every message embeds a [`PipelineNotice`]; subscribe to that type to follow
//! the whole phase sequence of every run.

use super::context::GenerationContext;
use super::registration::{FileRegistration, PlaceholderContent, ProjectRegistration};
use super::result::{FileRecord, ProjectRecord};
use crate::artifact::Artifact;
use crate::bus::{Bucket, BusError, Message};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Pipeline phase, one per message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    CreatingSolution,
    CreatingProject,
    CreatingFile,
    PlaceholderContentRequested,
    CreatedFile,
    CreatedProject,
    CreatedSolution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CreatingSolution => "CreatingSolution",
            Phase::CreatingProject => "CreatingProject",
            Phase::CreatingFile => "CreatingFile",
            Phase::PlaceholderContentRequested => "PlaceholderContentRequested",
            Phase::CreatedFile => "CreatedFile",
            Phase::CreatedProject => "CreatedProject",
            Phase::CreatedSolution => "CreatedSolution",
        };
        f.write_str(name)
    }
}

/// Base payload of every phase message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineNotice {
    pub run_id: Uuid,
    pub phase: Phase,
    /// Solution, project or file path the phase is about
    pub subject: String,
}

macro_rules! pipeline_message {
    ($($name:ident),* $(,)?) => {
        $(
            impl Message for $name {
                fn bases(&self) -> Vec<&(dyn Any + Send + Sync)> {
                    vec![&self.notice]
                }
            }
        )*
    };
}

/// Subscribers push the projects the solution should contain
#[derive(Debug)]
pub struct CreatingSolution {
    pub notice: PipelineNotice,
    pub context: Arc<GenerationContext>,
    pub solution: Artifact,
    pub projects: Bucket<ProjectRegistration>,
}

/// Subscribers push the files `registration` should contain
#[derive(Debug)]
pub struct CreatingProject {
    pub notice: PipelineNotice,
    pub context: Arc<GenerationContext>,
    pub project: Artifact,
    pub registration: ProjectRegistration,
    pub files: Bucket<FileRegistration>,
}

/// Last chance to skip a file before it is rendered
#[derive(Debug)]
pub struct CreatingFile {
    pub notice: PipelineNotice,
    pub context: Arc<GenerationContext>,
    pub project: Artifact,
    pub project_registration: ProjectRegistration,
    pub registration: FileRegistration,
    cancellation: Bucket<String>,
}

impl CreatingFile {
    pub(crate) fn new(
        notice: PipelineNotice,
        context: Arc<GenerationContext>,
        project: Artifact,
        project_registration: ProjectRegistration,
        registration: FileRegistration,
    ) -> Self {
        Self {
            notice,
            context,
            project,
            project_registration,
            registration,
            cancellation: Bucket::new("cancellation"),
        }
    }

    /// Skips this file. The first reason given is the one recorded.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<(), BusError> {
        self.cancellation.push(reason.into())
    }

    pub fn is_cancelled(&self) -> bool {
        !self.cancellation.is_empty()
    }

    pub fn cancel_reason(&self) -> Option<String> {
        self.cancellation.first()
    }

    pub(crate) fn seal(&self) {
        self.cancellation.seal();
    }
}

/// Subscribers contribute text for one placeholder of one file
#[derive(Debug)]
pub struct PlaceholderContentRequested {
    pub notice: PipelineNotice,
    pub context: Arc<GenerationContext>,
    pub project: ProjectRegistration,
    pub registration: FileRegistration,
    pub placeholder: String,
    pub contents: Bucket<PlaceholderContent>,
}

/// A file was materialized, left unchanged, skipped or failed
#[derive(Debug)]
pub struct CreatedFile {
    pub notice: PipelineNotice,
    pub record: FileRecord,
    /// `None` when the file was skipped
    pub artifact: Option<Artifact>,
}

/// A project and all of its files are done
#[derive(Debug)]
pub struct CreatedProject {
    pub notice: PipelineNotice,
    pub record: ProjectRecord,
    pub project: Artifact,
}

/// Every project of the solution is done
#[derive(Debug)]
pub struct CreatedSolution {
    pub notice: PipelineNotice,
    pub solution: Artifact,
    pub projects: Vec<ProjectRecord>,
}

pipeline_message!(
    CreatingSolution,
    CreatingProject,
    CreatingFile,
    PlaceholderContentRequested,
    CreatedFile,
    CreatedProject,
    CreatedSolution,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Project;
    use crate::bus::MessageBus;
    use crate::generation::{Schema, TemplateRef};

    fn creating_file() -> CreatingFile {
        let tree = MessageBus::new("tree");
        let project = Artifact::construct_as::<Project>(&tree, "Domain.Shared").unwrap();
        let context = Arc::new(GenerationContext::new(
            Arc::new(Schema::new("Shop")),
            "Domain",
            "Shared",
        ));
        CreatingFile::new(
            PipelineNotice {
                run_id: Uuid::new_v4(),
                phase: Phase::CreatingFile,
                subject: "Domain.Shared/a.txt".into(),
            },
            context,
            project,
            ProjectRegistration::new("Domain.Shared", "Domain", "Shared", "test"),
            FileRegistration::new("a", "a.txt", TemplateRef::Inline(String::new()), "test"),
        )
    }

    #[test]
    fn test_first_cancel_reason_wins() {
        let message = creating_file();
        assert!(!message.is_cancelled());

        message.cancel("exists upstream").unwrap();
        message.cancel("second opinion").unwrap();
        assert!(message.is_cancelled());
        assert_eq!(message.cancel_reason().as_deref(), Some("exists upstream"));
    }

    #[test]
    fn test_cancel_after_seal_rejected() {
        let message = creating_file();
        message.seal();
        assert!(message.cancel("too late").is_err());
        assert!(!message.is_cancelled());
    }

    #[test]
    fn test_notice_subscriber_sees_phase_messages() {
        let bus = MessageBus::new("generation");
        let phases = Arc::new(std::sync::Mutex::new(Vec::new()));
        let p = phases.clone();
        bus.subscribe(move |notice: &PipelineNotice| {
            p.lock().unwrap().push(notice.phase);
            Ok(())
        });

        bus.publish(&creating_file()).unwrap();
        assert_eq!(*phases.lock().unwrap(), vec![Phase::CreatingFile]);
    }
}
