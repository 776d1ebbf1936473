//! Output formatting for generation reports
//!
//! # Example
//!
//! ```ignore
//! use artigen::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_report(&report, &ReportExtras::default())?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::artifact::Artifact;
use crate::config::ArtigenConfig;
use crate::generation::{GenerationResult, RunReport, RunStatus};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

/// Optional sections printed after the run summary
#[derive(Debug, Default)]
pub struct ReportExtras<'a> {
    /// Root of the artifact tree to render
    pub tree: Option<&'a Artifact>,
    /// Persisted path and content of every generated file
    pub contents: Vec<(PathBuf, String)>,
}

#[derive(Serialize)]
struct TreeNode {
    id: String,
    kind: String,
    decorators: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id().to_string(),
            kind: artifact.kind().to_string(),
            decorators: artifact.decorator_keys(),
            children: artifact.children().iter().map(Self::from_artifact).collect(),
        }
    }
}

#[derive(Serialize)]
struct FileContent<'a> {
    path: &'a PathBuf,
    content: &'a str,
}

#[derive(Serialize)]
struct ReportView<'a> {
    run_id: String,
    status: &'a RunStatus,
    started_at: String,
    duration_ms: u128,
    result: &'a GenerationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<TreeNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    contents: Vec<FileContent<'a>>,
}

/// Output formatter for run reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a run report according to the configured format
    pub fn format_report(&self, report: &RunReport, extras: &ReportExtras<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_report_json(report, extras),
            OutputFormat::Human => Ok(self.format_report_human(report, extras)),
        }
    }

    /// Formats configuration display
    pub fn format_config(&self, config: &ArtigenConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: std::collections::BTreeMap<_, _> =
                    config.to_display_map().into_iter().collect();
                serde_json::to_string_pretty(&map).context("Failed to serialize config to JSON")
            }
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_report_json(&self, report: &RunReport, extras: &ReportExtras<'_>) -> Result<String> {
        let view = ReportView {
            run_id: report.run_id.to_string(),
            status: &report.status,
            started_at: report.started_at.to_rfc3339(),
            duration_ms: report.duration.as_millis(),
            result: &report.result,
            tree: extras.tree.map(TreeNode::from_artifact),
            contents: extras
                .contents
                .iter()
                .map(|(path, content)| FileContent { path, content })
                .collect(),
        };
        serde_json::to_string_pretty(&view).context("Failed to serialize run report to JSON")
    }

    fn format_report_human(&self, report: &RunReport, extras: &ReportExtras<'_>) -> String {
        let mut output = String::new();

        match &report.status {
            RunStatus::Completed => output.push_str("\u{2713} Generation Complete\n"),
            RunStatus::Cancelled { .. } => output.push_str("\u{26A0} Generation Cancelled\n"),
            RunStatus::Aborted { .. } => output.push_str("\u{2717} Generation Aborted\n"),
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        if let Some(solution) = report.result.solution() {
            output.push_str(&format!("Solution:  {}\n", solution.name));
        }
        output.push_str(&format!(
            "Projects:  {}\nFiles:     {} written, {} unchanged, {} skipped, {} failed\n\n",
            report.result.projects().len(),
            report.result.count("written"),
            report.result.count("unchanged"),
            report.result.count("skipped"),
            report.result.count("failed"),
        ));

        for project in report.result.projects() {
            output.push_str(&format!(
                "{} ({}/{}, by {})\n",
                project.name, project.layer, project.scope, project.registered_by
            ));
            for (i, file) in project.files.iter().enumerate() {
                let connector = if i == project.files.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!(
                    "{}\u{2500} {:<10} {}\n",
                    connector,
                    file.status.label(),
                    file.path.display()
                ));
            }
            output.push('\n');
        }

        match &report.status {
            RunStatus::Completed => {}
            RunStatus::Cancelled { phase, subject } => {
                output.push_str(&format!("Cancelled during {} ({})\n", phase, subject));
            }
            RunStatus::Aborted {
                phase,
                subject,
                error,
            } => {
                output.push_str(&format!("Aborted during {} ({}): {}\n", phase, subject, error));
            }
        }

        if let Some(tree) = extras.tree {
            output.push_str("\nArtifact Tree:\n");
            render_tree(tree, 0, &mut output);
        }

        for (path, content) in &extras.contents {
            output.push_str(&format!("\n--- {} ---\n", path.display()));
            output.push_str(content);
            output.push('\n');
        }

        output.push_str(&format!(
            "\nStarted {} and processed in {}ms\n",
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.duration.as_millis()
        ));
        output
    }
}

fn render_tree(artifact: &Artifact, depth: usize, output: &mut String) {
    let decorators = artifact.decorator_keys();
    output.push_str(&format!("{}{} [{}]", "  ".repeat(depth), artifact.id(), artifact.kind()));
    if !decorators.is_empty() {
        output.push_str(&format!(" +{}", decorators.join(", +")));
    }
    output.push('\n');
    for child in artifact.children() {
        render_tree(&child, depth + 1, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Layer, Scope};
    use crate::bus::MessageBus;
    use crate::generation::{
        CancellationSignal, CreatingProject, CreatingSolution, FileRegistration,
        GenerationContext, GenerationOrchestrator, MemoryPersistence, PlaceholderRenderer,
        ProjectRegistration, Schema, TemplateRef,
    };
    use crate::progress::NoOpHandler;
    use std::sync::Arc;

    async fn create_test_report() -> RunReport {
        let bus = MessageBus::new("generation");
        let tree = MessageBus::new("tree");
        bus.subscribe(|m: &CreatingSolution| {
            m.projects
                .push(ProjectRegistration::new("Domain.Shared", "Domain", "Shared", "test"))?;
            Ok(())
        });
        bus.subscribe(|m: &CreatingProject| {
            m.files.push(FileRegistration::new(
                "Readme",
                "README.md",
                TemplateRef::Inline("# Shop".into()),
                "test",
            ))?;
            Ok(())
        });
        let orchestrator = GenerationOrchestrator::new(
            bus,
            Arc::new(PlaceholderRenderer::new()),
            Arc::new(MemoryPersistence::new()),
        );
        let context = GenerationContext::new(Arc::new(Schema::new("Shop")), "Domain", "Shared");
        orchestrator
            .run(&tree, context, &NoOpHandler, &CancellationSignal::new())
            .await
    }

    #[tokio::test]
    async fn test_json_format() {
        let report = create_test_report().await;
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter
            .format_report(&report, &ReportExtras::default())
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"]["state"], "completed");
        assert_eq!(value["result"]["files"][0]["status"], "written");
        assert!(value.get("tree").is_none());
    }

    #[tokio::test]
    async fn test_human_format() {
        let report = create_test_report().await;
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter
            .format_report(&report, &ReportExtras::default())
            .unwrap();

        assert!(output.contains("Generation Complete"));
        assert!(output.contains("Solution:  Shop"));
        assert!(output.contains("1 written"));
        assert!(output.contains("Domain.Shared/README.md"));
    }

    #[tokio::test]
    async fn test_human_format_with_tree() {
        let report = create_test_report().await;
        let bus = MessageBus::new("tree");
        let layer = Artifact::construct_as::<Layer>(&bus, "Domain").unwrap();
        let scope = Artifact::construct_as::<Scope>(&bus, "Shared").unwrap();
        layer.add_child(&scope).unwrap();

        let extras = ReportExtras {
            tree: Some(&layer),
            contents: vec![(PathBuf::from("Domain.Shared/README.md"), "# Shop".into())],
        };
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_report(&report, &extras)
            .unwrap();
        assert!(output.contains("Artifact Tree:"));
        assert!(output.contains("  Shared [scope]"));
        assert!(output.contains("--- Domain.Shared/README.md ---\n# Shop"));
    }

    #[test]
    fn test_config_format() {
        let config = ArtigenConfig {
            placeholder_separator: "\n".into(),
            abort_on_write_failure: "false".to_string(),
            delivery_policy: "fail-fast".into(),
            log_level: "info".into(),
        };
        let json = OutputFormatter::new(OutputFormat::Json)
            .format_config(&config)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["delivery_policy"], "fail-fast");

        let human = OutputFormatter::new(OutputFormat::Human)
            .format_config(&config)
            .unwrap();
        assert!(human.contains("Artigen Configuration:"));
    }
}
