//! Command handlers; each returns the process exit code

use super::commands::{ConfigArgs, GenerateArgs};
use super::output::{OutputFormatter, ReportExtras};
use crate::artifact::{Layer, Scope};
use crate::bus::MessageBus;
use crate::config::ArtigenConfig;
use crate::generation::{
    CancellationSignal, GenerationDecorator, GenerationOrchestrator, JsonSchemaProvider,
    MemoryPersistence, PlaceholderRenderer, RunReport, RunStatus,
};
use crate::generators::{GenerationManifest, ManifestGenerator};
use crate::progress::{LoggingHandler, NoOpHandler, ProgressHandler};
use crate::workspace::Workspace;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const EXIT_COMPLETED: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 2;

/// Exit code for a finished run
pub fn exit_code(report: &RunReport) -> i32 {
    match report.status {
        RunStatus::Completed => EXIT_COMPLETED,
        RunStatus::Cancelled { .. } => EXIT_CANCELLED,
        RunStatus::Aborted { .. } => EXIT_FAILED,
    }
}

pub async fn handle_generate(args: &GenerateArgs, quiet: bool) -> i32 {
    match run_generate(args, quiet).await {
        Ok(code) => code,
        Err(e) => {
            error!("Generation failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_FAILED
        }
    }
}

async fn run_generate(args: &GenerateArgs, quiet: bool) -> Result<i32> {
    let config = ArtigenConfig::default();
    config.validate()?;
    let policy = config.delivery_policy()?;

    let manifest = GenerationManifest::from_file(&args.manifest)?;
    info!(
        manifest = %args.manifest.display(),
        generator = %manifest.name,
        projects = manifest.projects.len(),
        "Manifest loaded"
    );

    let mut generation = config.generation()?;
    generation.solution_name = manifest.solution.name.clone();

    let workspace = Workspace::with_policy("artigen", policy)?;
    let layer = workspace.create_typed::<Layer>(args.layer.clone())?;
    let scope = workspace.create_typed::<Scope>(args.scope.clone())?;
    workspace.root().add_child(&layer)?;
    layer.add_child(&scope)?;

    let persistence = Arc::new(MemoryPersistence::new());
    let orchestrator = Arc::new(
        GenerationOrchestrator::new(
            MessageBus::with_policy("generation", policy),
            Arc::new(PlaceholderRenderer::new()),
            persistence.clone(),
        )
        .with_config(generation),
    );
    Arc::new(ManifestGenerator::new(manifest)).install(orchestrator.bus());

    scope.add_decorator(Arc::new(GenerationDecorator::new(
        orchestrator,
        Arc::new(JsonSchemaProvider::new(args.schema.clone())),
    )))?;

    let cancel = CancellationSignal::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling generation");
                cancel.cancel();
            }
        })
    };

    let progress: Box<dyn ProgressHandler> = if quiet {
        Box::new(NoOpHandler)
    } else {
        Box::new(LoggingHandler)
    };
    let reports = scope.generate(progress.as_ref(), &cancel).await;
    interrupt.abort();
    let report = reports?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("scope `{}` produced no generation run", scope.id()))?;

    let contents = if args.show_content {
        persistence
            .paths()
            .into_iter()
            .filter_map(|path| persistence.get(&path).map(|content| (path, content)))
            .collect()
    } else {
        Vec::new()
    };
    let output = OutputFormatter::new(args.format.into())
        .format_report(
            &report,
            &ReportExtras {
                tree: args.tree.then(|| workspace.root()),
                contents,
            },
        )
        .context("Failed to format run report")?;
    println!("{}", output);

    let code = exit_code(&report);
    debug!(exit_code = code, "Generate command finished");
    workspace.dispose();
    Ok(code)
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = ArtigenConfig::default();
    if let Err(e) = config.validate() {
        eprintln!("Warning: {}", e);
    }
    match OutputFormatter::new(args.format.into()).format_config(&config) {
        Ok(output) => {
            println!("{}", output);
            EXIT_COMPLETED
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILED
        }
    }
}
