//! Manifest generator integration tests
//!
//! The manifest generator shares the generation bus with hand-written modules;
//! these tests check that their contributions interleave as expected.

use artigen::bus::MessageBus;
use artigen::generation::{
    CancellationSignal, CreatingFile, GenerationConfig, GenerationContext,
    GenerationOrchestrator, JsonSchemaProvider, MemoryPersistence, PlaceholderContent,
    PlaceholderContentRequested, PlaceholderRenderer, SchemaProvider,
};
use artigen::generators::{GenerationManifest, ManifestGenerator, ENTITY_PROPERTY};
use artigen::progress::NoOpHandler;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const MANIFEST: &str = r#"
name = "crud"

[solution]
name = "Backend"

[[projects]]
name = "{schema}.{layer}"

[[projects.files]]
name = "{entity}Repository"
path = "Repositories/{entity}Repository.cs"
per_entity = true
template_name = "repository"

[[contributions]]
placeholder = "usings"
text = "using System;"
priority = 0

[[skip]]
file = "OrderRepository"
reason = "maintained by hand"
"#;

const SCHEMA: &str = r#"{
  "name": "Shop",
  "entities": [
    { "name": "Customer", "attributes": [] },
    { "name": "Order", "attributes": [] },
    { "name": "Invoice" }
  ]
}"#;

async fn generate(dir: &TempDir, extra: impl FnOnce(&MessageBus)) -> Arc<MemoryPersistence> {
    let manifest_path = dir.path().join("artigen.toml");
    let schema_path = dir.path().join("schema.json");
    fs::write(&manifest_path, MANIFEST).unwrap();
    fs::write(&schema_path, SCHEMA).unwrap();

    let manifest = GenerationManifest::from_file(&manifest_path).unwrap();
    let bus = MessageBus::new("generation");
    Arc::new(ManifestGenerator::new(manifest.clone())).install(&bus);
    extra(&bus);

    let persistence = Arc::new(MemoryPersistence::new());
    let renderer = PlaceholderRenderer::new()
        .with_template("repository", "{{usings}}\nclass {{entity}}Repository {}");
    let orchestrator = GenerationOrchestrator::new(bus, Arc::new(renderer), persistence.clone())
        .with_config(GenerationConfig {
            solution_name: manifest.solution.name.clone(),
            ..Default::default()
        });

    let schema = JsonSchemaProvider::new(&schema_path).load().await.unwrap();
    let context = GenerationContext::new(schema, "Data", "Shared").with_output_root("out");
    let report = orchestrator
        .run(&MessageBus::new("tree"), context, &NoOpHandler, &CancellationSignal::new())
        .await;
    assert!(report.is_completed());
    assert_eq!(report.result.solution().unwrap().name, "Backend");
    persistence
}

#[tokio::test]
async fn test_manifest_only() {
    let dir = TempDir::new().unwrap();
    let persistence = generate(&dir, |_| {}).await;

    let mut paths: Vec<String> = persistence
        .paths()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "out/Shop.Data/Repositories/CustomerRepository.cs",
            "out/Shop.Data/Repositories/InvoiceRepository.cs",
        ]
    );
    assert_eq!(
        persistence
            .get(Path::new("out/Shop.Data/Repositories/CustomerRepository.cs"))
            .unwrap(),
        "using System;\nclass CustomerRepository {}"
    );
}

#[tokio::test]
async fn test_code_module_contributes_alongside_manifest() {
    let dir = TempDir::new().unwrap();
    let persistence = generate(&dir, |bus| {
        bus.subscribe(|m: &PlaceholderContentRequested| {
            if m.placeholder == "usings" {
                m.contents
                    .push(PlaceholderContent::new("using System.Linq;", 10, "linq"))?;
                m.contents
                    .push(PlaceholderContent::new("// generated", -10, "header"))?;
            }
            Ok(())
        });
    })
    .await;

    assert_eq!(
        persistence
            .get(Path::new("out/Shop.Data/Repositories/InvoiceRepository.cs"))
            .unwrap(),
        "// generated\nusing System;\nusing System.Linq;\nclass InvoiceRepository {}"
    );
}

#[tokio::test]
async fn test_code_module_can_skip_manifest_files() {
    let dir = TempDir::new().unwrap();
    let persistence = generate(&dir, |bus| {
        bus.subscribe(|m: &CreatingFile| {
            let entity = m
                .registration
                .properties
                .get(ENTITY_PROPERTY)
                .and_then(|v| v.as_str());
            if entity == Some("Invoice") {
                m.cancel("not needed")?;
            }
            Ok(())
        });
    })
    .await;

    assert_eq!(persistence.len(), 1);
    assert!(persistence.contains(Path::new(
        "out/Shop.Data/Repositories/CustomerRepository.cs"
    )));
}
