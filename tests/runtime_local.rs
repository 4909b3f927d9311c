// ABOUTME: Integration tests for the local container engine and container commands.
// ABOUTME: Skipped when no Docker or Podman socket is reachable.

mod support;

use futures::StreamExt;
use radi_handlers::diagnostics::Diagnostics;
use radi_handlers::handler::{Builder, BuilderSettings, Implementation, ProjectContext};
use radi_handlers::handlers::local::{COMMAND_LABEL, LocalBuilder, PROJECT_LABEL, props};
use radi_handlers::operation::{Operation, run};
use radi_handlers::runtime::{
    BollardRuntime, ContainerConfig, ContainerFilters, ContainerOps, ImageOps, LogOps, LogOptions,
    RuntimeInfo, detect_local,
};
use radi_handlers::types::{ImageRef, ProjectName};

const IMAGE: &str = "alpine:3.20";

fn local_runtime() -> Option<BollardRuntime> {
    let socket = detect_local().ok()?;
    BollardRuntime::connect(&socket).ok()
}

macro_rules! require_runtime {
    () => {
        match local_runtime() {
            Some(rt) => rt,
            None => {
                eprintln!("Skipping test: no local container runtime found");
                return;
            }
        }
    };
}

async fn alpine(runtime: &BollardRuntime) -> ImageRef {
    let image = ImageRef::parse(IMAGE).unwrap();
    if !runtime.image_exists(&image).await.unwrap() {
        runtime.pull_image(&image).await.unwrap();
    }
    image
}

#[tokio::test]
async fn runtime_info() {
    let runtime = require_runtime!();

    runtime.ping().await.unwrap();
    let info = runtime.info().await.unwrap();
    assert!(!info.name.is_empty());
    assert!(!info.version.is_empty());
    assert!(info.to_map().contains_key("version"));
}

#[tokio::test]
async fn missing_image_is_reported() {
    let runtime = require_runtime!();

    let image = ImageRef::parse("radi-test/does-not-exist:never").unwrap();
    assert!(!runtime.image_exists(&image).await.unwrap());
}

#[tokio::test]
async fn container_lifecycle_with_labels_and_logs() {
    let runtime = require_runtime!();
    let image = alpine(&runtime).await;

    let mut config = ContainerConfig::new(image);
    config.command = Some(vec!["sh".into(), "-c".into(), "echo out; echo err >&2; exit 7".into()]);
    config.labels.insert(PROJECT_LABEL.to_string(), "radi-runtime-test".to_string());
    let id = runtime.create_container(&config).await.unwrap();

    runtime.start_container(&id).await.unwrap();
    assert_eq!(runtime.wait_container(&id).await.unwrap(), 7);

    let listed = runtime
        .list_containers(&ContainerFilters::default().label(PROJECT_LABEL, "radi-runtime-test").all())
        .await
        .unwrap();
    assert!(listed.iter().any(|c| c.id == id));

    let lines: Vec<String> = runtime
        .container_logs(&id, &LogOptions::tail(10))
        .await
        .unwrap()
        .filter_map(|line| async move { line.ok().map(|l| l.content) })
        .collect()
        .await;
    let text = lines.concat();
    assert!(text.contains("out"));
    assert!(text.contains("err"));

    runtime.remove_container(&id, true).await.unwrap();
    let listed = runtime
        .list_containers(&ContainerFilters::default().label(PROJECT_LABEL, "radi-runtime-test").all())
        .await
        .unwrap();
    assert!(listed.iter().all(|c| c.id != id));
}

#[tokio::test]
async fn container_command_runs_and_is_removed() {
    let runtime = require_runtime!();
    alpine(&runtime).await;
    support::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    support::write_config(
        dir.path(),
        "commands.yml",
        &format!("probe:\n  image: {IMAGE}\n  cmd: [sh, -c, 'exit $CODE']\n  environment:\n    CODE: \"5\"\n"),
    );

    let project = ProjectContext {
        root: dir.path().to_path_buf(),
        name: ProjectName::new("radi-command-test").unwrap(),
        builders: vec!["local".to_string()],
    };
    let settings = BuilderSettings::new(
        project,
        serde_yaml::from_str("user_config_dir: false").unwrap(),
    );
    let mut builder = LocalBuilder::new();
    builder
        .activate(&[Implementation::Command], &settings, &mut Diagnostics::default())
        .unwrap();

    let mut op = builder.operations().remove("command.exec").unwrap();
    op.properties_mut().set_external(props::COMMAND_ID, "probe").unwrap();
    let result = run(op.as_mut()).await;

    assert!(!result.is_success());
    assert_eq!(op.properties().int(props::COMMAND_EXIT_CODE), Some(5));

    let leftovers = runtime
        .list_containers(&ContainerFilters::default().label(COMMAND_LABEL, "probe").all())
        .await
        .unwrap();
    assert!(leftovers
        .iter()
        .all(|c| c.labels.get(PROJECT_LABEL).map(String::as_str) != Some("radi-command-test")));
}
