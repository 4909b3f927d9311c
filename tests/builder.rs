// ABOUTME: Integration tests for project building across several builders.
// ABOUTME: Covers override order, null disabling, diagnostics and authorization wrapping.

mod support;

use radi_handlers::config::ProjectConfig;
use radi_handlers::diagnostics::{Diagnostics, WarningKind};
use radi_handlers::handler::{BuildError, BuilderRegistry, ProjectBuild, ProjectBuilder};
use radi_handlers::operation::{Operation, OperationError, run};
use std::path::Path;
use tempfile::TempDir;

fn build(root: &Path, yaml: &str) -> (Result<ProjectBuild, BuildError>, Diagnostics) {
    support::init_tracing();
    let project = ProjectConfig::from_yaml(yaml, root).unwrap();
    let registry = BuilderRegistry::default();
    let mut diag = Diagnostics::default();
    let build = ProjectBuilder::new(&registry).build(&project, &mut diag);
    (build, diag)
}

fn project_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
    dir
}

#[test]
fn later_builder_overrides_earlier_one() {
    let dir = project_dir();
    let yaml = r#"
name: demo
builders:
  - type: local
    implementations: [config, setting, orchestrate]
    settings:
      user_config_dir: false
  - type: null
    implementations: [orchestrate]
"#;
    let (build, diag) = build(dir.path(), yaml);
    let build = build.unwrap();

    assert!(!diag.has_warnings(), "{:?}", diag.warnings());
    assert_eq!(build.builders, ["local", "null"]);
    assert!(!build.secured);

    let up = build.operations.get("orchestrate.up").unwrap();
    assert_eq!(up.label(), "orchestrate.up (disabled)");
    let get = build.operations.get("config.get").unwrap();
    assert_eq!(get.label(), "Get config");
}

#[test]
fn unsupported_implementation_is_a_warning() {
    let dir = project_dir();
    let yaml = r#"
builders:
  - type: compose
    implementations: [orchestrate, config]
"#;
    let (build, diag) = build(dir.path(), yaml);
    let build = build.unwrap();

    assert!(build.operations.contains("orchestrate.up"));
    assert!(!build.operations.contains("config.get"));
    assert_eq!(diag.warnings().len(), 1);
    assert_eq!(diag.warnings()[0].kind, WarningKind::UnsupportedImplementation);
}

#[test]
fn missing_compose_file_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = "builders:\n  - type: compose\n    implementations: [monitor]\n";
    let (build, diag) = build(dir.path(), yaml);

    assert!(build.is_ok());
    assert!(diag.warnings().iter().any(|w| w.kind == WarningKind::MissingSource));
}

#[test]
fn unknown_builder_type_fails() {
    let dir = project_dir();
    let yaml = "builders:\n  - type: kubernetes\n    implementations: [orchestrate]\n";
    let (build, _) = build(dir.path(), yaml);
    assert!(matches!(build, Err(BuildError::UnknownBuilder(ref name)) if name == "kubernetes"));
}

#[test]
fn invalid_builder_settings_fail() {
    let dir = project_dir();
    let yaml = r#"
builders:
  - type: rancher
    implementations: [orchestrate]
    settings:
      environment: Default
"#;
    let (build, _) = build(dir.path(), yaml);
    assert!(matches!(build, Err(BuildError::Settings { ref builder, .. }) if builder == "rancher"));
}

const SECURED: &str = r#"
name: demo
builders:
  - type: local
    implementations: [setting, security]
    settings:
      user_config_dir: false
"#;

#[tokio::test]
async fn denied_operation_does_not_run() {
    let dir = project_dir();
    support::write_config(
        dir.path(),
        "authorize.yml",
        r#"
rules:
  - id: no-writes
    operation: "\\.set$"
    effect: deny
"#,
    );
    let (build, _) = build(dir.path(), SECURED);
    let mut build = build.unwrap();
    assert!(build.secured);

    let mut set = build.operations.remove("setting.set").unwrap();
    set.properties_mut().set_external("setting.key", "db").unwrap();
    set.properties_mut().set_external("setting.value", "x").unwrap();
    let err = set.exec().await.unwrap_err();
    assert!(matches!(err, OperationError::Unauthorized { ref operation, .. } if operation == "setting.set"));
    assert!(!dir.path().join(".radi/settings.yml").exists());

    let mut list = build.operations.remove("setting.list").unwrap();
    assert!(run(list.as_mut()).await.is_success());
}

#[tokio::test]
async fn security_operations_are_never_gated() {
    let dir = project_dir();
    support::write_config(dir.path(), "authorize.yml", "default: deny\n");
    let (build, _) = build(dir.path(), SECURED);
    let mut build = build.unwrap();

    let mut authorize = build.operations.remove("security.authorize").unwrap();
    authorize
        .properties_mut()
        .set_external("security.operation", "setting.get")
        .unwrap();
    assert!(run(authorize.as_mut()).await.is_success());
    assert_eq!(authorize.properties().string("security.decision"), Some("neutral"));
    assert_eq!(authorize.properties().bool("security.allowed"), Some(false));

    let mut get = build.operations.remove("setting.get").unwrap();
    get.properties_mut().set_external("setting.key", "db").unwrap();
    let result = run(get.as_mut()).await;
    assert!(!result.is_success());
    assert!(result.errors[0].contains("not authorized"));
}

#[test]
fn invalid_rule_pattern_fails_the_build() {
    let dir = project_dir();
    support::write_config(
        dir.path(),
        "authorize.yml",
        "rules:\n  - id: broken\n    operation: \"(\"\n    effect: deny\n",
    );
    let (build, _) = build(dir.path(), SECURED);
    let err = build.err().unwrap();
    assert!(err.to_string().contains("broken"));
}
