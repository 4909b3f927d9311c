// ABOUTME: Integration tests for the compose builder's orchestrate and monitor operations.
// ABOUTME: A stub compose script records its arguments instead of talking to an engine.

mod support;

use radi_handlers::diagnostics::{Diagnostics, WarningKind};
use radi_handlers::handler::{Builder, BuilderSettings, Implementation, ProjectContext};
use radi_handlers::handlers::compose::ComposeBuilder;
use radi_handlers::operation::{Operation, Operations, run};
use radi_handlers::types::ProjectName;
use std::path::Path;
use tempfile::TempDir;

// Run as `sh compose ...` from the project directory, so `$@` starts after the
// `compose` subcommand.
const STUB: &str = r#"printf '%s\n' "$@" > args.txt
case "$*" in
  *" config") echo "services:"; echo "  web:"; echo "    image: nginx" ;;
  *" pull"*) echo "registry unreachable" >&2; exit 18 ;;
esac
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("compose"), STUB).unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        std::fs::write(dir.path().join("override.yml"), "services: {}\n").unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn operations(&self, settings: &str, diag: &mut Diagnostics) -> Operations {
        let project = ProjectContext {
            root: self.root().to_path_buf(),
            name: ProjectName::new("shop").unwrap(),
            builders: vec!["compose".to_string()],
        };
        let settings = format!("binary: sh\n{settings}");
        let settings = BuilderSettings::new(project, serde_yaml::from_str(&settings).unwrap());

        let mut builder = ComposeBuilder::new();
        builder
            .activate(
                &[Implementation::Orchestrate, Implementation::Monitor],
                &settings,
                diag,
            )
            .unwrap();
        builder.operations()
    }

    fn args(&self) -> Vec<String> {
        std::fs::read_to_string(self.root().join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[tokio::test]
async fn up_passes_project_files_and_flags() {
    let fixture = Fixture::new();
    let mut ops = fixture.operations(
        "files: [docker-compose.yml, override.yml]\nprofiles: [web]\n",
        &mut Diagnostics::default(),
    );

    let mut up = ops.remove("orchestrate.up").unwrap();
    up.properties_mut().set_external("orchestrate.services", "web,worker").unwrap();
    up.properties_mut().set_external("orchestrate.build", "true").unwrap();
    assert!(run(up.as_mut()).await.is_success());

    let root = fixture.root().display().to_string();
    assert_eq!(
        fixture.args(),
        [
            "--project-name".to_string(),
            "shop".into(),
            "--project-directory".into(),
            root.clone(),
            "--file".into(),
            format!("{root}/docker-compose.yml"),
            "--file".into(),
            format!("{root}/override.yml"),
            "--profile".into(),
            "web".into(),
            "up".into(),
            "--detach".into(),
            "--build".into(),
            "web".into(),
            "worker".into(),
        ]
    );
}

#[tokio::test]
async fn stop_and_down_render_their_options() {
    let fixture = Fixture::new();
    let mut ops = fixture.operations("project: shop-staging\n", &mut Diagnostics::default());

    let mut stop = ops.remove("orchestrate.stop").unwrap();
    stop.properties_mut().set_external("orchestrate.timeout", "30s").unwrap();
    assert!(run(stop.as_mut()).await.is_success());
    let args = fixture.args();
    assert_eq!(args[1], "shop-staging");
    assert!(args.ends_with(&["stop".to_string(), "--timeout".into(), "30".into()]));

    let mut down = ops.remove("orchestrate.down").unwrap();
    down.properties_mut().set_external("orchestrate.volumes", "yes").unwrap();
    assert!(run(down.as_mut()).await.is_success());
    assert!(fixture.args().ends_with(&["down".to_string(), "--volumes".into()]));
}

#[tokio::test]
async fn compose_failure_carries_stderr() {
    let fixture = Fixture::new();
    let mut ops = fixture.operations("", &mut Diagnostics::default());

    let mut pull = ops.remove("orchestrate.pull").unwrap();
    let result = run(pull.as_mut()).await;
    assert!(!result.is_success());
    assert!(result.errors[0].contains("exited with code 18"));
    assert!(result.errors[0].contains("registry unreachable"));
}

#[tokio::test]
async fn config_output_is_captured() {
    let fixture = Fixture::new();
    let mut ops = fixture.operations("", &mut Diagnostics::default());

    let mut config = ops.remove("monitor.config").unwrap();
    assert!(run(config.as_mut()).await.is_success());
    assert!(config
        .properties()
        .string("monitor.config")
        .unwrap()
        .contains("image: nginx"));
}

#[tokio::test]
async fn negative_tail_is_rejected() {
    let fixture = Fixture::new();
    let mut ops = fixture.operations("", &mut Diagnostics::default());

    let mut logs = ops.remove("monitor.logs").unwrap();
    logs.properties_mut().set_external("monitor.tail", "-1").unwrap();
    let result = run(logs.as_mut()).await;
    assert!(result.errors[0].contains("must not be negative"));
}

#[test]
fn missing_compose_file_is_a_warning() {
    let fixture = Fixture::new();
    let mut diag = Diagnostics::default();
    let ops = fixture.operations("files: [missing.yml]\n", &mut diag);

    assert!(ops.contains("orchestrate.up"));
    assert!(diag
        .warnings()
        .iter()
        .any(|w| w.kind == WarningKind::MissingSource && w.message.contains("missing.yml")));
}
