// ABOUTME: Integration tests for the local builder's config, setting, command and project operations.
// ABOUTME: Uses temporary project directories with the user scope switched off or redirected.

mod support;

use radi_handlers::diagnostics::Diagnostics;
use radi_handlers::handler::{Builder, BuilderSettings, Implementation, ProjectContext};
use radi_handlers::handlers::local::{LocalBuilder, props};
use radi_handlers::operation::{Operation, OperationError, Operations, PropertyValue, run};
use radi_handlers::types::ProjectName;
use std::path::Path;
use tempfile::TempDir;

fn operations(root: &Path, settings: &str, implementations: &[Implementation]) -> Operations {
    support::init_tracing();
    let project = ProjectContext {
        root: root.to_path_buf(),
        name: ProjectName::new("demo").unwrap(),
        builders: vec!["local".to_string()],
    };
    let settings = BuilderSettings::new(project, serde_yaml::from_str(settings).unwrap());

    let mut builder = LocalBuilder::new();
    let mut diag = Diagnostics::default();
    builder.activate(implementations, &settings, &mut diag).unwrap();
    builder.operations()
}

fn isolated(dir: &TempDir, implementations: &[Implementation]) -> Operations {
    operations(dir.path(), "user_config_dir: false", implementations)
}

async fn exec(ops: &mut Operations, id: &str, props: &[(&str, &str)]) -> Box<dyn Operation> {
    let mut op = ops.remove(id).unwrap();
    for (key, value) in props {
        op.properties_mut().set_external(key, value).unwrap();
    }
    let result = run(op.as_mut()).await;
    assert!(result.is_success(), "{id}: {:?}", result.errors);
    op
}

mod settings {
    use super::*;

    #[tokio::test]
    async fn set_then_get_in_project_scope() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Setting]);

        exec(
            &mut ops,
            "setting.set",
            &[(props::SETTING_KEY, "database"), (props::SETTING_VALUE, "{host: db, port: 5432}")],
        )
        .await;
        assert!(dir.path().join(".radi/settings.yml").is_file());

        let mut ops = isolated(&dir, &[Implementation::Setting]);
        let get = exec(&mut ops, "setting.get", &[(props::SETTING_KEY, "database")]).await;
        let value = get.properties().yaml(props::SETTING_VALUE).unwrap();
        assert_eq!(value["port"], serde_yaml::Value::from(5432));
        let scopes = get.properties().string_map(props::SETTING_SCOPES).unwrap();
        assert!(scopes.contains_key("project"));
    }

    #[tokio::test]
    async fn project_scope_overrides_user_scope() {
        let dir = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        std::fs::write(user.path().join("settings.yml"), "editor: vim\nshell: bash\n").unwrap();
        support::write_config(dir.path(), "settings.yml", "editor: nano\n");

        let settings = format!("user_config_dir: {}", user.path().display());
        let mut ops = operations(dir.path(), &settings, &[Implementation::Setting]);
        let get = exec(&mut ops, "setting.get", &[(props::SETTING_KEY, "editor")]).await;
        assert_eq!(
            get.properties().yaml(props::SETTING_VALUE),
            Some(&serde_yaml::Value::from("nano"))
        );

        let list = exec(&mut ops, "setting.list", &[]).await;
        let keys = list.properties().string_list(props::SETTING_KEYS);
        assert!(keys.iter().any(|k| k == "shell"));
        assert!(keys.iter().any(|k| k == "editor"));
    }

    #[tokio::test]
    async fn unknown_scope_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Setting]);

        let mut op = ops.remove("setting.set").unwrap();
        let properties = op.properties_mut();
        properties.set_external(props::SETTING_KEY, "a").unwrap();
        properties.set_external(props::SETTING_VALUE, "1").unwrap();
        properties.set_external(props::SETTING_SCOPE, "user").unwrap();
        let result = run(op.as_mut()).await;
        assert!(!result.is_success());
        assert!(result.errors[0].contains("unknown scope"));
    }

    #[tokio::test]
    async fn unset_setting_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Setting]);
        let mut op = ops.remove("setting.get").unwrap();
        op.properties_mut().set_external(props::SETTING_KEY, "nope").unwrap();
        assert!(!run(op.as_mut()).await.is_success());
    }
}

mod config {
    use super::*;

    #[tokio::test]
    async fn raw_values_round_trip_per_scope() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Config]);

        exec(
            &mut ops,
            "config.set",
            &[(props::CONFIG_KEY, "notes"), (props::CONFIG_VALUE, "project=hello: world")],
        )
        .await;
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".radi/notes.yml")).unwrap(),
            "hello: world"
        );

        let get = exec(&mut ops, "config.get", &[(props::CONFIG_KEY, "notes")]).await;
        match get.properties().value(props::CONFIG_VALUE) {
            Some(PropertyValue::ScopedValues(values)) => {
                assert_eq!(&values.get("project").unwrap()[..], b"hello: world");
            }
            other => panic!("unexpected value: {other:?}"),
        }

        let list = exec(&mut ops, "config.list", &[]).await;
        assert_eq!(list.properties().string_list(props::CONFIG_KEYS), ["notes"]);
    }

    #[tokio::test]
    async fn output_properties_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Config]);
        let op = ops.get_mut("config.list").unwrap();
        assert!(op.properties_mut().set_external(props::CONFIG_KEYS, "x").is_err());
    }
}

mod commands {
    use super::*;

    const COMMANDS: &str = r#"
greet:
  description: Say hello
  help: Writes its arguments to greeting.txt
  exec: "printf '%s ' \"$GREETING\" > greeting.txt; printf '%s' >> greeting.txt"
  environment:
    GREETING: hello
fail:
  exec: exit 3
setup:
  internal: true
  exec: ["true"]
"#;

    fn project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        support::write_config(dir.path(), "commands.yml", COMMANDS);
        dir
    }

    #[tokio::test]
    async fn list_hides_internal_commands() {
        let dir = project();
        let mut ops = isolated(&dir, &[Implementation::Command]);

        let list = exec(&mut ops, "command.list", &[]).await;
        assert_eq!(list.properties().string_list(props::COMMAND_IDS), ["greet", "fail"]);

        let mut ops = isolated(&dir, &[Implementation::Command]);
        let all = exec(&mut ops, "command.list", &[(props::COMMAND_INCLUDE_INTERNAL, "true")]).await;
        assert_eq!(
            all.properties().string_list(props::COMMAND_IDS),
            ["greet", "fail", "setup"]
        );
    }

    #[tokio::test]
    async fn get_describes_command() {
        let dir = project();
        let mut ops = isolated(&dir, &[Implementation::Command]);

        let get = exec(&mut ops, "command.get", &[(props::COMMAND_ID, "greet")]).await;
        assert_eq!(get.properties().string(props::COMMAND_DESCRIPTION), Some("Say hello"));
        let definition = get.properties().yaml(props::COMMAND_DEFINITION).unwrap();
        assert!(definition["exec"].as_str().unwrap().contains("greeting.txt"));
    }

    #[tokio::test]
    async fn host_command_gets_args_and_env() {
        let dir = project();
        let mut ops = isolated(&dir, &[Implementation::Command]);

        let op = exec(
            &mut ops,
            "command.exec",
            &[
                (props::COMMAND_ID, "greet"),
                (props::COMMAND_ARGS, "world"),
                (props::COMMAND_ENV, "GREETING=hi"),
            ],
        )
        .await;
        assert_eq!(op.properties().int(props::COMMAND_EXIT_CODE), Some(0));
        let written = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
        assert_eq!(written, "hi world");
    }

    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let dir = project();
        let mut ops = isolated(&dir, &[Implementation::Command]);

        let mut op = ops.remove("command.exec").unwrap();
        op.properties_mut().set_external(props::COMMAND_ID, "fail").unwrap();
        let err = op.exec().await.unwrap_err();
        assert!(matches!(err, OperationError::CommandFailed { code: 3, .. }));
        assert_eq!(op.properties().int(props::COMMAND_EXIT_CODE), Some(3));
    }

    #[tokio::test]
    async fn unknown_command_fails() {
        let dir = project();
        let mut ops = isolated(&dir, &[Implementation::Command]);

        let mut op = ops.remove("command.exec").unwrap();
        op.properties_mut().set_external(props::COMMAND_ID, "nope").unwrap();
        let result = run(op.as_mut()).await;
        assert!(result.errors[0].contains("unknown command: nope"));
    }
}

mod project {
    use super::*;

    #[tokio::test]
    async fn info_describes_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Project]);

        let info = exec(&mut ops, "project.info", &[]).await;
        assert_eq!(info.properties().string(props::PROJECT_NAME), Some("demo"));
        assert_eq!(info.properties().string_list(props::PROJECT_BUILDERS), ["local"]);
    }

    #[tokio::test]
    async fn init_needs_force_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Project]);

        exec(&mut ops, "project.init", &[(props::PROJECT_NAME, "demo")]).await;
        assert!(dir.path().join(".radi/project.yml").is_file());

        let mut ops = isolated(&dir, &[Implementation::Project]);
        let mut again = ops.remove("project.init").unwrap();
        assert!(!run(again.as_mut()).await.is_success());

        let mut ops = isolated(&dir, &[Implementation::Project]);
        exec(
            &mut ops,
            "project.init",
            &[(props::PROJECT_NAME, "demo"), (props::PROJECT_FORCE, "true")],
        )
        .await;
    }
}

mod security {
    use super::*;

    #[tokio::test]
    async fn user_comes_from_the_environment_or_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut ops = isolated(&dir, &[Implementation::Security]);

        let user = exec(&mut ops, "security.user", &[]).await;
        assert!(!user.properties().string(props::SECURITY_USER_ID).unwrap().is_empty());
        assert!(user.properties().string(props::SECURITY_USER_HOST).is_some());
    }

    #[tokio::test]
    async fn authorize_checks_named_user() {
        let dir = tempfile::tempdir().unwrap();
        support::write_config(
            dir.path(),
            "authorize.yml",
            "rules:\n  - id: ops-only\n    operation: \"^orchestrate\\\\.\"\n    users: [ops]\n    effect: allow\n  - id: others\n    operation: \"^orchestrate\\\\.down$\"\n    effect: deny\n",
        );
        let mut ops = isolated(&dir, &[Implementation::Security]);

        let check = exec(
            &mut ops,
            "security.authorize",
            &[
                (props::SECURITY_OPERATION, "orchestrate.down"),
                (props::SECURITY_USER_ID, "ops"),
            ],
        )
        .await;
        assert_eq!(check.properties().string(props::SECURITY_DECISION), Some("deny"));
        assert_eq!(check.properties().bool(props::SECURITY_ALLOWED), Some(false));
    }
}
