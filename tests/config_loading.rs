mod common;
use crate::common::TestResult;

use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use watchpipe::cli::CliArgs;
use watchpipe::config::parse_duration;
use watchpipe::config::settings::default_groups;
use watchpipe::config::{load_and_validate, load_from_path};
use watchpipe::errors::WatchpipeError;
use watchpipe::types::{FailurePolicy, Verbosity};

fn args_for(dir: &std::path::Path) -> CliArgs {
    CliArgs {
        watch: Some(dir.to_path_buf()),
        ..CliArgs::default()
    }
}

#[test]
fn defaults_apply_without_flags_or_file() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;

    let settings = load_and_validate(&args_for(&root))?;

    assert_eq!(settings.watch.root, root);
    assert_eq!(
        settings.watch.extensions.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Makefile", "go"]
    );
    assert!(settings.watch.ignored_names.contains("vendor"));
    assert!(settings.watch.ignored_names.contains("bin"));
    assert_eq!(settings.watch.refresh_rate, Duration::from_secs(2));
    assert_eq!(settings.policy, FailurePolicy::Continue);
    assert_eq!(settings.pipeline.directory, root);
    assert_eq!(settings.pipeline.delimiter, ",");

    let groups = &settings.pipeline.groups;
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0], "go mod vendor");
    assert!(groups[1].starts_with("go build -o "));
    assert!(groups[1].ends_with("bin/app"));
    assert!(groups[2].ends_with("bin/app"));
    Ok(())
}

#[test]
fn test_mode_replaces_the_run_group() {
    let groups = default_groups(std::path::Path::new("/src/bin/app"), true, Verbosity::Normal);
    assert_eq!(groups[2], "go test ./... -coverprofile c.out");

    let verbose = default_groups(std::path::Path::new("/src/bin/app"), true, Verbosity::Verbose);
    assert_eq!(verbose[2], "go test ./... -v -coverprofile c.out");
}

#[test]
fn default_groups_quote_output_paths_with_spaces() {
    let groups = default_groups(std::path::Path::new("/my src/bin/app"), false, Verbosity::Normal);
    assert_eq!(groups[1], "go build -o '/my src/bin/app'");
    assert_eq!(groups[2], "'/my src/bin/app'");
}

#[test]
fn config_file_is_used_and_flags_win() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir(root.join("src"))?;
    let config = root.join("watchpipe.toml");
    fs::write(
        &config,
        r#"
[watch]
directory = "src"
extensions = [".rs", "toml"]
ignore = ["target"]
rate = "500ms"

[pipeline]
groups = ["cargo build", "cargo test"]
failure_policy = "strict"
grace_period = "1s"
arguments = ["--", "--nocapture"]

[pipeline.env]
RUST_LOG = "debug"
MODE = "file"
"#,
    )?;

    let args = CliArgs {
        config: Some(config),
        ignore: Some(vec!["target".into(), "node_modules".into()]),
        env: vec!["MODE=cli".into()],
        ..CliArgs::default()
    };
    let settings = load_and_validate(&args)?;

    assert_eq!(settings.watch.root, root.join("src"));
    assert!(settings.watch.extensions.contains("rs"));
    assert!(settings.watch.extensions.contains("toml"));
    assert!(settings.watch.ignored_names.contains("node_modules"));
    assert_eq!(settings.watch.refresh_rate, Duration::from_millis(500));
    assert_eq!(settings.grace_period, Duration::from_secs(1));
    assert_eq!(settings.policy, FailurePolicy::Strict);
    assert_eq!(settings.pipeline.groups, vec!["cargo build", "cargo test"]);
    assert_eq!(settings.pipeline.trailing_args, vec!["--", "--nocapture"]);
    assert_eq!(settings.pipeline.environment["RUST_LOG"], "debug");
    assert_eq!(settings.pipeline.environment["MODE"], "cli");
    // Commands run in the watched directory unless told otherwise.
    assert_eq!(settings.pipeline.directory, root.join("src"));
    Ok(())
}

#[test]
fn exec_flags_replace_default_groups() -> TestResult {
    let dir = tempdir()?;
    let args = CliArgs {
        exec: vec!["make lint, make fmt".into(), "make run".into()],
        exec_delim: Some(";".into()),
        strict: true,
        rate: Some(Duration::from_millis(100)),
        arguments: vec!["-port".into(), "8080".into()],
        ..args_for(dir.path())
    };
    let settings = load_and_validate(&args)?;

    assert_eq!(settings.pipeline.groups, vec!["make lint, make fmt", "make run"]);
    assert_eq!(settings.pipeline.delimiter, ";");
    assert_eq!(settings.policy, FailurePolicy::Strict);
    assert_eq!(settings.watch.refresh_rate, Duration::from_millis(100));
    assert_eq!(settings.pipeline.trailing_args, vec!["-port", "8080"]);
    Ok(())
}

#[test]
fn invalid_values_are_config_errors() -> TestResult {
    let dir = tempdir()?;

    let cases = vec![
        CliArgs {
            exec: vec!["   ".into()],
            ..args_for(dir.path())
        },
        CliArgs {
            exec_delim: Some(String::new()),
            ..args_for(dir.path())
        },
        CliArgs {
            exts: Some(vec![".".into(), " ".into()]),
            ..args_for(dir.path())
        },
        CliArgs {
            env: vec!["NOVALUE".into()],
            ..args_for(dir.path())
        },
        CliArgs {
            rate: Some(Duration::ZERO),
            ..args_for(dir.path())
        },
        CliArgs {
            workdir: Some(dir.path().join("missing")),
            ..args_for(dir.path())
        },
    ];

    for args in cases {
        match load_and_validate(&args) {
            Err(WatchpipeError::ConfigError(_)) => {}
            other => panic!("expected ConfigError for {args:?}, got {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn missing_watch_root_is_not_a_config_error() -> TestResult {
    let dir = tempdir()?;
    let settings = load_and_validate(&CliArgs {
        watch: Some(dir.path().join("nope")),
        workdir: Some(dir.path().to_path_buf()),
        ..CliArgs::default()
    })?;
    assert!(settings.watch.root.ends_with("nope"));
    Ok(())
}

#[test]
fn bad_duration_in_file_is_reported() -> TestResult {
    let dir = tempdir()?;
    let config = dir.path().join("watchpipe.toml");
    fs::write(&config, "[watch]\nrate = \"soon\"\n")?;

    let result = load_and_validate(&CliArgs {
        config: Some(config),
        ..args_for(dir.path())
    });
    match result {
        Err(WatchpipeError::ConfigError(msg)) => assert!(msg.contains("refresh rate")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let dir = tempdir()?;
    let config = dir.path().join("watchpipe.toml");
    fs::write(&config, "[watch]\nextension = [\"go\"]\n")?;

    assert!(matches!(
        load_from_path(&config),
        Err(WatchpipeError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
    assert_eq!(parse_duration(" 3m "), Ok(Duration::from_secs(180)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn parse_duration_rejects_overflowing_values() {
    assert!(parse_duration("6000000000000000h").is_err());
    assert!(parse_duration("18446744073709551615m").is_err());
    assert!(parse_duration("99999999999999999999s").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s"),
        Ok(Duration::from_secs(u64::MAX))
    );
}
