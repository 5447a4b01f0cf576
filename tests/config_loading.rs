// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};
use ulos::cli::CliArgs;
use ulos::config::{ConfigFile, Settings, load_and_validate, load_config};
use ulos::errors::UlosError;
use ulos_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn full_config_file_is_parsed() -> TestResult {
    let file = write_config(
        r#"
[function]
name = "orders-api"
region = "eu-north-1"
profile = "dev"

[watch]
target = "dist"
exclude = ["**/*.map"]

[delay]
add_ms = 500
retry_ms = 3000

[behaviour]
keep_watching_on_error = true
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.function.name.as_deref(), Some("orders-api"));
    assert_eq!(cfg.function.profile.as_deref(), Some("dev"));
    assert_eq!(cfg.watch.target, Some(PathBuf::from("dist")));
    assert_eq!(cfg.watch.exclude, vec!["**/*.map"]);
    assert_eq!(cfg.delay.delays().add, Duration::from_millis(500));
    // Unset delays keep their defaults.
    assert_eq!(cfg.delay.delays().change, Duration::ZERO);
    assert_eq!(cfg.delay.delays().unlink, Duration::from_millis(1000));
    assert_eq!(cfg.delay.retry_interval(), Duration::from_secs(3));
    assert!(cfg.behaviour.keep_watching_on_error);
    Ok(())
}

#[test]
fn empty_file_gives_defaults() -> TestResult {
    let file = write_config("")?;
    let cfg = load_and_validate(file.path())?;

    assert!(cfg.function.name.is_none());
    assert_eq!(cfg.delay.retry_ms, 2000);
    assert!(!cfg.behaviour.keep_watching_on_error);
    Ok(())
}

#[test]
fn zero_retry_interval_is_rejected() -> TestResult {
    let file = write_config("[delay]\nretry_ms = 0\n")?;

    match load_and_validate(file.path()) {
        Err(UlosError::ConfigError(msg)) => assert!(msg.contains("retry_ms")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn invalid_exclude_glob_is_rejected() -> TestResult {
    let file = write_config("[watch]\nexclude = [\"src/[unclosed\"]\n")?;

    match load_and_validate(file.path()) {
        Err(UlosError::ConfigError(msg)) => assert!(msg.contains("exclude")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn unknown_keys_are_a_toml_error() -> TestResult {
    let file = write_config("[function]\nnmae = \"typo\"\n")?;

    assert!(matches!(
        load_and_validate(file.path()),
        Err(UlosError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn explicit_missing_config_is_an_io_error() {
    let result = load_config(Some(std::path::Path::new("/definitely/not/here/Ulos.toml")));
    assert!(matches!(result, Err(UlosError::IoError(_))));
}

#[test]
fn cli_flags_override_config_file() -> TestResult {
    let dir = TempDir::new()?;
    let cfg = ConfigFileBuilder::new()
        .function("from-file", "us-east-1")
        .profile("file-profile")
        .target(dir.path())
        .exclude("**/*.map")
        .retry_ms(5000)
        .build();

    let args = CliArgs {
        lambda: Some("from-cli".to_string()),
        exclude: vec!["**/*.md".to_string()],
        keep_watching: true,
        ..CliArgs::default()
    };

    let settings = Settings::resolve(cfg, &args)?;

    assert_eq!(settings.function_name, "from-cli");
    assert_eq!(settings.region, "us-east-1");
    assert_eq!(settings.profile.as_deref(), Some("file-profile"));
    assert_eq!(settings.target, dir.path());
    assert_eq!(settings.exclude, vec!["**/*.map", "**/*.md"]);
    assert_eq!(settings.runtime.retry_interval, Duration::from_secs(5));
    assert!(settings.runtime.keep_watching_on_error);
    Ok(())
}

#[test]
fn missing_function_name_points_at_the_flag() -> TestResult {
    let dir = TempDir::new()?;
    let cfg = ConfigFileBuilder::new().target(dir.path()).build();
    let args = CliArgs {
        region: Some("eu-west-1".to_string()),
        ..CliArgs::default()
    };

    match Settings::resolve(cfg, &args) {
        Err(UlosError::ConfigError(msg)) => assert!(msg.contains("--lambda")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn missing_target_path_is_rejected() {
    let args = CliArgs {
        lambda: Some("fn".to_string()),
        region: Some("eu-west-1".to_string()),
        target: Some(PathBuf::from("/definitely/not/here")),
        ..CliArgs::default()
    };

    match Settings::resolve(ConfigFile::default(), &args) {
        Err(UlosError::ConfigError(msg)) => assert!(msg.contains("does not exist")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}
