use super::*;
use tempfile::TempDir;

#[test]
fn default_config_pins_help_and_quit() {
    let config = AppConfig::default();

    assert_eq!(config.app_name, "agent-repl");
    assert_eq!(config.pinned_commands, vec!["help", "quit"]);
    assert_eq!(config.max_pinned_display, 6);
    assert_eq!(config.plugins, vec!["echo"]);
    assert_eq!(config.audit_dir, PathBuf::from(".agent-repl"));
    assert_eq!(config.get_verbosity(), VerbosityLevel::Normal);
}

#[test]
fn missing_file_writes_template_and_returns_defaults() {
    let dir = TempDir::new().unwrap();

    let config = AppConfig::load_from(dir.path());

    assert_eq!(config, AppConfig::default());
    let written = fs::read_to_string(AppConfig::config_path(dir.path())).unwrap();
    let reparsed: AppConfig = toml::from_str(&written).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(CONFIG_DIR_NAME)).unwrap();
    fs::write(
        AppConfig::config_path(dir.path()),
        r#"
app_name = "ops-shell"
verbosity = "verbose"
pinned_commands = ["status"]
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(dir.path());

    assert_eq!(config.app_name, "ops-shell");
    assert_eq!(config.get_verbosity(), VerbosityLevel::Verbose);
    assert_eq!(config.pinned_commands, vec!["status"]);
    assert_eq!(config.max_pinned_display, 6);
    assert_eq!(config.plugins, vec!["echo"]);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(CONFIG_DIR_NAME)).unwrap();
    let path = AppConfig::config_path(dir.path());
    fs::write(&path, "app_name = [unterminated").unwrap();

    let config = AppConfig::load_from(dir.path());

    assert_eq!(config, AppConfig::default());
    // The broken file is left for the user to fix.
    assert_eq!(fs::read_to_string(&path).unwrap(), "app_name = [unterminated");
}

#[test]
fn read_reports_invalid_toml_with_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "plugins = 3").unwrap();

    let err = AppConfig::read(&path).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidToml { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unknown_verbosity_falls_back_to_normal() {
    let mut config = AppConfig {
        verbosity: Some("chatty".to_string()),
        ..AppConfig::default()
    };
    assert_eq!(config.get_verbosity(), VerbosityLevel::Normal);

    config.set_verbosity(VerbosityLevel::Debug);
    assert_eq!(config.verbosity.as_deref(), Some("debug"));
    assert_eq!(config.get_verbosity(), VerbosityLevel::Debug);
}
