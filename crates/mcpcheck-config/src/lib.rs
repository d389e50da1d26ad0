//! Layered TOML configuration for mcpcheck.
//!
//! Resolves a [`HarnessConfig`] from multiple sources with precedence:
//! CLI flags > `--config` file > project `mcpcheck.toml` > global > defaults

use mcpcheck_harness::config::{DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use mcpcheck_harness::{HarnessConfig, TransportKind};
use mcpcheck_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the per-project config, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "mcpcheck.toml";

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub harness: HarnessSettings,
}

/// The `[server]` section: what to spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub transport: Option<String>,
}

/// The `[harness]` section: how to drive it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessSettings {
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub debug: Option<bool>,
}

impl SettingsFile {
    /// Keep every field set here, filling the rest from `lower`.
    fn layer_over(self, lower: SettingsFile) -> SettingsFile {
        let mut env = lower.server.env;
        env.extend(self.server.env);
        SettingsFile {
            server: ServerSettings {
                command: self.server.command.or(lower.server.command),
                args: self.server.args.or(lower.server.args),
                env,
                transport: self.server.transport.or(lower.server.transport),
            },
            harness: HarnessSettings {
                timeout_ms: self.harness.timeout_ms.or(lower.harness.timeout_ms),
                retries: self.harness.retries.or(lower.harness.retries),
                debug: self.harness.debug.or(lower.harness.debug),
            },
        }
    }
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Explicit config file; unlike the implicit ones it must exist and parse.
    pub config_path: Option<PathBuf>,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub debug: bool,
}

/// Load configuration from all sources, applying precedence rules.
///
/// Precedence (highest to lowest):
/// 1. CLI flags
/// 2. `--config <PATH>`
/// 3. Project config (`./mcpcheck.toml`)
/// 4. Global config (`~/.mcpcheck/config.toml`)
/// 5. Defaults
pub fn load(overrides: CliOverrides) -> Result<HarnessConfig, ConfigError> {
    let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    load_from(overrides, &project_dir, &config_dir())
}

/// [`load`] with explicit project and global directories.
pub fn load_from(
    overrides: CliOverrides,
    project_dir: &Path,
    global_dir: &Path,
) -> Result<HarnessConfig, ConfigError> {
    let mut settings = load_settings_file(&global_dir.join("config.toml"));
    settings = load_settings_file(&project_dir.join(PROJECT_CONFIG_FILE)).layer_over(settings);
    if let Some(path) = &overrides.config_path {
        settings = read_settings_file(path)?.layer_over(settings);
    }
    resolve(overrides, settings)
}

fn resolve(overrides: CliOverrides, settings: SettingsFile) -> Result<HarnessConfig, ConfigError> {
    // A command given on the command line brings its own arguments
    let (command, args) = match overrides.command {
        Some(command) => (command, overrides.args),
        None => (
            settings.server.command.ok_or_else(|| ConfigError::MissingKey {
                key: "command (pass it after `--` or set server.command in mcpcheck.toml)".into(),
            })?,
            settings.server.args.unwrap_or_default(),
        ),
    };
    if command.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "command".into(),
            message: "must not be empty".into(),
        });
    }

    let transport = match settings.server.transport.as_deref() {
        None | Some("stdio") | Some("stream") => TransportKind::Stdio,
        Some(other) => {
            return Err(ConfigError::InvalidValue {
                key: "transport".into(),
                message: format!("unsupported transport '{other}' (expected stdio)"),
            });
        }
    };

    let timeout_ms = overrides
        .timeout_ms
        .or(settings.harness.timeout_ms)
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            key: "timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }

    let retries = overrides
        .retries
        .or(settings.harness.retries)
        .unwrap_or(DEFAULT_RETRIES);

    let debug = overrides.debug || settings.harness.debug.unwrap_or(false);

    Ok(HarnessConfig {
        command,
        args,
        env: settings.server.env,
        transport,
        timeout_ms,
        retries,
        debug,
    })
}

/// Get the mcpcheck config directory path (~/.mcpcheck/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MCPCHECK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcpcheck")
}

/// Load and parse an implicit settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

/// Load and parse an explicitly requested settings file.
fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    toml::from_str(&content).map_err(|e| parse_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Dirs {
        project: TempDir,
        global: TempDir,
    }

    impl Dirs {
        fn new() -> Self {
            Self {
                project: tempfile::tempdir().unwrap(),
                global: tempfile::tempdir().unwrap(),
            }
        }

        fn write_project(&self, content: &str) {
            std::fs::write(self.project.path().join(PROJECT_CONFIG_FILE), content).unwrap();
        }

        fn write_global(&self, content: &str) {
            std::fs::write(self.global.path().join("config.toml"), content).unwrap();
        }

        fn load(&self, overrides: CliOverrides) -> Result<HarnessConfig, ConfigError> {
            load_from(overrides, self.project.path(), self.global.path())
        }
    }

    fn with_command(command: &str) -> CliOverrides {
        CliOverrides {
            command: Some(command.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let dirs = Dirs::new();
        let config = dirs.load(with_command("./server")).unwrap();
        assert_eq!(config.command, "./server");
        assert!(config.args.is_empty());
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert!(!config.debug);
        assert_eq!(config.transport, TransportKind::Stdio);
    }

    #[test]
    fn test_missing_command() {
        let dirs = Dirs::new();
        let err = dirs.load(CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn test_settings_toml_parse() {
        let toml_str = r#"
[server]
command = "node"
args = ["server.js"]
transport = "stream"

[server.env]
LOG_LEVEL = "debug"

[harness]
timeout_ms = 5000
retries = 0
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.server.command.as_deref(), Some("node"));
        assert_eq!(settings.server.args.as_deref(), Some(&["server.js".to_string()][..]));
        assert_eq!(settings.server.env["LOG_LEVEL"], "debug");
        assert_eq!(settings.harness.timeout_ms, Some(5000));
        assert_eq!(settings.harness.retries, Some(0));
        assert!(settings.harness.debug.is_none());
    }

    #[test]
    fn test_project_overrides_global() {
        let dirs = Dirs::new();
        dirs.write_global(
            r#"
[server]
command = "global-server"
[server.env]
SHARED = "global"
GLOBAL_ONLY = "1"
[harness]
timeout_ms = 1000
retries = 5
"#,
        );
        dirs.write_project(
            r#"
[server]
command = "project-server"
args = ["--stdio"]
[server.env]
SHARED = "project"
[harness]
timeout_ms = 2000
"#,
        );

        let config = dirs.load(CliOverrides::default()).unwrap();
        assert_eq!(config.command, "project-server");
        assert_eq!(config.args, ["--stdio"]);
        assert_eq!(config.timeout_ms, 2000);
        assert_eq!(config.retries, 5);
        assert_eq!(config.env["SHARED"], "project");
        assert_eq!(config.env["GLOBAL_ONLY"], "1");
    }

    #[test]
    fn test_cli_overrides_files() {
        let dirs = Dirs::new();
        dirs.write_project(
            r#"
[server]
command = "project-server"
args = ["--from-file"]
[harness]
timeout_ms = 2000
debug = false
"#,
        );

        let overrides = CliOverrides {
            command: Some("cli-server".into()),
            args: vec!["--from-cli".into()],
            timeout_ms: Some(100),
            retries: Some(0),
            debug: true,
            ..Default::default()
        };
        let config = dirs.load(overrides).unwrap();
        assert_eq!(config.command, "cli-server");
        assert_eq!(config.args, ["--from-cli"]);
        assert_eq!(config.timeout_ms, 100);
        assert_eq!(config.retries, 0);
        assert!(config.debug);
    }

    #[test]
    fn test_explicit_file_overrides_project() {
        let dirs = Dirs::new();
        dirs.write_project(
            r#"
[server]
command = "project-server"
[harness]
retries = 4
"#,
        );
        let explicit = dirs.project.path().join("ci.toml");
        std::fs::write(&explicit, "[server]\ncommand = \"ci-server\"\n").unwrap();

        let overrides = CliOverrides {
            config_path: Some(explicit),
            ..Default::default()
        };
        let config = dirs.load(overrides).unwrap();
        assert_eq!(config.command, "ci-server");
        assert_eq!(config.retries, 4);
    }

    #[test]
    fn test_explicit_file_errors_are_reported() {
        let dirs = Dirs::new();
        let missing = CliOverrides {
            config_path: Some(dirs.project.path().join("nope.toml")),
            ..with_command("./server")
        };
        assert!(matches!(dirs.load(missing), Err(ConfigError::Parse { .. })));

        let broken = dirs.project.path().join("broken.toml");
        std::fs::write(&broken, "[server\ncommand = ").unwrap();
        let overrides = CliOverrides {
            config_path: Some(broken),
            ..with_command("./server")
        };
        match dirs.load(overrides) {
            Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with("broken.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_broken_project_file_falls_back() {
        let dirs = Dirs::new();
        dirs.write_project("not [valid toml");
        let config = dirs.load(with_command("./server")).unwrap();
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dirs = Dirs::new();
        let overrides = CliOverrides {
            timeout_ms: Some(0),
            ..with_command("./server")
        };
        match dirs.load(overrides) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "timeout_ms"),
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let dirs = Dirs::new();
        dirs.write_project("[server]\ncommand = \"s\"\ntransport = \"websocket\"\n");
        match dirs.load(CliOverrides::default()) {
            Err(ConfigError::InvalidValue { key, message }) => {
                assert_eq!(key, "transport");
                assert!(message.contains("websocket"));
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_command_rejected() {
        let dirs = Dirs::new();
        let err = dirs.load(with_command("  ")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
