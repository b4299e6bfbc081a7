//! Configuration file handling for uvtask

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::commands::script::{Registry, ScriptDefinition, ScriptError};

/// Name of the project file scripts are read from
pub const FILENAME: &str = "pyproject.toml";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("pyproject.toml not found in current directory: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to read config file {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unable to parse TOML config file {path}: {source}")]
    Toml {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("Invalid script '{name}': {source}")]
    Script {
        name: String,
        #[source]
        source: ScriptError,
    },
}

#[derive(Debug, Default, Deserialize)]
struct ScriptSection {
    #[serde(rename = "run-script")]
    run_script: Option<toml::Table>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolSection {
    uvtask: Option<ScriptSection>,
    #[serde(rename = "run-script")]
    run_script: Option<toml::Table>,
}

/// The parts of `pyproject.toml` uvtask cares about
#[derive(Debug, Default, Deserialize)]
pub struct PyProject {
    #[serde(default)]
    tool: ToolSection,
}

impl PyProject {
    /// Parse `pyproject.toml` contents.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if `contents` is not valid TOML.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, or `ConfigError::Toml` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::ConfigNotFound(file.to_path_buf())
            } else {
                ConfigError::Io {
                    source: e,
                    path: file.to_path_buf(),
                }
            }
        })?;
        Self::parse(&contents).map_err(|e| ConfigError::Toml {
            source: e,
            path: file.to_path_buf(),
        })
    }

    /// The script table, `[tool.uvtask.run-script]` winning over `[tool.run-script]`
    fn script_table(self) -> toml::Table {
        self.tool
            .uvtask
            .and_then(|section| section.run_script)
            .or(self.tool.run_script)
            .unwrap_or_default()
    }

    /// Convert the script table into a [`Registry`], preserving file order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Script` naming the first script with an invalid shape.
    pub fn into_registry(self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        for (name, value) in self.script_table() {
            let definition = ScriptDefinition::try_from(value).map_err(|source| {
                ConfigError::Script {
                    name: name.clone(),
                    source,
                }
            })?;
            registry.insert(name, definition);
        }
        debug!("Loaded {} script(s)", registry.len());
        Ok(registry)
    }

    /// Path of `pyproject.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ConfigError::ConfigNotFound` if there is no `pyproject.toml` in it.
    pub fn find_config() -> Result<PathBuf, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        let config_path = cwd.join(FILENAME);
        debug!("Looking for config file at {}", config_path.display());
        if config_path.is_file() {
            info!("Found config file: {}", config_path.display());
            Ok(config_path)
        } else {
            Err(ConfigError::ConfigNotFound(config_path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(contents: &str) -> Registry {
        PyProject::parse(contents).unwrap().into_registry().unwrap()
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(
            &path,
            "[project]\nname = 'test'\nversion = '1.0.0'\n\n[tool.run-script]\ntest = \"echo test\"\n",
        )
        .unwrap();
        let registry = PyProject::from_file(&path).unwrap().into_registry().unwrap();
        assert_eq!(registry.get("test"), Some(&ScriptDefinition::from("echo test")));
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        match PyProject::from_file(&path) {
            Err(ConfigError::ConfigNotFound(p)) => assert_eq!(p, path),
            other => panic!("Expected ConfigNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(&path, "[tool.run-script\n").unwrap();
        let err = PyProject::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("pyproject.toml"));
    }

    #[test]
    fn test_tool_namespace() {
        let scripts = registry("[tool.run-script]\ntest = \"echo test\"\n");
        assert_eq!(scripts.names().collect::<Vec<_>>(), ["test"]);
    }

    #[test]
    fn test_uvtask_namespace() {
        let scripts = registry("[tool.uvtask.run-script]\ntest = \"echo test\"\n");
        assert_eq!(scripts.get("test"), Some(&ScriptDefinition::from("echo test")));
    }

    #[test]
    fn test_uvtask_namespace_takes_precedence() {
        let scripts = registry(
            "[tool.uvtask.run-script]\ntest = \"uvtask version\"\n\n[tool.run-script]\ntest = \"tool version\"\nother = \"ignored\"\n",
        );
        assert_eq!(
            scripts.get("test"),
            Some(&ScriptDefinition::from("uvtask version"))
        );
        assert!(!scripts.contains("other"));
    }

    #[test]
    fn test_missing_section_is_empty() {
        assert!(registry("[project]\nname = 'test'\n").is_empty());
        assert!(registry("").is_empty());
    }

    #[test]
    fn test_all_shapes_and_order() {
        let scripts = registry(
            r#"
[tool.run-script]
test = "pytest"
lint = ["ruff check .", "ruff format --check ."]
build = { command = "uv build", description = "Build the package" }
multi-word = { command = ["echo a", "echo b"] }
"#,
        );
        assert_eq!(
            scripts.names().collect::<Vec<_>>(),
            ["test", "lint", "build", "multi-word"]
        );
        assert_eq!(scripts.description("build"), Some("Build the package"));
        assert_eq!(scripts.description("multi-word"), None);
        assert_eq!(
            scripts.get("lint"),
            Some(&ScriptDefinition::from(vec![
                "ruff check .",
                "ruff format --check ."
            ]))
        );
    }

    #[test]
    fn test_invalid_script_names_offender() {
        let err = PyProject::parse("[tool.run-script]\nok = \"true\"\nbad = 123\n")
            .unwrap()
            .into_registry()
            .unwrap_err();
        match err {
            ConfigError::Script { name, source } => {
                assert_eq!(name, "bad");
                assert_eq!(source, ScriptError::InvalidFormat("integer"));
            }
            other => panic!("Expected Script error, got: {other:?}"),
        }
    }
}
