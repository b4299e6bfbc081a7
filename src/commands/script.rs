use indexmap::IndexMap;
use thiserror::Error;

use crate::suggest::find_similar;

/// Errors raised while turning a raw config value into a [`ScriptDefinition`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error(
        "Invalid script format: expected a string, an array or a table with a `command` key, found {0}"
    )]
    InvalidFormat(&'static str),
    #[error("Invalid script format: table has no `command` key")]
    MissingCommand,
    #[error("Invalid script format: `description` must be a string, found {0}")]
    InvalidDescription(&'static str),
}

/// Raised when a script name is not present in the registry
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown command '{name}'!")]
pub struct UnknownCommand {
    pub name: String,
    /// Closest registered name, if any is similar enough
    pub suggestion: Option<String>,
}

/// A single script entry as written in the config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDefinition {
    /// A shell command, or the name of another script
    Leaf(String),
    /// Steps run one after another
    Sequence(Vec<ScriptDefinition>),
    /// A command with a human readable description attached
    Described {
        command: Box<ScriptDefinition>,
        description: String,
    },
}

impl ScriptDefinition {
    #[must_use]
    pub fn described(command: impl Into<ScriptDefinition>, description: impl Into<String>) -> Self {
        ScriptDefinition::Described {
            command: Box::new(command.into()),
            description: description.into(),
        }
    }

    /// The description attached to this definition, if it has a non-empty one
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            ScriptDefinition::Described { description, .. } if !description.is_empty() => {
                Some(description)
            }
            _ => None,
        }
    }
}

impl From<&str> for ScriptDefinition {
    fn from(command: &str) -> Self {
        ScriptDefinition::Leaf(command.to_string())
    }
}

impl From<String> for ScriptDefinition {
    fn from(command: String) -> Self {
        ScriptDefinition::Leaf(command)
    }
}

impl<T: Into<ScriptDefinition>> From<Vec<T>> for ScriptDefinition {
    fn from(steps: Vec<T>) -> Self {
        ScriptDefinition::Sequence(steps.into_iter().map(Into::into).collect())
    }
}

fn value_kind(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
    }
}

impl TryFrom<toml::Value> for ScriptDefinition {
    type Error = ScriptError;

    fn try_from(value: toml::Value) -> Result<Self, Self::Error> {
        match value {
            toml::Value::String(command) => Ok(ScriptDefinition::Leaf(command)),
            toml::Value::Array(steps) => steps
                .into_iter()
                .map(ScriptDefinition::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ScriptDefinition::Sequence),
            toml::Value::Table(mut table) => {
                let command = table
                    .remove("command")
                    .ok_or(ScriptError::MissingCommand)?;
                let description = match table.remove("description") {
                    None => String::new(),
                    Some(toml::Value::String(description)) => description,
                    Some(other) => return Err(ScriptError::InvalidDescription(value_kind(&other))),
                };
                Ok(ScriptDefinition::Described {
                    command: Box::new(ScriptDefinition::try_from(command)?),
                    description,
                })
            }
            other => Err(ScriptError::InvalidFormat(value_kind(&other))),
        }
    }
}

/// Named scripts in config-file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    scripts: IndexMap<String, ScriptDefinition>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: impl Into<ScriptDefinition>) {
        self.scripts.insert(name.into(), definition.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScriptDefinition> {
        self.scripts.get(name)
    }

    /// Like [`Registry::get`], but also hands back the registry-owned key
    #[must_use]
    pub fn get_key_value(&self, name: &str) -> Option<(&str, &ScriptDefinition)> {
        self.scripts
            .get_key_value(name)
            .map(|(key, definition)| (key.as_str(), definition))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    #[must_use]
    pub fn description(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).and_then(ScriptDefinition::description)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Check that `name` is a registered script.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand`, carrying the closest registered name when one is similar.
    pub fn validate_exists(&self, name: &str) -> Result<(), UnknownCommand> {
        if self.contains(name) {
            return Ok(());
        }
        let candidates: Vec<&str> = self.names().collect();
        Err(UnknownCommand {
            name: name.to_string(),
            suggestion: find_similar(name, &candidates).map(str::to_string),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Registry
where
    K: Into<String>,
    V: Into<ScriptDefinition>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (name, definition) in iter {
            registry.insert(name, definition);
        }
        registry
    }
}
