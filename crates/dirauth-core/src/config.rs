//! Configuration providers for authentication adapters.
//!
//! Adapters read a flat key/value store (with some keys holding lists). The store is obtained
//! from a [`ConfigProvider`] at the start of every operation, so edits to the backing file take
//! effect on the next login attempt without restarting the application.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot of configuration values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValues {
    values: Map<String, Value>,
}

impl ConfigValues {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a snapshot from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the document is not a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(Error::ConfigError(format!(
                "configuration must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the scalar value stored under `key`.
    ///
    /// Numbers and booleans are rendered as strings. Lists, objects and `null` yield `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Returns the list stored under `key`.
    ///
    /// A non-empty scalar is treated as a single-element list; a missing key is an empty list.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value)
                .filter(|value| !value.is_empty())
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Interprets the value stored under `key` as a boolean.
    ///
    /// Accepts `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off` (case-insensitive). An empty
    /// string is `false`; anything else is `None`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "" | "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Source of configuration, consulted at the start of every adapter operation.
pub trait ConfigProvider: Send + Sync {
    /// Loads a fresh snapshot of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration cannot be read.
    fn load(&self) -> Result<ConfigValues>;
}

/// In-memory configuration, useful for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: ConfigValues,
}

impl StaticConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the updated configuration.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.set(key, value);
        self
    }
}

impl From<ConfigValues> for StaticConfig {
    fn from(values: ConfigValues) -> Self {
        Self { values }
    }
}

impl ConfigProvider for StaticConfig {
    fn load(&self) -> Result<ConfigValues> {
        Ok(self.values.clone())
    }
}

/// Configuration stored in a JSON file, re-read on every load.
#[derive(Debug, Clone)]
pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    /// Creates a provider backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for JsonFileConfig {
    fn load(&self) -> Result<ConfigValues> {
        debug!(path = %self.path.display(), "loading adapter configuration");
        let contents = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read configuration {}: {err}",
                self.path.display()
            ))
        })?;
        ConfigValues::from_json_str(&contents)
    }
}
