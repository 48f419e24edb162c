// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration.
//!
//! The configuration lives in a `config.json` next to the application's
//! resources:
//!
//! ```json
//! {
//!   "application": {
//!     "showRuntimeErrors": true,
//!     "content": { "fps": 60, "width": 320, "height": 480 }
//!   }
//! }
//! ```
//!
//! Values are read leniently. Booleans follow script truthiness (only
//! `false` and `null` are false), integers accept numbers and numeric strings
//! and read anything else as `0`. Unknown keys are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

/// Why a configuration file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The top level (or `application`) is not an object.
    #[error("configuration root must be an object")]
    NotAnObject,
}

/// The `application.content` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConfig {
    /// Authored content width, `0` when unset.
    pub width: i32,
    /// Authored content height, `0` when unset.
    pub height: i32,
    /// Request multisample anti-aliasing.
    pub multisample: bool,
    /// Requested frame rate as written, `None` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<i64>,
    /// Terminate the application on an unhandled script error.
    pub exit_on_error: bool,
    /// Audio output rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_play_frequency: Option<i64>,
    /// Maximum number of simultaneous audio sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sources: Option<i64>,
}

/// The parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationConfig {
    /// `application.showRuntimeErrors`, `None` when absent.
    #[serde(rename = "showRuntimeErrors", skip_serializing_if = "Option::is_none")]
    pub show_runtime_errors: Option<bool>,
    /// `application.content`.
    pub content: ContentConfig,
}

impl ApplicationConfig {
    /// Parses a configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(text)?;
        Self::from_value(&root)
    }

    /// Projects an already parsed document.
    pub fn from_value(root: &Value) -> Result<Self, ConfigError> {
        let root = root.as_object().ok_or(ConfigError::NotAnObject)?;

        let Some(application) = root.get("application") else {
            return Ok(Self::default());
        };
        let application = application.as_object().ok_or(ConfigError::NotAnObject)?;

        let show_runtime_errors = application.get("showRuntimeErrors").map(truthy);
        let content = application
            .get("content")
            .and_then(Value::as_object)
            .map(ContentConfig::from_table)
            .unwrap_or_default();

        Ok(Self {
            show_runtime_errors,
            content,
        })
    }

    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Renders the configuration back into the on-disk shape.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        let doc = serde_json::json!({ "application": self });
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

impl ContentConfig {
    fn from_table(table: &Map<String, Value>) -> Self {
        let int = |key: &str| table.get(key).map(integer);
        let flag = |key: &str| table.get(key).is_some_and(truthy);

        Self {
            width: int("width").map_or(0, clamp_i32),
            height: int("height").map_or(0, clamp_i32),
            multisample: flag("multisample"),
            fps: int("fps"),
            exit_on_error: flag("exitOnError"),
            audio_play_frequency: int("audioPlayFrequency"),
            max_sources: int("maxSources"),
        }
    }
}

fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn integer(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |f| f.trunc() as i64),
        _ => 0,
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
