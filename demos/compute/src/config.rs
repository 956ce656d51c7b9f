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

//! Demo settings: an optional TOML file, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings of the element-wise add walkthrough.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AddSettings {
    /// Elements per input vector.
    pub elements: u32,
    /// Seed of the input generator.
    pub seed: u64,
}

impl Default for AddSettings {
    fn default() -> Self {
        Self {
            elements: 16 * 1024,
            seed: 42,
        }
    }
}

/// Settings of the parallel reduction walkthrough.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReduceSettings {
    /// Values summed; the input is `1..=elements`.
    pub elements: u32,
}

impl Default for ReduceSettings {
    fn default() -> Self {
        Self { elements: 256 }
    }
}

/// Settings shared by every walkthrough.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingSettings {
    /// Timed cycles to run; each cycle starts a fresh timer frame.
    pub iterations: u32,
    /// Timestamp slots; defaults to twice the scopes a cycle opens.
    pub capacity: Option<u32>,
    /// Print reports as JSON instead of a table.
    pub json: bool,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            iterations: 1,
            capacity: None,
            json: false,
        }
    }
}

/// Represents the structure of a `Lumen.toml` settings file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DemoSettings {
    /// Directories searched for shaders before the defaults.
    pub shader_dirs: Vec<PathBuf>,
    pub add: AddSettings,
    pub reduce: ReduceSettings,
    pub timing: TimingSettings,
}

impl DemoSettings {
    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = Self::parse(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        log::info!("Loaded demo settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The shader search directories, with the crate's bundled `shaders/`
    /// directory appended so the demos run from any working directory.
    pub fn shader_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.shader_dirs.clone();
        paths.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders"));
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(DemoSettings::parse("").unwrap(), DemoSettings::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = DemoSettings::parse(
            r#"
shader_dirs = ["assets/kernels"]

[add]
elements = 1024

[timing]
iterations = 3
json = true
"#,
        )
        .unwrap();

        assert_eq!(settings.shader_dirs, vec![PathBuf::from("assets/kernels")]);
        assert_eq!(settings.add.elements, 1024);
        assert_eq!(settings.add.seed, 42);
        assert_eq!(settings.reduce, ReduceSettings::default());
        assert_eq!(settings.timing.iterations, 3);
        assert!(settings.timing.json);
        assert_eq!(settings.timing.capacity, None);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(DemoSettings::parse("[add]\nelements = \"many\"").is_err());
    }

    #[test]
    fn bundled_shaders_are_searched_last() {
        let settings = DemoSettings {
            shader_dirs: vec![PathBuf::from("custom")],
            ..DemoSettings::default()
        };
        let paths = settings.shader_search_paths();
        assert_eq!(paths[0], PathBuf::from("custom"));
        assert!(paths[1].ends_with("shaders"));
        assert!(paths[1].join("reduce.wgsl").is_file());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DemoSettings::load(Some(Path::new("/nonexistent/Lumen.toml"))).is_err());
        assert_eq!(DemoSettings::load(None).unwrap(), DemoSettings::default());
    }
}
