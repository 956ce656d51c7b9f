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

//! Lumen compute demos.
//!
//! Runs small compute workloads on a headless wgpu device and reports how
//! long each GPU section took, measured with timestamp queries.

mod add;
mod config;
mod reduce;
mod timing;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lumen_infra::{ContextConfig, ShaderLibrary, WgpuComputeContext};

use crate::config::DemoSettings;

#[derive(Parser, Debug)]
#[command(name = "lumen-demos", version, about = "GPU-timed compute walkthroughs")]
struct Cli {
    /// TOML settings file; command-line flags take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Timed cycles to run.
    #[arg(long, global = true)]
    iterations: Option<u32>,

    /// Timestamp slots to allocate.
    #[arg(long, global = true)]
    timer_capacity: Option<u32>,

    /// Extra directory searched for shaders. Can be repeated.
    #[arg(long = "shader-dir", global = true)]
    shader_dirs: Vec<PathBuf>,

    /// Print timing reports as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Adds two random vectors element by element.
    Add {
        /// Elements per vector.
        #[arg(long)]
        elements: Option<u32>,
        /// Seed of the input generator.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sums `1..=N` with a multi-pass tree reduction.
    Reduce {
        /// N, the number of values summed.
        #[arg(long)]
        elements: Option<u32>,
    },
}

impl Cli {
    /// Folds the command-line overrides into `settings`.
    fn apply(&self, settings: &mut DemoSettings) {
        if let Some(iterations) = self.iterations {
            settings.timing.iterations = iterations;
        }
        if self.timer_capacity.is_some() {
            settings.timing.capacity = self.timer_capacity;
        }
        if self.json {
            settings.timing.json = true;
        }
        // Directories given on the command line are searched first.
        let mut dirs = self.shader_dirs.clone();
        dirs.append(&mut settings.shader_dirs);
        settings.shader_dirs = dirs;

        match self.command {
            Commands::Add { elements, seed } => {
                if let Some(elements) = elements {
                    settings.add.elements = elements;
                }
                if let Some(seed) = seed {
                    settings.add.seed = seed;
                }
            }
            Commands::Reduce { elements } => {
                if let Some(elements) = elements {
                    settings.reduce.elements = elements;
                }
            }
        }
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let cli = Cli::parse();
    let mut settings = DemoSettings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);

    let mut library = ShaderLibrary::new();
    for dir in settings.shader_search_paths() {
        library.add_search_path(dir);
    }

    let context = WgpuComputeContext::new_blocking(&ContextConfig::default())?;
    log::info!(
        "Running on '{}' ({:?}).",
        context.adapter_name,
        context.adapter_backend
    );

    match cli.command {
        Commands::Add { .. } => add::run(&context, &library, &settings),
        Commands::Reduce { .. } => reduce::run(&context, &library, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_settings() {
        let cli = Cli::parse_from([
            "lumen-demos",
            "--iterations",
            "4",
            "--shader-dir",
            "mine",
            "add",
            "--elements",
            "64",
        ]);
        let mut settings = DemoSettings {
            shader_dirs: vec![PathBuf::from("from-file")],
            ..DemoSettings::default()
        };
        cli.apply(&mut settings);

        assert_eq!(settings.timing.iterations, 4);
        assert_eq!(settings.add.elements, 64);
        assert_eq!(settings.add.seed, 42);
        assert_eq!(
            settings.shader_dirs,
            vec![PathBuf::from("mine"), PathBuf::from("from-file")]
        );
        assert!(!settings.timing.json);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["lumen-demos", "reduce", "--elements", "1000", "--json"]);
        let mut settings = DemoSettings::default();
        cli.apply(&mut settings);

        assert!(settings.timing.json);
        assert_eq!(settings.reduce.elements, 1000);
        assert_eq!(settings.add, config::AddSettings::default());
    }
}
