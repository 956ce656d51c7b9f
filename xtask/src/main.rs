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

// Build automation for the Lumen workspace
// Run with: cargo run -p xtask -- <command>

mod helpers;

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::helpers::*;

#[derive(Parser)]
#[command(name = "xtask", about = "Lumen workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every workspace crate.
    Build,
    /// Run unit, integration and doc tests.
    Test,
    /// Format the workspace, or only verify formatting with `--check`.
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy with warnings denied.
    Clippy,
    /// Run a compute demo with GPU timing (`add` or `reduce`).
    Demo {
        name: String,
        /// Extra arguments forwarded to the demo binary.
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Format check, clippy and tests, as run in CI.
    Ci,
}

fn build() -> Result<()> {
    print_task_start("Building Workspace", HAMMER, BLUE);
    execute_command("cargo", &["build", "--workspace"], "Build")
}

fn test() -> Result<()> {
    print_task_start("Running Tests", TEST_TUBE, GREEN);
    execute_command("cargo", &["test", "--workspace"], "Tests")
}

fn fmt(check: bool) -> Result<()> {
    print_task_start("Formatting", BRUSH, MAGENTA);
    if check {
        execute_command("cargo", &["fmt", "--all", "--", "--check"], "Format check")
    } else {
        execute_command("cargo", &["fmt", "--all"], "Format")
    }
}

fn clippy() -> Result<()> {
    print_task_start("Running Clippy", CLIPPY, YELLOW);
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy",
    )
}

fn demo(name: &str, extra: &[String]) -> Result<()> {
    print_task_start(&format!("Demo: {name}"), ROCKET, CYAN);
    let mut args = vec!["run", "--release", "-p", "lumen-demos", "--", name];
    args.extend(extra.iter().map(String::as_str));
    execute_command("cargo", &args, "Demo")
}

/// Runs every CI step, even after a failure, and fails if any step did.
fn ci() -> Result<()> {
    let start = Instant::now();
    let steps: [(&str, fn() -> Result<()>); 3] = [
        ("Format", || fmt(true)),
        ("Clippy", clippy),
        ("Tests", test),
    ];
    let failed: Vec<&str> = steps
        .iter()
        .filter_map(|(name, step)| step().err().map(|_| *name))
        .collect();

    println!(
        "\n{}CI finished in {:.2}s{}",
        BOLD,
        start.elapsed().as_secs_f64(),
        RESET
    );
    if failed.is_empty() {
        print_success("All CI steps passed");
        Ok(())
    } else {
        print_error(&format!("Failed steps: {}", failed.join(", ")));
        anyhow::bail!("{} of {} CI steps failed", failed.len(), steps.len());
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Build => build(),
        Commands::Test => test(),
        Commands::Fmt { check } => fmt(check),
        Commands::Clippy => clippy(),
        Commands::Demo { name, args } => demo(&name, &args),
        Commands::Ci => ci(),
    }
}
