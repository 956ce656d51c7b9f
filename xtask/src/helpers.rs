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


use std::process::Command;
use std::time::Instant;

use anyhow::Result;

// ANSI color codes
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";
pub const ROCKET: &str = "🚀";
pub const HAMMER: &str = "🔨";
pub const TEST_TUBE: &str = "🧪";
pub const BRUSH: &str = "🎨";
pub const CLIPPY: &str = "📎";

pub fn print_task_start(task_name: &str, emoji: &str, color: &str) {
    println!("\n{BOLD}{color}━━━ {emoji} {task_name} ━━━{RESET}");
}

pub fn print_success(message: &str) {
    println!("{BOLD}{GREEN}{CHECK} {message}{RESET}");
}

pub fn print_error(message: &str) {
    println!("{BOLD}{RED}{CROSS} {message}{RESET}");
}

/// Runs `cmd` with inherited stdio and reports how long it took.
pub fn execute_command(cmd: &str, args: &[&str], task_name: &str) -> Result<()> {
    println!("{BOLD}{CYAN}$ {RESET}{cmd} {}", args.join(" "));
    let start = Instant::now();
    let status = Command::new(cmd).args(args).status()?;
    let seconds = start.elapsed().as_secs_f64();

    if status.success() {
        print_success(&format!("{task_name} completed in {seconds:.2}s"));
        Ok(())
    } else {
        print_error(&format!("{task_name} failed after {seconds:.2}s"));
        anyhow::bail!("{task_name} failed with status: {status}");
    }
}
