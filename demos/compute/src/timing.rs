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

//! Timer setup and report output shared by the demos.

use anyhow::Result;
use lumen_core::{GpuTimer, TimerError, TimingReport};
use lumen_infra::{WgpuComputeContext, WgpuGpuTimer, WgpuTimestampDevice};

/// Creates a timer with `capacity` slots, or an unavailable one when the
/// device cannot time work.
pub fn create_timer(context: &WgpuComputeContext, capacity: u32) -> WgpuGpuTimer {
    let device = WgpuTimestampDevice::from_context(context);
    match GpuTimer::create(&device, capacity) {
        Ok(timer) => {
            log::info!(
                "GPU timer ready: {} slots, {} ticks/s.",
                timer.capacity(),
                timer.timestamp_frequency()
            );
            timer
        }
        Err(e) => {
            log::warn!("GPU timing disabled, running untimed: {e}");
            GpuTimer::unavailable()
        }
    }
}

/// Resolves one cycle; `None` when there is nothing to report.
pub fn resolve_cycle(timer: &mut WgpuGpuTimer) -> Option<TimingReport> {
    match timer.resolve() {
        Ok(()) => Some(TimingReport::from_timer(timer)),
        Err(TimerError::Unavailable) => None,
        Err(e) => {
            log::warn!("Failed to resolve GPU timings: {e}");
            None
        }
    }
}

/// Renders the reports of every cycle as a table or a JSON array.
pub fn render_reports(reports: &[TimingReport], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(reports)?);
    }
    let mut out = String::new();
    for (cycle, report) in reports.iter().enumerate() {
        out.push_str(&format!("cycle {}\n{report}", cycle + 1));
    }
    Ok(out)
}

pub fn print_reports(reports: &[TimingReport], json: bool) -> Result<()> {
    if reports.is_empty() && !json {
        log::info!("No GPU timings to report.");
        return Ok(());
    }
    print!("{}", render_reports(reports, json)?);
    if json {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::TimingEntry;

    fn report(ms: f64) -> TimingReport {
        TimingReport {
            entries: vec![TimingEntry {
                label: "add".to_string(),
                seconds: ms / 1000.0,
                milliseconds: ms,
            }],
            total_ms: ms,
            query_count: 2,
            timestamp_frequency: 1_000_000_000,
            out_of_order_pairs: 0,
        }
    }

    #[test]
    fn tables_are_numbered_per_cycle() {
        let text = render_reports(&[report(1.0), report(2.0)], false).unwrap();
        assert!(text.starts_with("cycle 1\n"));
        assert!(text.contains("cycle 2\n"));
        assert_eq!(text.matches("add").count(), 2);
    }

    #[test]
    fn json_is_an_array_of_reports() {
        let text = render_reports(&[report(1.5)], true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let reports = value.as_array().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["entries"][0]["label"], "add");
        assert_eq!(reports[0]["total_ms"], 1.5);
    }
}
