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

use std::fmt;

use serde::{Deserialize, Serialize};

use super::timer::GpuTimer;
use super::traits::QueryPool;

/// One measured interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingEntry {
    /// Label given when the interval was opened; may be empty.
    pub label: String,
    /// Elapsed GPU time in seconds.
    pub seconds: f64,
    /// Elapsed GPU time in milliseconds.
    pub milliseconds: f64,
}

/// A snapshot of a resolved [`GpuTimer`], detached from the timer's borrow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    /// Measured intervals in recording order.
    pub entries: Vec<TimingEntry>,
    /// Sum of every interval, in milliseconds.
    pub total_ms: f64,
    /// Timestamp slots written in the cycle.
    pub query_count: u32,
    /// Calibration frequency in ticks per second.
    pub timestamp_frequency: u64,
    /// Pairs clamped to zero because their ticks were out of order.
    pub out_of_order_pairs: usize,
}

impl TimingReport {
    /// Builds a report from the timer's current views. An unresolved timer
    /// yields an empty report.
    pub fn from_timer<P: QueryPool>(timer: &GpuTimer<P>) -> Self {
        if !timer.is_resolved() {
            return Self::default();
        }
        let entries: Vec<TimingEntry> = timer
            .labeled_durations()
            .map(|(label, seconds)| TimingEntry {
                label: label.to_string(),
                seconds,
                milliseconds: seconds * 1000.0,
            })
            .collect();
        let total_ms = entries.iter().map(|entry| entry.milliseconds).sum();
        Self {
            entries,
            total_ms,
            query_count: timer.query_count(),
            timestamp_frequency: timer.timestamp_frequency(),
            out_of_order_pairs: timer.out_of_order_pairs(),
        }
    }

    /// Whether the report holds no intervals.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "no GPU timings recorded");
        }
        let width = self
            .entries
            .iter()
            .map(|entry| entry.label.len().max(1))
            .max()
            .unwrap_or(1)
            .max("total".len());
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.label.is_empty() {
                writeln!(f, "{:<width$}  {:>10.4} ms", format!("#{index}"), entry.milliseconds)?;
            } else {
                writeln!(f, "{:<width$}  {:>10.4} ms", entry.label, entry.milliseconds)?;
            }
        }
        writeln!(f, "{:<width$}  {:>10.4} ms", "total", self.total_ms)?;
        if self.out_of_order_pairs > 0 {
            writeln!(
                f,
                "({} out-of-order pair(s) clamped to zero)",
                self.out_of_order_pairs
            )?;
        }
        Ok(())
    }
}
