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

//! In-memory timestamp backend with scripted ticks for unit tests.

use super::traits::{QueryPool, TimestampDevice, TimestampTarget};
use super::TimerError;

#[derive(Debug)]
pub(crate) struct ScriptedPool {
    ticks: Vec<u64>,
    capacity: u32,
    resets: u32,
    fail_reads: bool,
}

impl ScriptedPool {
    pub(crate) fn resets(&self) -> u32 {
        self.resets
    }
}

impl QueryPool for ScriptedPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn read_results(&self, start: u32, out: &mut [u64]) -> Result<(), TimerError> {
        if self.fail_reads {
            return Err(TimerError::Readback("scripted failure".to_string()));
        }
        for (offset, slot) in out.iter_mut().enumerate() {
            let index = start as usize + offset;
            // Unscripted slots read as a monotonic clock.
            *slot = self
                .ticks
                .get(index)
                .copied()
                .unwrap_or(index as u64 * 10);
        }
        Ok(())
    }
}

pub(crate) struct ScriptedDevice {
    frequency: u64,
    timestamps: bool,
    fail_pool: bool,
    fail_reads: bool,
    ticks: Vec<u64>,
}

impl ScriptedDevice {
    pub(crate) fn new(frequency: u64) -> Self {
        Self {
            frequency,
            timestamps: true,
            fail_pool: false,
            fail_reads: false,
            ticks: Vec::new(),
        }
    }

    pub(crate) fn with_ticks(mut self, ticks: Vec<u64>) -> Self {
        self.ticks = ticks;
        self
    }

    pub(crate) fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub(crate) fn failing_pool_creation(mut self) -> Self {
        self.fail_pool = true;
        self
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

impl TimestampDevice for ScriptedDevice {
    type Pool = ScriptedPool;

    fn supports_timestamp_queries(&self) -> bool {
        self.timestamps
    }

    fn timestamp_frequency(&self) -> u64 {
        self.frequency
    }

    fn create_query_pool(&self, count: u32) -> Result<ScriptedPool, TimerError> {
        if self.fail_pool {
            return Err(TimerError::PoolCreation("scripted failure".to_string()));
        }
        Ok(ScriptedPool {
            ticks: self.ticks.clone(),
            capacity: count,
            resets: 0,
            fail_reads: self.fail_reads,
        })
    }
}

/// Records which slots were written and which commands went through it.
pub(crate) struct RecordingTarget {
    pub(crate) writes: Vec<u32>,
    pub(crate) commands: Vec<&'static str>,
    accept: bool,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self {
            writes: Vec::new(),
            commands: Vec::new(),
            accept: true,
        }
    }
}

impl RecordingTarget {
    pub(crate) fn refusing() -> Self {
        Self {
            accept: false,
            ..Self::default()
        }
    }
}

impl TimestampTarget<ScriptedPool> for RecordingTarget {
    fn write_timestamp(&mut self, _pool: &ScriptedPool, index: u32) -> bool {
        if !self.accept {
            return false;
        }
        self.writes.push(index);
        true
    }
}
