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

/// Reasons a [`GpuTimer`](super::GpuTimer) could not be created or resolved.
///
/// Creation failures leave the timer unavailable; callers are expected to
/// carry on without timing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer has no query pool.
    Unavailable,
    /// A capacity of zero samples was requested.
    ZeroCapacity,
    /// The device does not support timestamp queries.
    TimestampsUnsupported,
    /// The device reported a calibration frequency of zero.
    ZeroFrequency,
    /// The backend failed to allocate the query pool.
    PoolCreation(String),
    /// `resolve` was called with no recorded timestamps.
    NothingRecorded,
    /// Reading the query results back from the device failed.
    Readback(String),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::Unavailable => write!(f, "GPU timer is unavailable."),
            TimerError::ZeroCapacity => {
                write!(f, "GPU timer capacity must be at least one sample.")
            }
            TimerError::TimestampsUnsupported => {
                write!(f, "Device does not support timestamp queries.")
            }
            TimerError::ZeroFrequency => {
                write!(f, "Device reported a zero timestamp frequency.")
            }
            TimerError::PoolCreation(msg) => {
                write!(f, "Failed to create timestamp query pool: {msg}")
            }
            TimerError::NothingRecorded => write!(f, "No timestamps were recorded."),
            TimerError::Readback(msg) => {
                write!(f, "Failed to read back timestamp results: {msg}")
            }
        }
    }
}

impl std::error::Error for TimerError {}
