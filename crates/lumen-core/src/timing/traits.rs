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

use super::TimerError;

/// A fixed-size, device-owned array of timestamp query slots.
pub trait QueryPool {
    /// Number of slots in the pool.
    fn capacity(&self) -> u32;

    /// Resets the device-side slot contents ahead of a new recording cycle.
    fn reset(&mut self);

    /// Copies the raw ticks of slots `start..start + out.len()` into `out`.
    ///
    /// The caller must have waited for every recorded timestamp write to
    /// finish executing; this call does not synchronize with the device.
    fn read_results(&self, start: u32, out: &mut [u64]) -> Result<(), TimerError>;
}

/// The device capabilities a [`GpuTimer`](super::GpuTimer) is created against.
pub trait TimestampDevice {
    /// The query pool type this device allocates.
    type Pool: QueryPool;

    /// Whether the device can record timestamp queries at all.
    fn supports_timestamp_queries(&self) -> bool;

    /// Calibration frequency in ticks per second.
    fn timestamp_frequency(&self) -> u64;

    /// Allocates a timestamp query pool with `count` slots.
    fn create_query_pool(&self, count: u32) -> Result<Self::Pool, TimerError>;
}

/// A recording handle (a pass or a command encoder) that can insert a
/// timestamp write into its command stream.
pub trait TimestampTarget<P: QueryPool> {
    /// Records a write of the device clock into slot `index` of `pool`.
    ///
    /// Returns `false` when this target cannot record into `pool`, for
    /// example because the device lacks timestamps at this granularity.
    /// Nothing is recorded in that case.
    fn write_timestamp(&mut self, pool: &P, index: u32) -> bool;
}
