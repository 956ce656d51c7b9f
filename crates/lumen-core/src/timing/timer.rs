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

use super::scope::{Frame, Scope};
use super::traits::{QueryPool, TimestampDevice, TimestampTarget};
use super::TimerError;

/// Timestamp-query based GPU timer.
///
/// Slots are written in begin/end pairs: slot `2i` opens interval `i` and
/// slot `2i + 1` closes it. After the device has finished the recorded work,
/// [`resolve`](Self::resolve) reads the raw ticks back and converts each pair
/// into seconds using the device calibration frequency.
///
/// Recording is single-threaded per timer. The slot cursor is a plain
/// integer, so one timer must not be fed from several command streams
/// concurrently.
#[derive(Debug)]
pub struct GpuTimer<P: QueryPool> {
    query_pool: Option<P>,
    results: Vec<u64>,
    pair_durations: Vec<f64>,
    pair_labels: Vec<String>,
    timestamp_frequency: u64,
    capacity: u32,
    next_query_index: u32,
    out_of_order_pairs: usize,
    resolved: bool,
}

impl<P: QueryPool> Default for GpuTimer<P> {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl<P: QueryPool> GpuTimer<P> {
    /// A timer with no query pool. Every recording call is rejected and every
    /// accessor returns an empty view.
    pub fn unavailable() -> Self {
        Self {
            query_pool: None,
            results: Vec::new(),
            pair_durations: Vec::new(),
            pair_labels: Vec::new(),
            timestamp_frequency: 0,
            capacity: 0,
            next_query_index: 0,
            out_of_order_pairs: 0,
            resolved: false,
        }
    }

    /// Creates a timer with room for `max_samples` timestamps on `device`.
    ///
    /// Size `max_samples` for every bracket opened before a resolve, usually
    /// twice the expected scope count.
    pub fn create<D>(device: &D, max_samples: u32) -> Result<Self, TimerError>
    where
        D: TimestampDevice<Pool = P>,
    {
        let mut timer = Self::unavailable();
        timer.init(device, max_samples)?;
        Ok(timer)
    }

    /// Re-initializes this timer in place.
    ///
    /// Any previous pool is released first. On failure the timer is left
    /// unavailable rather than partially constructed.
    pub fn init<D>(&mut self, device: &D, max_samples: u32) -> Result<(), TimerError>
    where
        D: TimestampDevice<Pool = P>,
    {
        *self = Self::unavailable();

        if max_samples == 0 {
            return Err(TimerError::ZeroCapacity);
        }
        if !device.supports_timestamp_queries() {
            return Err(TimerError::TimestampsUnsupported);
        }
        let frequency = device.timestamp_frequency();
        if frequency == 0 {
            return Err(TimerError::ZeroFrequency);
        }
        let pool = device.create_query_pool(max_samples)?;

        self.query_pool = Some(pool);
        self.timestamp_frequency = frequency;
        self.capacity = max_samples;
        self.results = vec![0; max_samples as usize];
        log::debug!(
            "GPU timer initialized: {max_samples} timestamp slots at {frequency} ticks/s."
        );
        Ok(())
    }

    /// Whether the timer holds a usable query pool.
    pub fn is_available(&self) -> bool {
        self.query_pool.is_some() && self.timestamp_frequency != 0 && self.capacity > 0
    }

    /// Maximum number of timestamp slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots written in the current recording cycle.
    pub fn query_count(&self) -> u32 {
        self.next_query_index
    }

    /// Calibration frequency in ticks per second; zero when unavailable.
    pub fn timestamp_frequency(&self) -> u64 {
        self.timestamp_frequency
    }

    /// Whether the accessor views currently hold resolved data.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Number of pairs clamped to zero during the last resolve because the
    /// end tick preceded the begin tick.
    pub fn out_of_order_pairs(&self) -> usize {
        self.out_of_order_pairs
    }

    /// The underlying query pool, if any.
    pub fn query_pool(&self) -> Option<&P> {
        self.query_pool.as_ref()
    }

    /// Whether another timestamp slot is free.
    pub fn can_record(&self) -> bool {
        self.query_pool.is_some() && self.next_query_index < self.capacity
    }

    /// Resets the pool and the slot cursor and drops stored labels.
    ///
    /// Call before reusing the timer for a new measurement cycle.
    pub fn reset_queries(&mut self) {
        if let Some(pool) = self.query_pool.as_mut() {
            pool.reset();
        }
        self.next_query_index = 0;
        self.pair_labels.clear();
        self.resolved = false;
    }

    /// Alias of [`reset_queries`](Self::reset_queries).
    pub fn reset(&mut self) {
        self.reset_queries();
    }

    /// Starts a new measurement cycle. Same as [`reset_queries`](Self::reset_queries).
    pub fn begin_frame(&mut self) {
        self.reset_queries();
    }

    /// Records a timestamp into the next free slot of `target`.
    ///
    /// Returns `false` without recording when the pool is missing, full, or
    /// the target refuses the write. Capacity is never grown.
    pub fn write_timestamp<T>(&mut self, target: &mut T) -> bool
    where
        T: TimestampTarget<P> + ?Sized,
    {
        if !self.can_record() {
            return false;
        }
        let Some(pool) = self.query_pool.as_ref() else {
            return false;
        };
        if !target.write_timestamp(pool, self.next_query_index) {
            return false;
        }
        self.next_query_index += 1;
        self.resolved = false;
        true
    }

    /// Reserves two consecutive slots for backends that write begin and end
    /// timestamps themselves (e.g. pass-level timestamp writes).
    ///
    /// Returns the `(begin, end)` slot indices, or `None` unless two slots
    /// are free.
    pub fn reserve_pair(&mut self, label: impl Into<String>) -> Option<(u32, u32)> {
        self.query_pool.as_ref()?;
        if self.capacity - self.next_query_index < 2 {
            return None;
        }
        let begin = self.next_query_index;
        self.next_query_index += 2;
        self.label_pair(begin, label.into());
        self.resolved = false;
        Some((begin, begin + 1))
    }

    /// Stores `label` for the pair opened at slot `begin_slot`. Pairs recorded
    /// with raw writes before it get empty labels.
    pub(crate) fn label_pair(&mut self, begin_slot: u32, label: String) {
        let pair = (begin_slot / 2) as usize;
        self.pair_labels.resize(pair, String::new());
        self.pair_labels.push(label);
    }

    /// Opens an unlabeled scope on `target`.
    pub fn scope<'a, T>(&'a mut self, target: &'a mut T) -> Scope<'a, P, T>
    where
        T: TimestampTarget<P> + ?Sized,
    {
        Scope::new(self, target, String::new())
    }

    /// Opens a scope on `target` whose interval is reported under `label`.
    pub fn labeled_scope<'a, T>(
        &'a mut self,
        target: &'a mut T,
        label: impl Into<String>,
    ) -> Scope<'a, P, T>
    where
        T: TimestampTarget<P> + ?Sized,
    {
        Scope::new(self, target, label.into())
    }

    /// Resets the timer and returns a bracket for one resolve cycle.
    pub fn frame(&mut self) -> Frame<'_, P> {
        Frame::new(self)
    }

    /// Reads the recorded ticks back and derives per-pair durations.
    ///
    /// The caller must wait for the device to finish the recorded work first.
    /// Pairs whose end tick precedes the begin tick resolve to zero.
    pub fn resolve(&mut self) -> Result<(), TimerError> {
        let Some(pool) = self.query_pool.as_ref() else {
            return Err(TimerError::Unavailable);
        };
        let count = self.next_query_index as usize;
        if count == 0 {
            return Err(TimerError::NothingRecorded);
        }
        if self.results.len() < count {
            self.results.resize(count, 0);
        }

        if let Err(err) = pool.read_results(0, &mut self.results[..count]) {
            self.resolved = false;
            return Err(err);
        }

        let pair_count = count / 2;
        let frequency = self.timestamp_frequency as f64;
        self.pair_durations.clear();
        self.out_of_order_pairs = 0;
        for (index, pair) in self.results[..pair_count * 2].chunks_exact(2).enumerate() {
            let (begin, end) = (pair[0], pair[1]);
            let duration = if end >= begin {
                (end - begin) as f64 / frequency
            } else {
                log::debug!(
                    "GPU timestamp pair {index} is out of order ({begin} > {end}); clamping to zero."
                );
                self.out_of_order_pairs += 1;
                0.0
            };
            self.pair_durations.push(duration);
        }
        // Raw writes carry no label; keep one label per measured pair.
        self.pair_labels.resize(pair_count, String::new());

        self.resolved = true;
        Ok(())
    }

    /// Raw ticks of every recorded slot; empty until resolved.
    pub fn raw_timestamps(&self) -> &[u64] {
        if !self.resolved {
            return &[];
        }
        &self.results[..self.next_query_index as usize]
    }

    /// Durations in seconds, one per begin/end pair; empty until resolved.
    pub fn pair_durations(&self) -> &[f64] {
        if !self.resolved {
            return &[];
        }
        &self.pair_durations
    }

    /// Labels, one per measured pair; empty until resolved.
    pub fn labels(&self) -> &[String] {
        if !self.resolved {
            return &[];
        }
        &self.pair_labels
    }

    /// `(label, seconds)` for each measured interval, in recording order.
    pub fn labeled_durations(&self) -> impl Iterator<Item = (&str, f64)> + Clone + '_ {
        self.labels()
            .iter()
            .map(String::as_str)
            .zip(self.pair_durations().iter().copied())
    }

    /// Converts a tick count to seconds using the calibration frequency.
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        if self.timestamp_frequency == 0 {
            return 0.0;
        }
        ticks as f64 / self.timestamp_frequency as f64
    }
}
