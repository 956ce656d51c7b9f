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

//! wgpu backend for [`GpuTimer`].

use lumen_core::timing::{QueryPool, TimestampDevice, TimestampTarget, TimerError};
use lumen_core::GpuTimer;

use super::context::WgpuComputeContext;
use super::readback::map_read_blocking;

/// A [`GpuTimer`] backed by a wgpu query set.
pub type WgpuGpuTimer = GpuTimer<WgpuQueryPool>;

const QUERY_SIZE: u64 = wgpu::QUERY_SIZE as u64;

/// Converts a queue timestamp period (nanoseconds per tick) into ticks per
/// second. Non-positive or non-finite periods give zero.
pub fn frequency_from_period(period_ns: f32) -> u64 {
    if !period_ns.is_finite() || period_ns <= 0.0 {
        return 0;
    }
    (1.0e9 / f64::from(period_ns)).round() as u64
}

/// The device-side half of the timestamp backend.
///
/// Holds cheap clones of the device and queue so the query pools it creates
/// can read their results back on their own.
#[derive(Debug, Clone)]
pub struct WgpuTimestampDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    features: wgpu::Features,
    timestamp_period_ns: f32,
}

impl WgpuTimestampDevice {
    /// Checks whether `features` allow any timestamp query at all.
    pub fn feature_available(features: wgpu::Features) -> bool {
        features.contains(wgpu::Features::TIMESTAMP_QUERY)
    }

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let timestamp_period_ns = queue.get_timestamp_period();
        log::info!("GPU timestamp period is {timestamp_period_ns:.3} ns.");
        Self {
            device: device.clone(),
            queue: queue.clone(),
            features: device.features(),
            timestamp_period_ns,
        }
    }

    pub fn from_context(context: &WgpuComputeContext) -> Self {
        Self::new(&context.device, &context.queue)
    }

    pub fn features(&self) -> wgpu::Features {
        self.features
    }
}

impl TimestampDevice for WgpuTimestampDevice {
    type Pool = WgpuQueryPool;

    fn supports_timestamp_queries(&self) -> bool {
        Self::feature_available(self.features)
    }

    fn timestamp_frequency(&self) -> u64 {
        frequency_from_period(self.timestamp_period_ns)
    }

    fn create_query_pool(&self, count: u32) -> Result<WgpuQueryPool, TimerError> {
        if count > wgpu::QUERY_SET_MAX_QUERIES {
            return Err(TimerError::PoolCreation(format!(
                "{count} queries exceeds the limit of {}",
                wgpu::QUERY_SET_MAX_QUERIES
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let query_set = self.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("Lumen GPU Timestamp QuerySet"),
            ty: wgpu::QueryType::Timestamp,
            count,
        });

        let buffer_size = u64::from(count) * QUERY_SIZE;
        let resolve_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen GPU Timestamp Resolve Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen GPU Timestamp Staging Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(TimerError::PoolCreation(err.to_string()));
        }

        Ok(WgpuQueryPool {
            query_set,
            resolve_buffer,
            staging_buffer,
            device: self.device.clone(),
            queue: self.queue.clone(),
            capacity: count,
            inside_encoders: self
                .features
                .contains(wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS),
            inside_passes: self
                .features
                .contains(wgpu::Features::TIMESTAMP_QUERY_INSIDE_PASSES),
        })
    }
}

/// A wgpu timestamp query set plus the buffers needed to read it back.
#[derive(Debug)]
pub struct WgpuQueryPool {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    device: wgpu::Device,
    queue: wgpu::Queue,
    capacity: u32,
    inside_encoders: bool,
    inside_passes: bool,
}

impl WgpuQueryPool {
    pub fn query_set(&self) -> &wgpu::QuerySet {
        &self.query_set
    }

    /// Whether timestamps may be written between commands of an encoder.
    pub fn allows_encoder_writes(&self) -> bool {
        self.inside_encoders
    }

    /// Whether timestamps may be written between commands of a pass.
    pub fn allows_pass_writes(&self) -> bool {
        self.inside_passes
    }
}

impl QueryPool for WgpuQueryPool {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    // wgpu query sets need no explicit reset; slots are overwritten.
    fn reset(&mut self) {}

    fn read_results(&self, start: u32, out: &mut [u64]) -> Result<(), TimerError> {
        let count = u32::try_from(out.len())
            .map_err(|_| TimerError::Readback("too many queries requested".to_string()))?;
        if count == 0 {
            return Ok(());
        }
        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.capacity)
            .ok_or_else(|| {
                TimerError::Readback(format!(
                    "queries {start}..{} exceed pool capacity {}",
                    u64::from(start) + u64::from(count),
                    self.capacity
                ))
            })?;
        let byte_len = u64::from(count) * QUERY_SIZE;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen GPU Timestamp Resolve Encoder"),
            });
        encoder.resolve_query_set(&self.query_set, start..end, &self.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(&self.resolve_buffer, 0, &self.staging_buffer, 0, byte_len);
        self.queue.submit(Some(encoder.finish()));

        let slice = self.staging_buffer.slice(..byte_len);
        map_read_blocking(&self.device, slice).map_err(TimerError::Readback)?;
        {
            let data = slice.get_mapped_range();
            for (tick, bytes) in out.iter_mut().zip(data.chunks_exact(QUERY_SIZE as usize)) {
                *tick = bytemuck::pod_read_unaligned(bytes);
            }
        }
        self.staging_buffer.unmap();
        log::debug!("Read back {count} GPU timestamps.");
        Ok(())
    }
}

impl TimestampTarget<WgpuQueryPool> for wgpu::CommandEncoder {
    fn write_timestamp(&mut self, pool: &WgpuQueryPool, index: u32) -> bool {
        if !pool.allows_encoder_writes() {
            return false;
        }
        wgpu::CommandEncoder::write_timestamp(self, &pool.query_set, index);
        true
    }
}

impl TimestampTarget<WgpuQueryPool> for wgpu::ComputePass<'_> {
    fn write_timestamp(&mut self, pool: &WgpuQueryPool, index: u32) -> bool {
        if !pool.allows_pass_writes() {
            return false;
        }
        wgpu::ComputePass::write_timestamp(self, &pool.query_set, index);
        true
    }
}

impl TimestampTarget<WgpuQueryPool> for wgpu::RenderPass<'_> {
    fn write_timestamp(&mut self, pool: &WgpuQueryPool, index: u32) -> bool {
        if !pool.allows_pass_writes() {
            return false;
        }
        wgpu::RenderPass::write_timestamp(self, &pool.query_set, index);
        true
    }
}

/// Reserves a slot pair on `timer` and returns beginning/end-of-pass writes
/// for a compute pass descriptor.
///
/// Only needs `TIMESTAMP_QUERY`, so it works where in-pass and in-encoder
/// writes are unavailable. Returns `None` when the timer is unavailable or
/// fewer than two slots are free.
pub fn pass_timestamp_writes<'a>(
    timer: &'a mut WgpuGpuTimer,
    label: impl Into<String>,
) -> Option<wgpu::ComputePassTimestampWrites<'a>> {
    let (begin, end) = timer.reserve_pair(label)?;
    let timer: &'a WgpuGpuTimer = timer;
    let pool = timer.query_pool()?;
    Some(wgpu::ComputePassTimestampWrites {
        query_set: pool.query_set(),
        beginning_of_pass_write_index: Some(begin),
        end_of_pass_write_index: Some(end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_from_period_inverts_nanoseconds() {
        assert_eq!(frequency_from_period(1.0), 1_000_000_000);
        assert_eq!(frequency_from_period(10.0), 100_000_000);
        assert_eq!(frequency_from_period(0.5), 2_000_000_000);
    }

    #[test]
    fn frequency_from_period_rejects_degenerate_periods() {
        assert_eq!(frequency_from_period(0.0), 0);
        assert_eq!(frequency_from_period(-1.0), 0);
        assert_eq!(frequency_from_period(f32::NAN), 0);
        assert_eq!(frequency_from_period(f32::INFINITY), 0);
    }
}
