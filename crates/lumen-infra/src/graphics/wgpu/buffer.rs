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

use std::marker::PhantomData;
use std::num::NonZeroU64;

use bytemuck::Pod;
use lumen_core::ResourceError;
use wgpu::util::DeviceExt;

use super::context::WgpuComputeContext;
use super::readback::read_buffer_bytes;

/// A typed storage buffer that can be bound to compute shaders and read back.
///
/// Created with `STORAGE | COPY_SRC | COPY_DST` usage.
#[derive(Debug)]
pub struct StorageBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> StorageBuffer<T> {
    const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
        .union(wgpu::BufferUsages::COPY_SRC)
        .union(wgpu::BufferUsages::COPY_DST);

    /// Creates a buffer initialized with `data`.
    pub fn from_slice(context: &WgpuComputeContext, label: &str, data: &[T]) -> Self {
        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: Self::USAGE,
            });
        Self {
            buffer,
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// Creates a zero-filled buffer holding `len` elements.
    pub fn zeroed(context: &WgpuComputeContext, label: &str, len: usize) -> Self {
        let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (len * std::mem::size_of::<T>()) as u64,
            usage: Self::USAGE,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            len,
            _marker: PhantomData,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of `T` elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_size(&self) -> u64 {
        (self.len * std::mem::size_of::<T>()) as u64
    }

    /// Binds elements `start..start + count`.
    ///
    /// The byte offset must satisfy the device's storage offset alignment.
    pub fn binding(&self, start: usize, count: usize) -> wgpu::BindingResource<'_> {
        let element = std::mem::size_of::<T>() as u64;
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: start as u64 * element,
            size: NonZeroU64::new(count as u64 * element),
        })
    }

    /// Fills the whole buffer with zeros and waits for the device.
    pub fn clear(&self, context: &WgpuComputeContext) -> Result<(), ResourceError> {
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen Clear Buffer Encoder"),
            });
        encoder.clear_buffer(&self.buffer, 0, None);
        context
            .submit_and_wait(encoder)
            .map_err(|e| ResourceError::BackendError(e.to_string()))
    }

    /// Reads the whole buffer back to the host.
    pub fn read_to_vec(&self, context: &WgpuComputeContext) -> Result<Vec<T>, ResourceError> {
        self.read_range(context, 0, self.len)
    }

    /// Reads `count` elements starting at element `start`.
    ///
    /// Blocks until every previously submitted command has finished.
    pub fn read_range(
        &self,
        context: &WgpuComputeContext,
        start: usize,
        count: usize,
    ) -> Result<Vec<T>, ResourceError> {
        match start.checked_add(count) {
            Some(end) if end <= self.len => {}
            _ => return Err(ResourceError::OutOfBounds),
        }
        let element = std::mem::size_of::<T>() as u64;
        let offset = start as u64 * element;
        let size = count as u64 * element;
        for value in [offset, size] {
            if value % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
                return Err(ResourceError::Misaligned {
                    value,
                    alignment: wgpu::COPY_BUFFER_ALIGNMENT,
                });
            }
        }

        let bytes = read_buffer_bytes(&context.device, &context.queue, &self.buffer, offset, size)
            .map_err(ResourceError::BackendError)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}
