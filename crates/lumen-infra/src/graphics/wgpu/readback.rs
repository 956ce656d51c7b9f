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

//! Blocking host readback shared by buffers and query pools.

use std::sync::mpsc;

/// Maps `slice` for reading and blocks until the mapping has completed.
pub(crate) fn map_read_blocking(
    device: &wgpu::Device,
    slice: wgpu::BufferSlice<'_>,
) -> Result<(), String> {
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver outlives the poll below; a send failure is unreachable.
        let _ = sender.send(result);
    });

    device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| format!("device poll failed: {e:?}"))?;

    match receiver.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("map_async failed: {e:?}")),
        Err(_) => Err("map_async callback never ran".to_string()),
    }
}

/// Copies `size` bytes of `source` starting at `offset` into host memory.
///
/// Records the copy into a throwaway staging buffer, submits it and waits.
/// `offset` and `size` must respect `wgpu::COPY_BUFFER_ALIGNMENT`.
pub(crate) fn read_buffer_bytes(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    offset: u64,
    size: u64,
) -> Result<Vec<u8>, String> {
    if size == 0 {
        return Ok(Vec::new());
    }
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Lumen Readback Staging Buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Lumen Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(source, offset, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    map_read_blocking(device, slice)?;
    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}
