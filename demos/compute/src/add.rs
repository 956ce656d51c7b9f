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

//! Element-wise vector addition over one `[A | B | result]` buffer.

use anyhow::{bail, Context, Result};
use lumen_core::math::align_up;
use lumen_infra::{
    pass_timestamp_writes, Kernel, ShaderLibrary, StorageBuffer, WgpuComputeContext,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DemoSettings;
use crate::timing;

const MODULE: &str = "add";
const ENTRY_POINT: &str = "add_main";
const WORKGROUP_SIZE: u32 = 128;
const SCOPE_LABEL: &str = "add";

/// Element distance between the starts of two segments, so that every
/// segment offset honours `alignment` bytes.
pub fn segment_stride(elements: usize, alignment: u64) -> usize {
    let bytes = (elements * std::mem::size_of::<f32>()) as u64;
    (align_up(bytes, alignment) / std::mem::size_of::<f32>() as u64) as usize
}

/// Seeded uniform inputs in `[0, 1)`.
pub fn random_inputs(elements: usize, seed: u64) -> (Vec<f32>, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = (0..elements).map(|_| rng.gen::<f32>()).collect();
    let b = (0..elements).map(|_| rng.gen::<f32>()).collect();
    (a, b)
}

/// Lays the inputs out as `[A | B | result]`, each segment `stride` long.
pub fn pack_segments(a: &[f32], b: &[f32], stride: usize) -> Vec<f32> {
    let mut data = vec![0.0; stride * 3];
    data[..a.len()].copy_from_slice(a);
    data[stride..stride + b.len()].copy_from_slice(b);
    data
}

/// Indices where `result` differs from `a + b`.
pub fn mismatches(a: &[f32], b: &[f32], result: &[f32]) -> Vec<usize> {
    a.iter()
        .zip(b)
        .zip(result)
        .enumerate()
        .filter(|(_, ((x, y), r))| (*x + *y - **r).abs() > f32::EPSILON * 4.0)
        .map(|(index, _)| index)
        .collect()
}

pub fn run(
    context: &WgpuComputeContext,
    library: &ShaderLibrary,
    settings: &DemoSettings,
) -> Result<()> {
    let elements = settings.add.elements as usize;
    if elements == 0 {
        bail!("the add demo needs at least one element");
    }
    let kernel = Kernel::from_library(context, library, MODULE, ENTRY_POINT, WORKGROUP_SIZE)?;

    let alignment = u64::from(context.device.limits().min_storage_buffer_offset_alignment);
    let stride = segment_stride(elements, alignment);
    let (a, b) = random_inputs(elements, settings.add.seed);
    let buffer =
        StorageBuffer::from_slice(context, "add segments", &pack_segments(&a, &b, stride));
    let bind_group = kernel.bind_group(
        context,
        "add bind group",
        &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.binding(0, elements),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: buffer.binding(stride, elements),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.binding(stride * 2, elements),
            },
        ],
    );
    let groups = kernel.group_count(settings.add.elements);
    log::info!("Adding {elements} elements in {groups} workgroups of {WORKGROUP_SIZE}.");

    let capacity = settings.timing.capacity.unwrap_or(2);
    let mut timer = timing::create_timer(context, capacity);
    let encoder_writes = timer
        .query_pool()
        .is_some_and(|pool| pool.allows_encoder_writes());

    let mut reports = Vec::new();
    for _ in 0..settings.timing.iterations {
        timer.begin_frame();
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("add encoder"),
            });

        if encoder_writes {
            let mut scope = timer.labeled_scope(&mut encoder, SCOPE_LABEL);
            let mut pass = scope.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("add pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(kernel.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, 1, 1);
        } else {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("add pass"),
                timestamp_writes: pass_timestamp_writes(&mut timer, SCOPE_LABEL),
            });
            pass.set_pipeline(kernel.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, 1, 1);
        }

        context.submit_and_wait(encoder)?;
        reports.extend(timing::resolve_cycle(&mut timer));
    }

    let result = buffer
        .read_range(context, stride * 2, elements)
        .context("Failed to read the add result back")?;
    let wrong = mismatches(&a, &b, &result);
    if let Some(&first) = wrong.first() {
        log::error!(
            "{} of {elements} sums are wrong; first at {first}: {} + {} != {}",
            wrong.len(),
            a[first],
            b[first],
            result[first]
        );
        bail!("add produced {} wrong elements", wrong.len());
    }
    log::info!("All {elements} sums match the CPU result.");

    timing::print_reports(&reports, settings.timing.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_start_on_aligned_offsets() {
        assert_eq!(segment_stride(16384, 256), 16384);
        assert_eq!(segment_stride(10, 256), 64);
        assert_eq!(segment_stride(65, 256), 128);
        assert_eq!(segment_stride(3, 4), 3);
    }

    #[test]
    fn inputs_are_reproducible_from_the_seed() {
        let (a, b) = random_inputs(32, 42);
        let (a2, b2) = random_inputs(32, 42);
        assert_eq!(a, a2);
        assert_eq!(b, b2);
        assert_ne!(a, b);
        assert!(a.iter().chain(&b).all(|v| (0.0..1.0).contains(v)));
        assert_ne!(random_inputs(32, 7).0, a);
    }

    #[test]
    fn packing_leaves_padding_and_result_zeroed() {
        let data = pack_segments(&[1.0, 2.0], &[3.0, 4.0], 4);
        assert_eq!(
            data,
            vec![1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn mismatches_report_wrong_indices() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.5, 0.5, 0.5];
        assert!(mismatches(&a, &b, &[1.5, 2.5, 3.5]).is_empty());
        assert_eq!(mismatches(&a, &b, &[1.5, 0.0, 3.5]), vec![1]);
    }
}
