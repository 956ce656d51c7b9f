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

//! Multi-pass parallel sum of `1..=N`.
//!
//! Each level folds groups of 256 values into one partial sum; levels repeat
//! until a single value is left. Every level runs in its own compute pass
//! with its own labeled timing interval.

use anyhow::{bail, Context, Result};
use lumen_core::math::divide_and_round_up;
use lumen_infra::{
    pass_timestamp_writes, Kernel, ShaderLibrary, StorageBuffer, WgpuComputeContext,
};

use crate::config::DemoSettings;
use crate::timing;

const MODULE: &str = "reduce";
const ENTRY_POINT: &str = "reduce_main";
const WORKGROUP_SIZE: u32 = 256;

/// Input length of every level, starting with `elements`. A single element
/// still takes one level.
pub fn level_inputs(elements: u32, workgroup_size: u32) -> Vec<u32> {
    let mut levels = vec![elements];
    let mut remaining = divide_and_round_up(elements, workgroup_size);
    while remaining > 1 {
        levels.push(remaining);
        remaining = divide_and_round_up(remaining, workgroup_size);
    }
    levels
}

/// `1 + 2 + ... + n`.
pub fn expected_sum(n: u32) -> f64 {
    let n = u64::from(n);
    (n * (n + 1) / 2) as f64
}

/// Whether `actual` matches `expected` within f32 accumulation error.
pub fn sum_matches(actual: f32, expected: f64) -> bool {
    let tolerance = (expected.abs() * 1e-5).max(f64::from(f32::EPSILON));
    (f64::from(actual) - expected).abs() <= tolerance
}

pub fn run(
    context: &WgpuComputeContext,
    library: &ShaderLibrary,
    settings: &DemoSettings,
) -> Result<()> {
    let elements = settings.reduce.elements;
    if elements == 0 {
        bail!("the reduce demo needs at least one element");
    }
    let kernel = Kernel::from_library(context, library, MODULE, ENTRY_POINT, WORKGROUP_SIZE)?;

    let input: Vec<f32> = (1..=elements).map(|value| value as f32).collect();
    let source = StorageBuffer::from_slice(context, "reduce input", &input);
    let partial_len = kernel.group_count(elements) as usize;
    let partials = [
        StorageBuffer::<f32>::zeroed(context, "reduce partials 0", partial_len),
        StorageBuffer::<f32>::zeroed(context, "reduce partials 1", partial_len),
    ];

    // Level `i` reads the previous level's partials and writes into the
    // other buffer of the pair.
    let levels = level_inputs(elements, WORKGROUP_SIZE);
    let bind_groups: Vec<wgpu::BindGroup> = levels
        .iter()
        .enumerate()
        .map(|(level, &count)| {
            let read = if level == 0 {
                source.binding(0, count as usize)
            } else {
                partials[(level - 1) % 2].binding(0, count as usize)
            };
            let write = partials[level % 2].binding(0, kernel.group_count(count) as usize);
            kernel.bind_group(
                context,
                &format!("reduce level {level}"),
                &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: read,
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: write,
                    },
                ],
            )
        })
        .collect();
    log::info!(
        "Summing 1..={elements} in {} level(s) of {WORKGROUP_SIZE}-wide workgroups.",
        levels.len()
    );

    let capacity = settings.timing.capacity.unwrap_or(2 * levels.len() as u32);
    let mut timer = timing::create_timer(context, capacity);

    let mut reports = Vec::new();
    for _ in 0..settings.timing.iterations {
        let mut frame = timer.frame();
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("reduce encoder"),
            });
        for (level, (&count, bind_group)) in levels.iter().zip(&bind_groups).enumerate() {
            let label = format!("reduce level {level}");
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label.as_str()),
                timestamp_writes: pass_timestamp_writes(&mut frame, label.as_str()),
            });
            pass.set_pipeline(kernel.pipeline());
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(kernel.group_count(count), 1, 1);
        }
        context.submit_and_wait(encoder)?;
        reports.extend(timing::resolve_cycle(&mut frame));
    }

    let last = (levels.len() - 1) % 2;
    let sum = partials[last]
        .read_range(context, 0, 1)
        .context("Failed to read the reduction result back")?[0];
    let expected = expected_sum(elements);
    if !sum_matches(sum, expected) {
        bail!("reduction produced {sum}, expected {expected}");
    }
    log::info!("GPU sum {sum} matches the expected {expected}.");

    timing::print_reports(&reports, settings.timing.json)
}
