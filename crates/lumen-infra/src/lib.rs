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

//! # Lumen Infra
//!
//! Concrete wgpu implementations of the contracts defined in `lumen-core`:
//! a headless compute context, the timestamp query backend for
//! [`GpuTimer`](lumen_core::GpuTimer), typed storage buffers with blocking
//! readback, and WGSL shader loading.

pub mod graphics;

pub use graphics::wgpu::{
    pass_timestamp_writes, ContextConfig, Kernel, ShaderLibrary, StorageBuffer,
    WgpuComputeContext, WgpuGpuTimer, WgpuQueryPool, WgpuTimestampDevice,
};
