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

//! The wgpu backend.

mod buffer;
mod context;
mod kernel;
mod readback;
mod timing;

pub use buffer::StorageBuffer;
pub use context::{timestamp_features, ContextConfig, WgpuComputeContext};
pub use kernel::{compile_module, Kernel, ShaderLibrary, DEFAULT_SEARCH_PATHS};
pub use timing::{
    frequency_from_period, pass_timestamp_writes, WgpuGpuTimer, WgpuQueryPool,
    WgpuTimestampDevice,
};
