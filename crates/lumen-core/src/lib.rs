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

//! # Lumen Core
//!
//! Backend-agnostic contracts for GPU compute walkthroughs: the timestamp
//! timing state machine ([`GpuTimer`]), its scoped brackets, the traits a
//! graphics backend implements to host it, and the shared error types.

#![warn(missing_docs)]

pub mod error;
pub mod math;
pub mod timing;

pub use error::{ResourceError, ShaderError};
pub use timing::{
    Frame, GpuTimer, QueryPool, Scope, TimerError, TimestampDevice, TimestampTarget,
    TimingEntry, TimingReport,
};
