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

//! GPU timestamp timing.
//!
//! A [`GpuTimer`] owns a fixed-capacity pool of timestamp queries. Callers
//! bracket recorded work with [`Scope`]s, submit and wait for the device,
//! then [`GpuTimer::resolve`] the raw ticks into calibrated per-pair
//! durations. The backend is abstracted behind [`TimestampDevice`],
//! [`QueryPool`] and [`TimestampTarget`].

mod error;
mod report;
mod scope;
mod timer;
mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::TimerError;
pub use report::{TimingEntry, TimingReport};
pub use scope::{Frame, Scope};
pub use timer::GpuTimer;
pub use traits::{QueryPool, TimestampDevice, TimestampTarget};
