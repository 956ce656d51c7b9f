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

use std::ops::{Deref, DerefMut};

use super::timer::GpuTimer;
use super::traits::{QueryPool, TimestampTarget};

/// A begin/end timestamp bracket around work recorded on one target.
///
/// Creating the scope writes the begin timestamp; dropping it writes the
/// matching end timestamp on the same target. If the begin write was
/// rejected (pool full, target unable to record) the scope is inert and
/// dropping it records nothing.
///
/// The scope holds the target exclusively, so recording continues through
/// it via `Deref`/`DerefMut`. Moving a scope moves the pending end write
/// with it; the borrow on the timer keeps scopes from nesting or spanning a
/// reset.
#[must_use = "dropping a scope immediately records an empty interval"]
pub struct Scope<'a, P: QueryPool, T: TimestampTarget<P> + ?Sized> {
    timer: &'a mut GpuTimer<P>,
    target: &'a mut T,
    started: bool,
}

impl<'a, P: QueryPool, T: TimestampTarget<P> + ?Sized> Scope<'a, P, T> {
    pub(crate) fn new(timer: &'a mut GpuTimer<P>, target: &'a mut T, label: String) -> Self {
        let begin_slot = timer.query_count();
        let started = timer.write_timestamp(target);
        if started {
            timer.label_pair(begin_slot, label);
        }
        Self {
            timer,
            target,
            started,
        }
    }

    /// Whether the begin timestamp was recorded.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Closes the scope now instead of at the end of the enclosing block.
    pub fn end(self) {}
}

impl<P: QueryPool, T: TimestampTarget<P> + ?Sized> Deref for Scope<'_, P, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.target
    }
}

impl<P: QueryPool, T: TimestampTarget<P> + ?Sized> DerefMut for Scope<'_, P, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.target
    }
}

impl<P: QueryPool, T: TimestampTarget<P> + ?Sized> Drop for Scope<'_, P, T> {
    fn drop(&mut self) {
        if self.started {
            self.started = false;
            if !self.timer.write_timestamp(&mut *self.target) {
                log::warn!("GPU timer scope could not record its end timestamp.");
            }
        }
    }
}

/// A bracket around one resolve cycle.
///
/// Construction resets the timer; the frame then dereferences to the timer
/// for opening scopes, resolving and reading results.
pub struct Frame<'a, P: QueryPool> {
    timer: &'a mut GpuTimer<P>,
}

impl<'a, P: QueryPool> Frame<'a, P> {
    pub(crate) fn new(timer: &'a mut GpuTimer<P>) -> Self {
        timer.begin_frame();
        Self { timer }
    }
}

impl<P: QueryPool> Deref for Frame<'_, P> {
    type Target = GpuTimer<P>;

    fn deref(&self) -> &GpuTimer<P> {
        &*self.timer
    }
}

impl<P: QueryPool> DerefMut for Frame<'_, P> {
    fn deref_mut(&mut self) -> &mut GpuTimer<P> {
        &mut *self.timer
    }
}

#[cfg(test)]
mod tests {
    use crate::timing::test_support::{RecordingTarget, ScriptedDevice};
    use crate::timing::GpuTimer;

    fn hand_over<S>(scope: S) -> S {
        scope
    }

    #[test]
    fn scope_writes_begin_and_end() {
        let mut timer = GpuTimer::create(&ScriptedDevice::new(1000), 4).unwrap();
        let mut target = RecordingTarget::default();
        {
            let scope = timer.scope(&mut target);
            assert!(scope.is_started());
            assert_eq!(scope.writes, vec![0]);
        }
        assert_eq!(target.writes, vec![0, 1]);
        assert_eq!(timer.query_count(), 2);
    }

    #[test]
    fn moved_scope_writes_end_exactly_once() {
        let mut timer = GpuTimer::create(&ScriptedDevice::new(1000), 4).unwrap();
        let mut target = RecordingTarget::default();
        {
            let scope = timer.labeled_scope(&mut target, "moved");
            let moved = hand_over(scope);
            assert!(moved.is_started());
            assert_eq!(moved.writes.len(), 1);
            let mut holder = Vec::with_capacity(1);
            holder.push(moved);
            assert_eq!(holder[0].writes.len(), 1);
        }
        assert_eq!(target.writes, vec![0, 1]);
        assert_eq!(timer.query_count(), 2);
    }

    #[test]
    fn recording_goes_through_the_scope() {
        let mut timer = GpuTimer::create(&ScriptedDevice::new(1000), 4).unwrap();
        let mut target = RecordingTarget::default();
        {
            let mut scope = timer.scope(&mut target);
            scope.commands.push("dispatch");
        }
        assert_eq!(target.commands, vec!["dispatch"]);
        assert_eq!(target.writes, vec![0, 1]);
    }

    #[test]
    fn explicit_end_closes_immediately() {
        let mut timer = GpuTimer::create(&ScriptedDevice::new(1000), 4).unwrap();
        let mut target = RecordingTarget::default();
        timer.labeled_scope(&mut target, "first").end();
        assert_eq!(timer.query_count(), 2);
        timer.labeled_scope(&mut target, "second").end();
        assert_eq!(target.writes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn inert_scope_records_nothing_on_drop() {
        let mut timer = GpuTimer::create(&ScriptedDevice::new(1000), 2).unwrap();
        let mut target = RecordingTarget::default();
        timer.scope(&mut target).end();

        let scope = timer.scope(&mut target);
        assert!(!scope.is_started());
        drop(scope);

        assert_eq!(target.writes, vec![0, 1]);
    }

    #[test]
    fn frame_resets_and_proxies_timer() {
        let device = ScriptedDevice::new(100).with_ticks(vec![0, 50, 100, 200]);
        let mut timer = GpuTimer::create(&device, 4).unwrap();
        let mut target = RecordingTarget::default();
        timer.scope(&mut target).end();
        timer.scope(&mut target).end();
        timer.resolve().unwrap();
        assert_eq!(timer.pair_durations().len(), 2);

        let mut frame = timer.frame();
        assert_eq!(frame.query_count(), 0);
        assert!(frame.pair_durations().is_empty());
        frame.labeled_scope(&mut target, "frame work").end();
        frame.resolve().unwrap();

        assert_eq!(frame.raw_timestamps(), &[0, 50]);
        assert_eq!(frame.pair_durations(), &[0.5]);
        assert_eq!(frame.labels(), &["frame work".to_string()]);
    }
}
