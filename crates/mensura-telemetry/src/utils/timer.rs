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

//! Provides RAII-based contexts for timing a scope. (RAII = Resource Acquisition Is Initialization)

use crate::instruments::Timer;
use mensura_core::Stopwatch;
use std::time::Duration;

/// Times a scope and records the result into a [`Timer`].
///
/// The duration is recorded by [`TimerContext::stop`], or when the context is
/// dropped without being stopped, so early returns and panics are measured
/// too.
#[derive(Debug)]
pub struct TimerContext<'a> {
    stopwatch: Stopwatch,
    timer: &'a Timer,
    stopped: bool,
}

impl<'a> TimerContext<'a> {
    pub(crate) fn new(timer: &'a Timer, stopwatch: Stopwatch) -> Self {
        Self {
            stopwatch,
            timer,
            stopped: false,
        }
    }

    /// Stops timing, records the duration and returns it.
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.stopwatch.elapsed();
        self.timer.update(elapsed);
        self.stopped = true;
        elapsed
    }
}

/// When the context goes out of scope unstopped, it records the elapsed time.
impl<'a> Drop for TimerContext<'a> {
    fn drop(&mut self) {
        if !self.stopped {
            self.record();
        }
    }
}
