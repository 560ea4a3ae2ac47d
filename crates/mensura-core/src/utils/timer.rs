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

//! A clock-backed stopwatch.

use super::clock::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Measures the time elapsed since it was started, on a given [`Clock`].
#[derive(Debug, Clone)]
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    start: u64,
}

impl Stopwatch {
    /// Starts a new stopwatch.
    pub fn start(clock: Arc<dyn Clock>) -> Self {
        let start = clock.tick();
        Self { clock, start }
    }

    /// Time elapsed since the stopwatch was started.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.clock.tick().saturating_sub(self.start))
    }

    /// Elapsed time in seconds.
    pub fn elapsed_secs_f64(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}
