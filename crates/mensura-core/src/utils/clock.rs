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

//! Time sources used by the instruments.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of time readings.
///
/// Instruments never read the system time directly, so tests can drive them
/// with a [`ManualClock`].
pub trait Clock: Send + Sync + Debug + 'static {
    /// Monotonic time in nanoseconds from an arbitrary origin.
    fn tick(&self) -> u64;

    /// Wall-clock time in milliseconds since the Unix epoch (UTC).
    fn wall_time_millis(&self) -> u64;
}

/// The process clock: [`Instant`] for ticks, [`SystemTime`] for wall time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose ticks start at zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn tick(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn wall_time_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
    wall_millis: AtomicU64,
}

impl ManualClock {
    /// Creates a clock at tick zero with the given wall time.
    pub fn new(wall_time_millis: u64) -> Self {
        Self {
            nanos: AtomicU64::new(0),
            wall_millis: AtomicU64::new(wall_time_millis),
        }
    }

    /// Moves both the monotonic and the wall clock forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
        self.wall_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn tick(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }

    fn wall_time_millis(&self) -> u64 {
        self.wall_millis.load(Ordering::SeqCst)
    }
}
