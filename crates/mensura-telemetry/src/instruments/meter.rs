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

//! Event meter with moving-average rates.

use super::ewma::{Ewma, TICK_INTERVAL};
use mensura_core::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const TICK_NANOS: u64 = TICK_INTERVAL.as_nanos() as u64;

/// Counts events and tracks their mean rate plus one-, five- and
/// fifteen-minute moving-average rates, all in events per second.
///
/// Averages are ticked lazily from the monotonic clock on every mark and
/// every read.
#[derive(Debug)]
pub struct Meter {
    clock: Arc<dyn Clock>,
    start_time: u64,
    last_tick: AtomicU64,
    count: AtomicU64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl Meter {
    /// Creates a meter starting now.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let start_time = clock.tick();
        Self {
            clock,
            start_time,
            last_tick: AtomicU64::new(start_time),
            count: AtomicU64::new(0),
            m1: Ewma::one_minute(),
            m5: Ewma::five_minutes(),
            m15: Ewma::fifteen_minutes(),
        }
    }

    /// Marks one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Marks `n` events.
    pub fn mark_n(&self, n: u64) {
        self.tick_if_necessary();
        self.count.fetch_add(n, Ordering::Relaxed);
        self.m1.update(n);
        self.m5.update(n);
        self.m15.update(n);
    }

    fn tick_if_necessary(&self) {
        let old_tick = self.last_tick.load(Ordering::Acquire);
        let new_tick = self.clock.tick();
        let age = new_tick.saturating_sub(old_tick);
        if age <= TICK_NANOS {
            return;
        }
        let new_interval_start = new_tick - age % TICK_NANOS;
        // Only the caller that moves the interval start performs the ticks.
        if self
            .last_tick
            .compare_exchange(old_tick, new_interval_start, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let required = age / TICK_NANOS;
            log::trace!("Meter advancing {required} tick(s)");
            for _ in 0..required {
                self.m1.tick();
                self.m5.tick();
                self.m15.tick();
            }
        }
    }

    /// The number of events marked.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// The one-minute moving-average rate.
    pub fn one_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m1.rate_per_second()
    }

    /// The five-minute moving-average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m5.rate_per_second()
    }

    /// The fifteen-minute moving-average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.tick_if_necessary();
        self.m15.rate_per_second()
    }

    /// Events per second since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.clock.tick().saturating_sub(self.start_time);
        if elapsed == 0 {
            return 0.0;
        }
        count as f64 / elapsed as f64 * 1e9
    }
}
