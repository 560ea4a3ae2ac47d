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

//! Duration distribution combined with an event rate.

use super::histogram::Histogram;
use super::meter::Meter;
use super::reservoir::Reservoir;
use super::snapshot::Snapshot;
use crate::utils::timer::TimerContext;
use mensura_core::{Clock, Stopwatch};
use std::sync::Arc;
use std::time::Duration;

/// Records durations, in nanoseconds, into a histogram and marks a meter for
/// each one.
#[derive(Debug)]
pub struct Timer {
    clock: Arc<dyn Clock>,
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    /// Creates a timer sampling durations into `reservoir`.
    pub fn new(reservoir: Box<dyn Reservoir>, clock: Arc<dyn Clock>) -> Self {
        Self {
            histogram: Histogram::new(reservoir),
            meter: Meter::new(clock.clone()),
            clock,
        }
    }

    /// Records a duration.
    pub fn update(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark();
    }

    /// Runs `f`, recording how long it took.
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let context = self.time_context();
        let result = f();
        context.stop();
        result
    }

    /// Starts timing; the duration is recorded when the context is stopped
    /// or dropped.
    pub fn time_context(&self) -> TimerContext<'_> {
        TimerContext::new(self, Stopwatch::start(self.clock.clone()))
    }

    /// The number of recorded durations.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// A snapshot of the sampled durations in nanoseconds.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }

    /// The meter tracking how often durations are recorded.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// The one-minute moving-average rate of recorded durations.
    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    /// The five-minute moving-average rate.
    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    /// The fifteen-minute moving-average rate.
    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }

    /// The mean rate since the timer was created.
    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::reservoir::UniformReservoir;
    use mensura_core::ManualClock;

    fn timer() -> (Arc<ManualClock>, Timer) {
        let clock = Arc::new(ManualClock::default());
        let timer = Timer::new(Box::new(UniformReservoir::new()), clock.clone());
        (clock, timer)
    }

    #[test]
    fn test_update_records_nanoseconds() {
        let (_clock, timer) = timer();
        timer.update(Duration::from_millis(3));
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.meter().count(), 1);
        assert_eq!(timer.snapshot().values(), &[3_000_000]);
    }

    #[test]
    fn test_time_closure() {
        let (clock, timer) = timer();
        let answer = timer.time(|| {
            clock.advance(Duration::from_micros(40));
            42
        });
        assert_eq!(answer, 42);
        assert_eq!(timer.snapshot().values(), &[40_000]);
    }

    #[test]
    fn test_context_stop_and_drop() {
        let (clock, timer) = timer();
        let context = timer.time_context();
        clock.advance(Duration::from_millis(5));
        assert_eq!(context.stop(), Duration::from_millis(5));

        {
            let _context = timer.time_context();
            clock.advance(Duration::from_millis(7));
        }
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.snapshot().values(), &[5_000_000, 7_000_000]);
    }
}
