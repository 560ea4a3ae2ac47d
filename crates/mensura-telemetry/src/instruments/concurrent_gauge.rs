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

//! Gauge of in-flight work with per-minute extremes.

use mensura_core::Clock;
use parking_lot::Mutex;
use std::sync::Arc;

const MILLIS_PER_MINUTE: u64 = 60_000;

#[derive(Debug)]
struct Window {
    minute: u64,
    current: i64,
    max: i64,
    min: i64,
    // Extremes of the last completed minute.
    completed: Option<(i64, i64)>,
}

impl Window {
    fn roll(&mut self, now_minute: u64) {
        if now_minute <= self.minute {
            return;
        }
        self.completed = if now_minute == self.minute + 1 {
            Some((self.max, self.min))
        } else {
            // A whole minute passed without activity.
            Some((self.current, self.current))
        };
        self.minute = now_minute;
        self.max = self.current;
        self.min = self.current;
    }

    fn extremes(&self) -> (i64, i64) {
        self.completed.unwrap_or((self.max, self.min))
    }
}

/// Counts parallel invocations and reports the highest and lowest count seen
/// during the last completed UTC minute.
///
/// Minute boundaries are observed lazily: every operation checks the wall
/// clock and rolls the window at most once before acting. Until the first
/// minute completes, `max` and `min` report the window in progress.
#[derive(Debug)]
pub struct ConcurrentGauge {
    clock: Arc<dyn Clock>,
    window: Mutex<Window>,
}

impl ConcurrentGauge {
    /// Creates a gauge at zero.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let minute = clock.wall_time_millis() / MILLIS_PER_MINUTE;
        Self {
            clock,
            window: Mutex::new(Window {
                minute,
                current: 0,
                max: 0,
                min: 0,
                completed: None,
            }),
        }
    }

    fn current_minute(&self) -> u64 {
        self.clock.wall_time_millis() / MILLIS_PER_MINUTE
    }

    /// Records the start of an invocation.
    pub fn inc(&self) {
        let now = self.current_minute();
        let mut window = self.window.lock();
        window.roll(now);
        window.current += 1;
        window.max = window.max.max(window.current);
    }

    /// Records the end of an invocation.
    pub fn dec(&self) {
        let now = self.current_minute();
        let mut window = self.window.lock();
        window.roll(now);
        window.current -= 1;
        window.min = window.min.min(window.current);
    }

    /// The number of invocations currently in flight.
    pub fn count(&self) -> i64 {
        let now = self.current_minute();
        let mut window = self.window.lock();
        window.roll(now);
        window.current
    }

    /// The highest count of the last completed minute.
    pub fn max(&self) -> i64 {
        let now = self.current_minute();
        let mut window = self.window.lock();
        window.roll(now);
        window.extremes().0
    }

    /// The lowest count of the last completed minute.
    pub fn min(&self) -> i64 {
        let now = self.current_minute();
        let mut window = self.window.lock();
        window.roll(now);
        window.extremes().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mensura_core::ManualClock;
    use std::time::Duration;

    fn gauge_at(wall_millis: u64) -> (Arc<ManualClock>, ConcurrentGauge) {
        let clock = Arc::new(ManualClock::new(wall_millis));
        let gauge = ConcurrentGauge::new(clock.clone());
        (clock, gauge)
    }

    #[test]
    fn test_within_first_minute() {
        let (_clock, gauge) = gauge_at(0);
        gauge.inc();
        gauge.inc();
        gauge.dec();
        assert_eq!(gauge.count(), 1);
        assert_eq!(gauge.max(), 2);
        assert_eq!(gauge.min(), 0);
    }

    #[test]
    fn test_roll_reports_previous_minute() {
        let (clock, gauge) = gauge_at(0);
        gauge.inc();
        gauge.inc();
        gauge.inc();
        gauge.dec();

        clock.advance(Duration::from_secs(60));
        // The new minute starts from the current value of 2.
        gauge.dec();
        assert_eq!(gauge.count(), 1);
        assert_eq!(gauge.max(), 3);
        assert_eq!(gauge.min(), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(gauge.max(), 2);
        assert_eq!(gauge.min(), 1);
    }

    #[test]
    fn test_idle_minutes_report_steady_value() {
        let (clock, gauge) = gauge_at(30_000);
        gauge.inc();
        gauge.inc();
        clock.advance(Duration::from_secs(300));
        assert_eq!(gauge.max(), 2);
        assert_eq!(gauge.min(), 2);
    }

    #[test]
    fn test_boundary_follows_wall_clock_minute() {
        // 59 s into a minute; one more second crosses the boundary.
        let (clock, gauge) = gauge_at(59_000);
        gauge.inc();
        clock.advance(Duration::from_secs(1));
        gauge.dec();
        assert_eq!(gauge.max(), 1);
        assert_eq!(gauge.min(), 0);
    }
}
