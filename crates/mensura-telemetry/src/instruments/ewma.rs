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

//! Exponentially-weighted moving average of an event rate.

use portable_atomic::AtomicF64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Interval at which the meter feeds its moving averages.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// An exponentially-weighted moving average of events per unit of time.
///
/// Events are accumulated by [`Ewma::update`] and folded into the average on
/// each [`Ewma::tick`], which must be called once per tick interval. The
/// smoothing factor is chosen so that the weight of an observation halves
/// once per `half_life`.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    interval_nanos: f64,
    uncounted: AtomicU64,
    // Events per nanosecond.
    rate: AtomicF64,
    initialized: AtomicBool,
}

impl Ewma {
    /// Creates an average whose observations lose half their weight every
    /// `half_life`, ticked every `interval`.
    pub fn new(half_life: Duration, interval: Duration) -> Self {
        let alpha = 1.0 - 0.5f64.powf(interval.as_secs_f64() / half_life.as_secs_f64());
        Self::with_alpha(alpha, interval)
    }

    /// Creates an average with an explicit smoothing factor.
    pub fn with_alpha(alpha: f64, interval: Duration) -> Self {
        Self {
            alpha,
            interval_nanos: interval.as_nanos() as f64,
            uncounted: AtomicU64::new(0),
            rate: AtomicF64::new(0.0),
            initialized: AtomicBool::new(false),
        }
    }

    /// A one-minute average ticked every five seconds.
    pub fn one_minute() -> Self {
        Self::new(Duration::from_secs(60), TICK_INTERVAL)
    }

    /// A five-minute average ticked every five seconds.
    pub fn five_minutes() -> Self {
        Self::new(Duration::from_secs(5 * 60), TICK_INTERVAL)
    }

    /// A fifteen-minute average ticked every five seconds.
    pub fn fifteen_minutes() -> Self {
        Self::new(Duration::from_secs(15 * 60), TICK_INTERVAL)
    }

    /// The smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Adds `n` events to the current interval.
    pub fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Folds the events of the elapsed interval into the average.
    pub fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::AcqRel);
        let instant_rate = count as f64 / self.interval_nanos;
        if self.initialized.load(Ordering::Acquire) {
            let rate = self.rate.load(Ordering::Acquire);
            self.rate
                .store(rate + self.alpha * (instant_rate - rate), Ordering::Release);
        } else {
            self.rate.store(instant_rate, Ordering::Release);
            self.initialized.store(true, Ordering::Release);
        }
    }

    /// The average rate in events per second.
    pub fn rate_per_second(&self) -> f64 {
        self.rate.load(Ordering::Acquire) * 1e9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_alpha_gives_requested_half_life() {
        let ewma = Ewma::one_minute();
        // Twelve ticks of five seconds make one minute.
        assert_relative_eq!((1.0 - ewma.alpha()).powi(12), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_first_tick_sets_rate() {
        let ewma = Ewma::one_minute();
        ewma.update(10);
        ewma.tick();
        assert_relative_eq!(ewma.rate_per_second(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rate_halves_after_one_half_life_of_silence() {
        let ewma = Ewma::five_minutes();
        ewma.update(50);
        ewma.tick();
        let initial = ewma.rate_per_second();
        for _ in 0..60 {
            ewma.tick();
        }
        assert_relative_eq!(ewma.rate_per_second(), initial / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_steady_rate_converges() {
        let ewma = Ewma::one_minute();
        for _ in 0..500 {
            ewma.update(5);
            ewma.tick();
        }
        assert_relative_eq!(ewma.rate_per_second(), 1.0, epsilon = 1e-6);
    }
}
