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

//! Forward-decaying priority reservoir.

use super::{Reservoir, DEFAULT_SIZE};
use crate::instruments::snapshot::Snapshot;
use mensura_core::Clock;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Decay factor giving a strong bias towards the last five minutes.
pub const DEFAULT_ALPHA: f64 = 0.015;

const RESCALE_THRESHOLD: Duration = Duration::from_secs(60 * 60);
const NANOS_PER_SECOND: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy)]
struct Priority(f64);

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug)]
struct State {
    values: BTreeMap<Priority, i64>,
    // Landmark of the forward decay, in whole seconds of the monotonic clock.
    start_time: u64,
    next_scale_time: u64,
}

/// An exponentially-decaying random sample, after Cormode et al.'s forward
/// decay priority sampling.
///
/// Every value gets the weight `exp(alpha * (t - t0))` and the priority
/// `weight / u` for a uniform `u` in `(0, 1]`; the `size` highest priorities
/// are kept. Once an hour the priorities are rescaled against a new landmark
/// so they stay within floating point range.
#[derive(Debug)]
pub struct ExponentiallyDecayingReservoir {
    size: usize,
    alpha: f64,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl ExponentiallyDecayingReservoir {
    /// Creates a reservoir with [`DEFAULT_SIZE`] and [`DEFAULT_ALPHA`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_params(DEFAULT_SIZE, DEFAULT_ALPHA, clock)
    }

    /// Creates a reservoir holding `size` values with decay factor `alpha`.
    pub fn with_params(size: usize, alpha: f64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.tick();
        Self {
            size,
            alpha,
            state: Mutex::new(State {
                values: BTreeMap::new(),
                start_time: now / NANOS_PER_SECOND,
                next_scale_time: now.saturating_add(RESCALE_THRESHOLD.as_nanos() as u64),
            }),
            clock,
        }
    }

    fn rescale(&self, state: &mut State, now: u64) {
        state.next_scale_time = now.saturating_add(RESCALE_THRESHOLD.as_nanos() as u64);
        let old_start_time = state.start_time;
        state.start_time = now / NANOS_PER_SECOND;
        let elapsed = state.start_time.saturating_sub(old_start_time) as f64;
        let scaling_factor = (-self.alpha * elapsed).exp();
        if scaling_factor == 0.0 {
            state.values.clear();
        } else {
            let values = std::mem::take(&mut state.values);
            state.values = values
                .into_iter()
                .map(|(priority, value)| (Priority(priority.0 * scaling_factor), value))
                .collect();
        }
        log::trace!(
            "Rescaled reservoir by {scaling_factor:e}, {} value(s) kept",
            state.values.len()
        );
    }
}

impl Reservoir for ExponentiallyDecayingReservoir {
    fn size(&self) -> usize {
        self.state.lock().values.len()
    }

    fn update(&self, value: i64) {
        let now = self.clock.tick();
        let mut state = self.state.lock();
        if now >= state.next_scale_time {
            self.rescale(&mut state, now);
        }

        let age = (now / NANOS_PER_SECOND).saturating_sub(state.start_time) as f64;
        let weight = (self.alpha * age).exp();
        // fastrand yields [0, 1); flip it into (0, 1].
        let priority = Priority(weight / (1.0 - fastrand::f64()));

        if state.values.len() < self.size {
            state.values.insert(priority, value);
            return;
        }
        let Some((&lowest, _)) = state.values.first_key_value() else {
            return;
        };
        if lowest < priority && !state.values.contains_key(&priority) {
            state.values.insert(priority, value);
            state.values.remove(&lowest);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.state.lock().values.values().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mensura_core::ManualClock;

    fn reservoir(size: usize) -> (Arc<ManualClock>, ExponentiallyDecayingReservoir) {
        let clock = Arc::new(ManualClock::default());
        let reservoir =
            ExponentiallyDecayingReservoir::with_params(size, DEFAULT_ALPHA, clock.clone());
        (clock, reservoir)
    }

    #[test]
    fn test_holds_at_most_size_values() {
        let (_clock, reservoir) = reservoir(100);
        for i in 0..1000 {
            reservoir.update(i);
        }
        assert_eq!(reservoir.size(), 100);
        let snapshot = reservoir.snapshot();
        assert_eq!(snapshot.size(), 100);
        assert!(snapshot.values().iter().all(|v| (0..1000).contains(v)));
    }

    #[test]
    fn test_keeps_everything_below_size() {
        let (_clock, reservoir) = reservoir(100);
        for i in 0..10 {
            reservoir.update(i);
        }
        assert_eq!(reservoir.snapshot().values(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_recent_values_dominate() {
        let (clock, reservoir) = reservoir(100);
        for _ in 0..1000 {
            reservoir.update(1);
        }
        // More than twenty half-lives later the new values outweigh the old ones.
        clock.advance(Duration::from_secs(1000));
        for _ in 0..1000 {
            reservoir.update(2);
        }
        let snapshot = reservoir.snapshot();
        assert_eq!(snapshot.size(), 100);
        assert_eq!(snapshot.median(), 2.0);
        assert!(snapshot.values().iter().filter(|&&v| v == 2).count() >= 95);
    }

    #[test]
    fn test_sample_follows_decayed_weights() {
        const ALPHA: f64 = 0.0015;
        const SECONDS: i64 = 10_000;
        const RUNS: usize = 40;

        fastrand::seed(7);
        let mut medians = 0.0;
        for _ in 0..RUNS {
            let clock = Arc::new(ManualClock::default());
            let reservoir = ExponentiallyDecayingReservoir::with_params(20, ALPHA, clock.clone());
            // One value per second, each value being its own timestamp.
            for t in 0..SECONDS {
                reservoir.update(t);
                clock.advance(Duration::from_secs(1));
            }
            medians += reservoir.snapshot().median();
        }
        let median = medians / RUNS as f64;

        // Weights grow as exp(alpha * t), so half of the total weight lies
        // within ln(2) / alpha seconds of the newest value.
        let expected = (SECONDS - 1) as f64 - std::f64::consts::LN_2 / ALPHA;
        assert!(
            (median - expected).abs() < 120.0,
            "median {median}, expected about {expected}"
        );
    }

    #[test]
    fn test_rescale_keeps_values() {
        let (clock, reservoir) = reservoir(DEFAULT_SIZE);
        for i in 0..10 {
            reservoir.update(i);
        }
        clock.advance(Duration::from_secs(61 * 60));
        reservoir.update(10);
        assert_eq!(reservoir.size(), 11);

        let state = reservoir.state.lock();
        assert_eq!(state.start_time, 61 * 60);
        // The new value's weight is back near 1.
        assert!(state.values.keys().all(|p| p.0.is_finite()));
    }

    #[test]
    fn test_rescale_after_long_idle_clears() {
        let (clock, reservoir) = reservoir(DEFAULT_SIZE);
        for i in 0..10 {
            reservoir.update(i);
        }
        // exp(-0.015 * 14h) underflows to zero.
        clock.advance(Duration::from_secs(14 * 60 * 60));
        reservoir.update(99);
        assert_eq!(reservoir.snapshot().values(), &[99]);
    }
}
