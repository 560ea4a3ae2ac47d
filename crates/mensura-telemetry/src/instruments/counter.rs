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

//! Monotonic event counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing 64-bit count.
///
/// Increments are atomic. On overflow the count wraps around to zero.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by one.
    pub fn inc(&self) {
        self.inc_by(1);
    }

    /// Increments the counter by `n`.
    pub fn inc_by(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// The current count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_increments() {
        let counter = Counter::new();
        counter.inc();
        counter.inc_by(41);
        assert_eq!(counter.count(), 42);
    }

    #[test]
    fn test_counter_wraps_on_overflow() {
        let counter = Counter::new();
        counter.inc_by(u64::MAX);
        counter.inc_by(2);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_counter_parallel_increments() {
        let counter = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        counter.inc();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 80_000);
    }
}
