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

//! Value distribution backed by a reservoir.

use super::reservoir::Reservoir;
use super::snapshot::Snapshot;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks the distribution of a stream of values.
///
/// The count covers every update; the statistics come from the reservoir's
/// sample.
#[derive(Debug)]
pub struct Histogram {
    count: AtomicU64,
    reservoir: Box<dyn Reservoir>,
}

impl Histogram {
    /// Creates a histogram sampling into `reservoir`.
    pub fn new(reservoir: Box<dyn Reservoir>) -> Self {
        Self {
            count: AtomicU64::new(0),
            reservoir,
        }
    }

    /// Records a value.
    pub fn update(&self, value: i64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.reservoir.update(value);
    }

    /// The number of values recorded.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// A snapshot of the sampled values.
    pub fn snapshot(&self) -> Snapshot {
        self.reservoir.snapshot()
    }
}
