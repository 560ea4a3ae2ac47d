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

//! Uniform reservoir over the whole stream.

use super::{Reservoir, DEFAULT_SIZE};
use crate::instruments::snapshot::Snapshot;
use parking_lot::Mutex;

#[derive(Debug)]
struct Sample {
    values: Vec<i64>,
    seen: u64,
}

/// A uniform sample of the whole stream using Vitter's Algorithm R.
///
/// The first `size` values are kept; the i-th value after that replaces a
/// random slot with probability `size / i`.
#[derive(Debug)]
pub struct UniformReservoir {
    size: usize,
    sample: Mutex<Sample>,
}

impl UniformReservoir {
    /// Creates a reservoir of [`DEFAULT_SIZE`] values.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_SIZE)
    }

    /// Creates a reservoir holding at most `size` values.
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            sample: Mutex::new(Sample {
                values: Vec::with_capacity(size),
                seen: 0,
            }),
        }
    }
}

impl Default for UniformReservoir {
    fn default() -> Self {
        Self::new()
    }
}

impl Reservoir for UniformReservoir {
    fn size(&self) -> usize {
        self.sample.lock().values.len()
    }

    fn update(&self, value: i64) {
        let mut sample = self.sample.lock();
        sample.seen += 1;
        if sample.values.len() < self.size {
            sample.values.push(value);
            return;
        }
        let slot = fastrand::u64(0..sample.seen);
        if let Ok(slot) = usize::try_from(slot) {
            if slot < self.size {
                sample.values[slot] = value;
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.sample.lock().values.clone())
    }
}
