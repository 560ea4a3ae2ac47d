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

//! Point-in-time view over a reservoir's sampled values.

use serde::{Deserialize, Serialize};

/// An immutable, sorted copy of the values held by a reservoir.
///
/// Quantiles are computed by linear interpolation between adjacent order
/// statistics. An empty snapshot reports zero everywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: Vec<i64>,
}

impl Snapshot {
    /// Builds a snapshot over `values`, sorting them.
    pub fn new(mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { values }
    }

    /// The value at `quantile`, clamped into `[0, 1]`.
    pub fn value(&self, quantile: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        let quantile = if quantile.is_nan() {
            0.0
        } else {
            quantile.clamp(0.0, 1.0)
        };

        let pos = quantile * (n + 1) as f64;
        let index = pos.floor();
        if index < 1.0 {
            return self.values[0] as f64;
        }
        if index >= n as f64 {
            return self.values[n - 1] as f64;
        }
        let index = index as usize;
        let lower = self.values[index - 1] as f64;
        let upper = self.values[index] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }

    /// The median.
    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    /// The 75th percentile.
    pub fn p75(&self) -> f64 {
        self.value(0.75)
    }

    /// The 95th percentile.
    pub fn p95(&self) -> f64 {
        self.value(0.95)
    }

    /// The 98th percentile.
    pub fn p98(&self) -> f64 {
        self.value(0.98)
    }

    /// The 99th percentile.
    pub fn p99(&self) -> f64 {
        self.value(0.99)
    }

    /// The 99.9th percentile.
    pub fn p999(&self) -> f64 {
        self.value(0.999)
    }

    /// The sampled values, sorted ascending.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// The number of sampled values.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// The smallest sampled value.
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    /// The largest sampled value.
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    /// The arithmetic mean of the sampled values.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        sum / self.values.len() as f64
    }

    /// The sample standard deviation (n - 1 denominator).
    pub fn std_dev(&self) -> f64 {
        let n = self.values.len();
        if n <= 1 {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f64 = self
            .values
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum();
        (sum / (n - 1) as f64).sqrt()
    }

    /// Condenses the snapshot into its summary statistics.
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            size: self.size(),
            min: self.min(),
            max: self.max(),
            mean: self.mean(),
            std_dev: self.std_dev(),
            median: self.median(),
            p75: self.p75(),
            p95: self.p95(),
            p98: self.p98(),
            p99: self.p99(),
            p999: self.p999(),
        }
    }
}

/// The statistics of a [`Snapshot`], without the raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Number of sampled values.
    pub size: usize,
    /// Smallest sampled value.
    pub min: i64,
    /// Largest sampled value.
    pub max: i64,
    /// Mean of the sampled values.
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 98th percentile.
    pub p98: f64,
    /// 99th percentile.
    pub p99: f64,
    /// 99.9th percentile.
    pub p999: f64,
}
