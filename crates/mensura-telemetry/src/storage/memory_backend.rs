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

//! Lock-guarded in-memory storage for a registry.

use crate::storage::table::MetricTable;
use mensura_core::MetricType;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory storage using a single `RwLock<MetricTable>`.
///
/// This implementation provides:
/// - Thread-safe concurrent access (multiple readers, single writer)
/// - Atomic two-map updates: an id, its instrument and its metadata become
///   visible together
/// - No lock poisoning
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    /// The core storage - RwLock allows concurrent reads
    table: RwLock<MetricTable>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory backend with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RwLock::new(MetricTable::with_capacity(capacity)),
        }
    }

    /// Shared access for readers.
    pub fn read(&self) -> RwLockReadGuard<'_, MetricTable> {
        self.table.read()
    }

    /// Exclusive access for registration and removal.
    pub fn write(&self) -> RwLockWriteGuard<'_, MetricTable> {
        self.table.write()
    }

    /// Get statistics about this backend
    pub fn get_stats(&self) -> BackendStats {
        let table = self.table.read();
        let mut stats = BackendStats {
            total_metrics: table.len(),
            ..BackendStats::default()
        };

        for (_, metric) in table.iter() {
            match metric.metric_type() {
                MetricType::Counter => stats.counter_count += 1,
                MetricType::ConcurrentGauge => stats.concurrent_gauge_count += 1,
                MetricType::Gauge => stats.gauge_count += 1,
                MetricType::Histogram => stats.histogram_count += 1,
                MetricType::Metered => stats.meter_count += 1,
                MetricType::Timer => stats.timer_count += 1,
                MetricType::Invalid => {}
            }
        }
        stats.name_count = table.metadata_entries().count();
        stats
    }
}

/// Statistics about the stored metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Total number of ids stored
    pub total_metrics: usize,
    /// Number of distinct names
    pub name_count: usize,
    /// Number of counters
    pub counter_count: usize,
    /// Number of concurrent gauges
    pub concurrent_gauge_count: usize,
    /// Number of gauges
    pub gauge_count: usize,
    /// Number of histograms
    pub histogram_count: usize,
    /// Number of meters
    pub meter_count: usize,
    /// Number of timers
    pub timer_count: usize,
}
