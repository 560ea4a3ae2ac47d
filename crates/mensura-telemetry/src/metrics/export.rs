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

//! Serializable, read-only views of a registry for exporters.

use crate::instruments::{Meter, Metric, SnapshotSummary};
use crate::metrics::registry::RegistryScope;
use mensura_core::{Metadata, MetricId, Number};
use serde::Serialize;

/// Rates of a meter, in events per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterRates {
    /// Number of events marked.
    pub count: u64,
    /// Mean rate since creation.
    pub mean_rate: f64,
    /// One-minute moving average.
    pub one_minute_rate: f64,
    /// Five-minute moving average.
    pub five_minute_rate: f64,
    /// Fifteen-minute moving average.
    pub fifteen_minute_rate: f64,
}

impl MeterRates {
    /// Reads the rates of `meter`.
    pub fn read(meter: &Meter) -> Self {
        Self {
            count: meter.count(),
            mean_rate: meter.mean_rate(),
            one_minute_rate: meter.one_minute_rate(),
            five_minute_rate: meter.five_minute_rate(),
            fifteen_minute_rate: meter.fifteen_minute_rate(),
        }
    }
}

/// The value of one instrument at the time it was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricValue {
    /// A counter reading.
    Counter {
        /// The count.
        count: u64,
    },
    /// A concurrent gauge reading.
    ConcurrentGauge {
        /// Invocations in flight.
        current: i64,
        /// Highest count of the last completed minute.
        max: i64,
        /// Lowest count of the last completed minute.
        min: i64,
    },
    /// A gauge reading.
    Gauge {
        /// The produced value.
        value: Number,
    },
    /// A meter reading.
    Meter(MeterRates),
    /// A histogram reading.
    Histogram {
        /// Number of recorded values.
        count: u64,
        /// Statistics of the sampled values.
        snapshot: SnapshotSummary,
    },
    /// A timer reading; durations in nanoseconds.
    Timer {
        /// Rates of recorded durations.
        rates: MeterRates,
        /// Statistics of the sampled durations.
        snapshot: SnapshotSummary,
    },
}

impl MetricValue {
    /// Reads the current value of `metric`.
    pub fn read(metric: &Metric) -> Self {
        match metric {
            Metric::Counter(counter) => MetricValue::Counter {
                count: counter.count(),
            },
            Metric::ConcurrentGauge(gauge) => MetricValue::ConcurrentGauge {
                current: gauge.count(),
                max: gauge.max(),
                min: gauge.min(),
            },
            Metric::Gauge(gauge) => MetricValue::Gauge {
                value: gauge.value(),
            },
            Metric::Meter(meter) => MetricValue::Meter(MeterRates::read(meter)),
            Metric::Histogram(histogram) => MetricValue::Histogram {
                count: histogram.count(),
                snapshot: histogram.snapshot().summary(),
            },
            Metric::Timer(timer) => MetricValue::Timer {
                rates: MeterRates::read(timer.meter()),
                snapshot: timer.snapshot().summary(),
            },
        }
    }
}

/// One exported id with its metadata and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// The id.
    pub id: MetricId,
    /// The metadata shared by the id's name.
    pub metadata: Metadata,
    /// The value at read time.
    pub value: MetricValue,
}

/// A dump of a registry, sorted by id.
///
/// Each sample is consistent on its own; samples are read one after the
/// other, so two of them may straddle a concurrent measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryDump {
    /// The scope of the dumped registry.
    pub scope: RegistryScope,
    /// The samples, ordered by id.
    pub metrics: Vec<MetricSample>,
}

impl RegistryDump {
    /// Renders the dump as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Renders the dump as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{Counter, Gauge, MetricKind};
    use std::sync::Arc;

    #[test]
    fn test_read_counter_and_gauge() {
        let counter = Arc::new(Counter::new());
        counter.inc_by(4);
        assert_eq!(
            MetricValue::read(&Counter::wrap(counter)),
            MetricValue::Counter { count: 4 }
        );

        let gauge = Gauge::wrap(Arc::new(Gauge::new(|| 1.5)));
        assert_eq!(
            MetricValue::read(&gauge),
            MetricValue::Gauge {
                value: Number::Float(1.5)
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let value = MetricValue::Counter { count: 3 };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "counter");
        assert_eq!(json["count"], 3);
    }
}
