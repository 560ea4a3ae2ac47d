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

//! # Mensura Telemetry
//!
//! In-process metrics: instruments, the registry that owns them by identity,
//! filtered typed views and serializable dumps for exporters.
//!
//! ```
//! use mensura_telemetry::{MetricsRegistry, filter};
//!
//! let registry = MetricsRegistry::new();
//! registry.counter("requests", &[]).unwrap().inc();
//! assert_eq!(registry.counters(filter::ALL).len(), 1);
//! ```

#![warn(missing_docs)]

pub mod filter;
pub mod instruments;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod utils;

pub use filter::MetricFilter;
pub use instruments::{
    ConcurrentGauge, Counter, Ewma, Gauge, GaugeProducer, Histogram, Meter, Metric, MetricKind,
    Reservoir, ReservoirKind, Snapshot, Timer,
};
pub use metrics::{MetricSample, MetricValue, MetricsRegistry, RegistryDump, RegistryScope};
pub use service::MetricsService;
pub use utils::timer::TimerContext;
