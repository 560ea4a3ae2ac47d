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

//! Instrument primitives.
//!
//! Instruments accumulate measurements of one kind. They are interior-mutable
//! and know nothing about the registry; [`Metric`] is the tagged variant the
//! registry stores them under.

pub mod concurrent_gauge;
pub mod counter;
pub mod ewma;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod reservoir;
pub mod snapshot;
pub mod timer;

pub use concurrent_gauge::ConcurrentGauge;
pub use counter::Counter;
pub use ewma::Ewma;
pub use gauge::{Gauge, GaugeProducer};
pub use histogram::Histogram;
pub use meter::Meter;
pub use reservoir::{ExponentiallyDecayingReservoir, Reservoir, ReservoirKind, UniformReservoir};
pub use snapshot::{Snapshot, SnapshotSummary};
pub use timer::Timer;

use mensura_core::MetricType;
use std::sync::Arc;

/// A registered instrument of any kind.
///
/// Cloning a `Metric` shares the underlying instrument, so clones observe
/// every later measurement.
#[derive(Debug, Clone)]
pub enum Metric {
    /// A [`Counter`].
    Counter(Arc<Counter>),
    /// A [`ConcurrentGauge`].
    ConcurrentGauge(Arc<ConcurrentGauge>),
    /// A [`Gauge`].
    Gauge(Arc<Gauge>),
    /// A [`Histogram`].
    Histogram(Arc<Histogram>),
    /// A [`Meter`].
    Meter(Arc<Meter>),
    /// A [`Timer`].
    Timer(Arc<Timer>),
}

impl Metric {
    /// Returns the [`MetricType`] corresponding to this instrument.
    pub fn metric_type(&self) -> MetricType {
        match self {
            Metric::Counter(_) => MetricType::Counter,
            Metric::ConcurrentGauge(_) => MetricType::ConcurrentGauge,
            Metric::Gauge(_) => MetricType::Gauge,
            Metric::Histogram(_) => MetricType::Histogram,
            Metric::Meter(_) => MetricType::Metered,
            Metric::Timer(_) => MetricType::Timer,
        }
    }

    /// Returns `true` if both handles point to the same instrument.
    pub fn same_instrument(&self, other: &Metric) -> bool {
        match (self, other) {
            (Metric::Counter(a), Metric::Counter(b)) => Arc::ptr_eq(a, b),
            (Metric::ConcurrentGauge(a), Metric::ConcurrentGauge(b)) => Arc::ptr_eq(a, b),
            (Metric::Gauge(a), Metric::Gauge(b)) => Arc::ptr_eq(a, b),
            (Metric::Histogram(a), Metric::Histogram(b)) => Arc::ptr_eq(a, b),
            (Metric::Meter(a), Metric::Meter(b)) => Arc::ptr_eq(a, b),
            (Metric::Timer(a), Metric::Timer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Narrows to a concrete instrument kind.
    pub fn downcast<K: MetricKind>(&self) -> Option<Arc<K>> {
        K::narrow(self)
    }
}

/// Binds a concrete instrument type to its [`Metric`] variant.
pub trait MetricKind: Send + Sync + Sized + 'static {
    /// The type reported in metadata.
    const TYPE: MetricType;

    /// Wraps the instrument into its variant.
    fn wrap(instrument: Arc<Self>) -> Metric;

    /// Returns the instrument if `metric` holds this kind.
    fn narrow(metric: &Metric) -> Option<Arc<Self>>;
}

macro_rules! metric_kind {
    ($kind:ident, $variant:ident, $ty:expr) => {
        impl MetricKind for $kind {
            const TYPE: MetricType = $ty;

            fn wrap(instrument: Arc<Self>) -> Metric {
                Metric::$variant(instrument)
            }

            fn narrow(metric: &Metric) -> Option<Arc<Self>> {
                match metric {
                    Metric::$variant(instrument) => Some(instrument.clone()),
                    _ => None,
                }
            }
        }

        impl From<Arc<$kind>> for Metric {
            fn from(instrument: Arc<$kind>) -> Self {
                Metric::$variant(instrument)
            }
        }
    };
}

metric_kind!(Counter, Counter, MetricType::Counter);
metric_kind!(ConcurrentGauge, ConcurrentGauge, MetricType::ConcurrentGauge);
metric_kind!(Gauge, Gauge, MetricType::Gauge);
metric_kind!(Histogram, Histogram, MetricType::Histogram);
metric_kind!(Meter, Meter, MetricType::Metered);
metric_kind!(Timer, Timer, MetricType::Timer);
