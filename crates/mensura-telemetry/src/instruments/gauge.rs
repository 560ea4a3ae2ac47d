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

//! Read-through gauge over an externally supplied producer.

use mensura_core::Number;
use std::fmt;

/// Produces the current reading of a gauge.
///
/// Closures returning anything convertible to [`Number`] qualify.
pub trait GaugeProducer: Send + Sync + 'static {
    /// Computes the current value.
    fn produce(&self) -> Number;
}

impl<F, T> GaugeProducer for F
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Into<Number>,
{
    fn produce(&self) -> Number {
        self().into()
    }
}

/// A gauge that invokes its producer on every read. Values are never cached.
pub struct Gauge {
    producer: Box<dyn GaugeProducer>,
}

impl Gauge {
    /// Wraps a producer.
    pub fn new<P: GaugeProducer>(producer: P) -> Self {
        Self {
            producer: Box::new(producer),
        }
    }

    /// Reads the gauge.
    pub fn value(&self) -> Number {
        self.producer.produce()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}
