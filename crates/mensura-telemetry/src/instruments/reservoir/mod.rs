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

//! Bounded samples of observed values.

mod exponential;
mod uniform;

pub use exponential::ExponentiallyDecayingReservoir;
pub use uniform::UniformReservoir;

use super::snapshot::Snapshot;
use mensura_core::Clock;
use std::fmt::Debug;
use std::sync::Arc;

/// Number of samples kept by default, giving a 99.9% confidence level with a
/// 5% margin of error under a normal distribution.
pub const DEFAULT_SIZE: usize = 1028;

/// A bounded sample of the values fed to a histogram.
pub trait Reservoir: Send + Sync + Debug + 'static {
    /// The number of values currently held.
    fn size(&self) -> usize;

    /// Offers a new value.
    fn update(&self, value: i64);

    /// Copies the held values.
    fn snapshot(&self) -> Snapshot;
}

/// Selects the reservoir built for registry-created histograms and timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReservoirKind {
    /// Forward-decaying priority sampling that favours recent values.
    #[default]
    ExponentiallyDecaying,
    /// Algorithm R over the whole stream.
    Uniform,
}

impl ReservoirKind {
    /// Builds a reservoir of this kind with default parameters.
    pub fn build(self, clock: Arc<dyn Clock>) -> Box<dyn Reservoir> {
        match self {
            ReservoirKind::ExponentiallyDecaying => {
                Box::new(ExponentiallyDecayingReservoir::new(clock))
            }
            ReservoirKind::Uniform => Box::new(UniformReservoir::new()),
        }
    }
}
