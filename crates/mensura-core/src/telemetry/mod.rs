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

//! Provides the foundational data structures for metric bookkeeping.
//!
//! This module defines the "common language" of the metrics system: how a
//! measurement stream is identified ([`MetricId`]), how it is described
//! ([`Metadata`]), what kinds of instruments exist ([`MetricType`]) and which
//! errors registration can surface. `mensura-telemetry` builds the registry
//! and the instruments on top of these contracts.

pub mod config;
pub mod metadata;
pub mod metrics;

pub use self::config::ConfigBag;
pub use self::metadata::{Metadata, MetadataBuilder, Origin};
pub use self::metrics::{MetricId, MetricType, MetricsError, MetricsResult, Number, Tag};
