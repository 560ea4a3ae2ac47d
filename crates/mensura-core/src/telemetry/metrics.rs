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

//! Identity and type definitions for registered metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// A single `key=value` dimension attached to a [`MetricId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// The tag key (e.g., "route").
    pub key: String,
    /// The tag value (e.g., "/users").
    pub value: String,
}

impl Tag {
    /// Creates a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for Tag {
    type Err = MetricsError;

    /// Parses a strict `key=value` segment. Neither side may be empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok(Tag::new(key, value)),
            _ => Err(MetricsError::MalformedGlobalTags(s.to_string())),
        }
    }
}

/// Deduplicates tags by key (last write wins) and sorts them by key.
pub fn normalize_tags<I>(tags: I) -> Vec<Tag>
where
    I: IntoIterator<Item = Tag>,
{
    let mut by_key = BTreeMap::new();
    for tag in tags {
        by_key.insert(tag.key, tag.value);
    }
    by_key
        .into_iter()
        .map(|(key, value)| Tag { key, value })
        .collect()
}

/// The identity of a single measurement stream.
///
/// A `MetricId` is composed of a name and a set of tags. Tags are always held
/// in normalized form (unique keys, sorted by key), so two ids built from the
/// same pairs in any order compare and hash equal. Ordering is by name first,
/// then by the normalized tag list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricId {
    name: String,
    tags: Vec<Tag>,
}

impl MetricId {
    /// Creates a new `MetricId` without tags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    /// Creates a new `MetricId` from a name and any sequence of tags.
    pub fn with_tags<I>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        Self {
            name: name.into(),
            tags: normalize_tags(tags),
        }
    }

    /// Adds a tag, returning a new `MetricId`.
    /// An existing tag with the same key is replaced.
    pub fn with_tag(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let Self { name, mut tags } = self;
        tags.push(Tag::new(key, value));
        Self {
            name,
            tags: normalize_tags(tags),
        }
    }

    /// Merges a base tag set underneath this id's own tags.
    ///
    /// Tags carried by the id win over `base` on key conflict.
    pub fn merged_with(&self, base: &[Tag]) -> Self {
        let tags = base.iter().chain(self.tags.iter()).cloned();
        Self {
            name: self.name.clone(),
            tags: normalize_tags(tags),
        }
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized tags, sorted by key.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Looks up the value of a tag by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.tags.is_empty() {
            return write!(f, "{}", self.name);
        }
        let tags_str = self
            .tags
            .iter()
            .map(Tag::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{}{{{}}}", self.name, tags_str)
    }
}

/// The fundamental kind of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// A monotonically increasing count.
    Counter,
    /// The number of parallel invocations, with per-minute max and min.
    ConcurrentGauge,
    /// A value sampled from an external producer on every read.
    Gauge,
    /// A distribution of values.
    Histogram,
    /// An event count with moving-average rates.
    Metered,
    /// A duration distribution combined with a rate.
    Timer,
    /// The result of an unparsable type name. Never stored.
    Invalid,
}

impl MetricType {
    /// Resolves a textual type name, yielding [`MetricType::Invalid`] for
    /// anything unknown. Matching is case-insensitive.
    pub fn from_name(name: &str) -> MetricType {
        match name.trim().to_ascii_lowercase().as_str() {
            "counter" => MetricType::Counter,
            "concurrent gauge" | "concurrent_gauge" | "concurrentgauge" => {
                MetricType::ConcurrentGauge
            }
            "gauge" => MetricType::Gauge,
            "histogram" => MetricType::Histogram,
            "meter" | "metered" => MetricType::Metered,
            "timer" => MetricType::Timer,
            _ => MetricType::Invalid,
        }
    }

    /// The canonical lowercase name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::ConcurrentGauge => "concurrent gauge",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Metered => "meter",
            MetricType::Timer => "timer",
            MetricType::Invalid => "invalid",
        }
    }
}

impl Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric reading produced by a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// An integral reading.
    Int(i64),
    /// A floating point reading.
    Float(f64),
}

impl Number {
    /// Returns the reading as an `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }

    /// Returns the reading as an `i64` if it is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(*v),
            Number::Float(_) => None,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! number_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Number {
            fn from(v: $t) -> Self {
                Number::Int(i64::from(v))
            }
        })*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Number::Float(v as f64), Number::Int)
    }
}

impl From<usize> for Number {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Number::Float(v as f64), Number::Int)
    }
}

impl From<f32> for Number {
    fn from(v: f32) -> Self {
        Number::Float(f64::from(v))
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// A specialized `Result` type for registry operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error surfaced synchronously by registration and lookup.
///
/// No error leaves the registry modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// The metadata carried no name.
    #[error("metric name must not be null or empty")]
    NullName,
    /// A metric with this name or id exists and may not be registered again.
    #[error("a metric with name {0} already exists")]
    DuplicateName(String),
    /// A metric with this name exists with another type, or the metadata
    /// disagrees with the supplied instrument.
    #[error("metric {name} is of type {found}, expected {expected}")]
    TypeMismatch {
        /// The name being registered.
        name: String,
        /// The type requested by the caller.
        expected: MetricType,
        /// The type already bound to the name.
        found: MetricType,
    },
    /// The reusable flag differs from the previous registration.
    #[error("reusable flag of metric {0} differs from previous usage")]
    ReusableMismatch(String),
    /// Gauges cannot be created on demand since the registry has no producer.
    #[error("gauge {0} was not registered and cannot be created implicitly")]
    GaugeAutoCreate(String),
    /// A global tag segment did not have the `key=value` form.
    #[error("malformed global tag segment: '{0}'")]
    MalformedGlobalTags(String),
    /// An impossible state, such as a request for an `Invalid` instrument.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
