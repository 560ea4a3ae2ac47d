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

//! Descriptive metadata shared by every id registered under one name.

use super::metrics::MetricType;
use serde::{Deserialize, Serialize};

/// Unit reported when the caller does not supply one.
pub const UNIT_NONE: &str = "none";

/// Unit reported for timers.
pub const UNIT_NANOSECONDS: &str = "nanoseconds";

/// Where a registration came from.
///
/// Origins are only consulted when a name is registered a second time: two
/// registrations made through injection points are always compatible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Registered directly through the registry API.
    #[default]
    Programmatic,
    /// Registered by a framework for an injected member.
    InjectionPoint(String),
    /// Registered for an annotated method.
    Annotation {
        /// Declaring type of the annotated method.
        class: String,
        /// The annotated method.
        method: String,
    },
}

impl Origin {
    /// Returns `true` if a second registration with `other` may resolve to
    /// the instrument registered with `self`, regardless of reusability.
    ///
    /// Programmatic registrations never qualify.
    pub fn is_compatible_with(&self, other: &Origin) -> bool {
        match (self, other) {
            (Origin::Programmatic, _) | (_, Origin::Programmatic) => false,
            (Origin::InjectionPoint(_), Origin::InjectionPoint(_)) => true,
            (left, right) => left == right,
        }
    }
}

/// Descriptive, static metadata about a metric name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// The metric name this metadata is bound to.
    pub name: String,
    /// The kind of instrument registered under the name.
    pub metric_type: MetricType,
    /// The unit of measurement, transported verbatim to exporters.
    pub unit: String,
    /// A human-readable description of what the metric measures.
    pub description: Option<String>,
    /// A human-readable name; [`Metadata::display_name`] falls back to `name`.
    pub display_name: Option<String>,
    /// Whether a second registration may resolve to the existing instrument.
    pub reusable: bool,
    /// Where the registration came from.
    pub origin: Origin,
}

impl Metadata {
    /// Starts building metadata for `name`.
    pub fn builder(name: impl Into<String>) -> MetadataBuilder {
        MetadataBuilder::new(name)
    }

    /// Creates plain programmatic metadata for `name` and `metric_type`.
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self::builder(name).with_type(metric_type).build()
    }

    /// Fills in the type of metadata built without one.
    ///
    /// Metadata that already carries a type is returned unchanged. A timer
    /// that only has the default unit reports nanoseconds.
    pub fn with_resolved_type(mut self, metric_type: MetricType) -> Self {
        if self.metric_type != MetricType::Invalid {
            return self;
        }
        self.metric_type = metric_type;
        if metric_type == MetricType::Timer && self.unit == UNIT_NONE {
            self.unit = UNIT_NANOSECONDS.to_string();
        }
        self
    }

    /// The display name, or the metric name if none was given.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Builder for [`Metadata`].
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    name: String,
    metric_type: MetricType,
    unit: Option<String>,
    description: Option<String>,
    display_name: Option<String>,
    reusable: bool,
    origin: Origin,
}

impl MetadataBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Invalid,
            unit: None,
            description: None,
            display_name: None,
            reusable: false,
            origin: Origin::Programmatic,
        }
    }

    /// Sets the metric type. Left unset, the type is [`MetricType::Invalid`]
    /// and the registry resolves it from the instrument.
    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Marks the metric as reusable.
    pub fn reusable(mut self) -> Self {
        self.reusable = true;
        self
    }

    /// Marks the metric as not reusable (the default).
    pub fn not_reusable(mut self) -> Self {
        self.reusable = false;
        self
    }

    /// Sets the registration origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Builds the metadata. Timers default to nanoseconds, everything else
    /// to `"none"`.
    pub fn build(self) -> Metadata {
        let unit = self.unit.unwrap_or_else(|| match self.metric_type {
            MetricType::Timer => UNIT_NANOSECONDS.to_string(),
            _ => UNIT_NONE.to_string(),
        });
        Metadata {
            name: self.name,
            metric_type: self.metric_type,
            unit,
            description: self.description,
            display_name: self.display_name,
            reusable: self.reusable,
            origin: self.origin,
        }
    }
}
