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

//! Predicates selecting registered metrics.

use crate::instruments::Metric;
use mensura_core::MetricId;

/// Decides whether a registered metric is selected.
///
/// Closures over `(&MetricId, &Metric)` qualify; [`from_fn`] helps the
/// compiler infer their argument types.
pub trait MetricFilter: Send + Sync {
    /// Returns `true` if the metric is selected.
    fn matches(&self, id: &MetricId, metric: &Metric) -> bool;
}

impl<F> MetricFilter for F
where
    F: Fn(&MetricId, &Metric) -> bool + Send + Sync,
{
    fn matches(&self, id: &MetricId, metric: &Metric) -> bool {
        self(id, metric)
    }
}

/// Selects every metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl MetricFilter for All {
    fn matches(&self, _id: &MetricId, _metric: &Metric) -> bool {
        true
    }
}

/// The filter accepting everything.
pub const ALL: All = All;

/// Turns a closure into a filter.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&MetricId, &Metric) -> bool + Send + Sync,
{
    f
}

/// Selects metrics whose name starts with `prefix`.
pub fn name_starts_with(prefix: impl Into<String>) -> impl MetricFilter {
    let prefix = prefix.into();
    from_fn(move |id, _| id.name().starts_with(&prefix))
}

/// Selects metrics named exactly `name`.
pub fn name_equals(name: impl Into<String>) -> impl MetricFilter {
    let name = name.into();
    from_fn(move |id, _| id.name() == name)
}

/// Selects metrics carrying the tag `key=value`.
pub fn has_tag(key: impl Into<String>, value: impl Into<String>) -> impl MetricFilter {
    let key = key.into();
    let value = value.into();
    from_fn(move |id, _| id.tag(&key) == Some(value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{Counter, MetricKind};
    use std::sync::Arc;

    fn counter() -> Metric {
        Counter::wrap(Arc::new(Counter::new()))
    }

    #[test]
    fn test_all_accepts_everything() {
        assert!(ALL.matches(&MetricId::new("x"), &counter()));
    }

    #[test]
    fn test_name_filters() {
        let metric = counter();
        let id = MetricId::new("http.requests");
        assert!(name_starts_with("http").matches(&id, &metric));
        assert!(!name_starts_with("db").matches(&id, &metric));
        assert!(name_equals("http.requests").matches(&id, &metric));
        assert!(!name_equals("http").matches(&id, &metric));
    }

    #[test]
    fn test_tag_filter() {
        let metric = counter();
        let id = MetricId::new("http").with_tag("route", "/a");
        assert!(has_tag("route", "/a").matches(&id, &metric));
        assert!(!has_tag("route", "/b").matches(&id, &metric));
        assert!(!has_tag("zone", "/a").matches(&id, &metric));
    }

    #[test]
    fn test_closure_filter() {
        let only_counters = from_fn(|_, metric| matches!(metric, Metric::Counter(_)));
        assert!(only_counters.matches(&MetricId::new("c"), &counter()));
    }
}
