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

//! Registry for managing metrics.

use crate::filter::{MetricFilter, ALL};
use crate::instruments::{
    ConcurrentGauge, Counter, Gauge, Histogram, Meter, Metric, MetricKind, ReservoirKind, Timer,
};
use crate::metrics::export::{MetricSample, MetricValue, RegistryDump};
use crate::storage::{BackendStats, InMemoryBackend, MetricTable};
use mensura_core::{
    Clock, ConfigBag, Metadata, MetricId, MetricType, MetricsError, MetricsResult, SystemClock,
    Tag,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::sync::Arc;

/// Which part of the application a registry serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryScope {
    /// Metrics defined by the application.
    #[default]
    Application,
    /// Metrics every runtime is expected to provide.
    Base,
    /// Metrics specific to the runtime vendor.
    Vendor,
}

impl RegistryScope {
    /// All scopes, in a fixed order.
    pub const ALL: [RegistryScope; 3] = [
        RegistryScope::Application,
        RegistryScope::Base,
        RegistryScope::Vendor,
    ];

    /// The lowercase scope name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryScope::Application => "application",
            RegistryScope::Base => "base",
            RegistryScope::Vendor => "vendor",
        }
    }
}

impl Display for RegistryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Central registry of named instruments.
///
/// The registry owns every registered instrument together with the metadata
/// of its name, enforces the identity and compatibility rules on
/// (re-)registration and hands out read-consistent views for export.
/// Registration and removal are serialized by a single writer lock; reads
/// copy what they need under the read lock and never see a half-finished
/// registration.
#[derive(Debug)]
pub struct MetricsRegistry {
    scope: RegistryScope,
    backend: InMemoryBackend,
    global_tags: Vec<Tag>,
    clock: Arc<dyn Clock>,
    reservoir: ReservoirKind,
}

impl MetricsRegistry {
    /// Create a new registry without global tags
    pub fn new() -> Self {
        Self {
            scope: RegistryScope::default(),
            backend: InMemoryBackend::new(),
            global_tags: Vec::new(),
            clock: Arc::new(SystemClock::new()),
            reservoir: ReservoirKind::default(),
        }
    }

    /// Create a new registry reading its global tags from `config`.
    ///
    /// Fails with [`MetricsError::MalformedGlobalTags`] if a tag segment is
    /// not a `key=value` pair.
    pub fn from_config(config: &ConfigBag) -> MetricsResult<Self> {
        let global_tags = config.global_tags()?;
        Ok(Self {
            global_tags,
            ..Self::new()
        })
    }

    /// Use `clock` for every instrument the registry creates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `reservoir` for the histograms and timers the registry creates.
    pub fn with_reservoir(mut self, reservoir: ReservoirKind) -> Self {
        self.reservoir = reservoir;
        self
    }

    /// Set the scope reported by this registry.
    pub fn with_scope(mut self, scope: RegistryScope) -> Self {
        self.scope = scope;
        self
    }

    /// The scope of this registry.
    pub fn scope(&self) -> RegistryScope {
        self.scope
    }

    /// The tags merged into every registered id.
    pub fn global_tags(&self) -> &[Tag] {
        &self.global_tags
    }

    /// The clock handed to created instruments.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    fn metric_id(&self, name: &str, tags: &[Tag]) -> MetricId {
        MetricId::with_tags(name, tags.iter().cloned()).merged_with(&self.global_tags)
    }

    // --- Registration ---

    /// Register `instrument` under `name` with default metadata.
    ///
    /// Fails with [`MetricsError::DuplicateName`] if any id with this name is
    /// already registered.
    pub fn register<K: MetricKind>(
        &self,
        name: &str,
        instrument: Arc<K>,
    ) -> MetricsResult<Arc<K>> {
        let metric = self.register_metric(name, K::wrap(instrument))?;
        narrow(&metric, name)
    }

    /// Untyped form of [`MetricsRegistry::register`].
    pub fn register_metric(&self, name: &str, metric: Metric) -> MetricsResult<Metric> {
        if name.is_empty() {
            return Err(MetricsError::NullName);
        }
        let metadata = Metadata::new(name, metric.metric_type());
        let id = self.metric_id(name, &[]);

        let mut table = self.backend.write();
        if table.contains_name(name) {
            return Err(MetricsError::DuplicateName(name.to_string()));
        }
        log::info!("Register metric [id: {id}, type: {}]", metadata.metric_type);
        table.insert(id, metric.clone(), metadata);
        Ok(metric)
    }

    /// Register `instrument` with explicit metadata and tags.
    ///
    /// Metadata without a type takes the instrument's type. If the id is
    /// already registered and the metadata allows reuse, the stored
    /// instrument is returned and `instrument` is discarded.
    pub fn register_with_metadata<K: MetricKind>(
        &self,
        metadata: Metadata,
        instrument: Arc<K>,
        tags: &[Tag],
    ) -> MetricsResult<Arc<K>> {
        let name = metadata.name.clone();
        let metric = self.register_metric_with_metadata(metadata, K::wrap(instrument), tags)?;
        narrow(&metric, &name)
    }

    /// Untyped form of [`MetricsRegistry::register_with_metadata`].
    pub fn register_metric_with_metadata(
        &self,
        metadata: Metadata,
        metric: Metric,
        tags: &[Tag],
    ) -> MetricsResult<Metric> {
        if metadata.name.is_empty() {
            return Err(MetricsError::NullName);
        }
        let metadata = normalize(metadata.with_resolved_type(metric.metric_type()));
        if metadata.metric_type != metric.metric_type() {
            return Err(MetricsError::TypeMismatch {
                name: metadata.name,
                expected: metadata.metric_type,
                found: metric.metric_type(),
            });
        }
        let id = self.metric_id(&metadata.name, tags);

        let mut table = self.backend.write();
        resolve(&mut table, id, metadata, || Ok(metric))
    }

    /// Return the instrument registered under `metadata` and `tags`, creating
    /// a default instrument of `metric_type` if there is none.
    ///
    /// Gauges cannot be created this way since the registry has no producer
    /// for them.
    pub fn get_or_create(
        &self,
        metric_type: MetricType,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Metric> {
        if metadata.name.is_empty() {
            return Err(MetricsError::NullName);
        }
        match metric_type {
            MetricType::Gauge => return Err(MetricsError::GaugeAutoCreate(metadata.name)),
            MetricType::Invalid => {
                return Err(MetricsError::InternalInvariant(format!(
                    "cannot create metric {} of invalid type",
                    metadata.name
                )))
            }
            _ => {}
        }
        log::debug!("Get metric [name: {}, type: {metric_type}]", metadata.name);

        let metadata = metadata.with_resolved_type(metric_type);
        if metadata.metric_type != metric_type {
            return Err(MetricsError::TypeMismatch {
                name: metadata.name,
                expected: metric_type,
                found: metadata.metric_type,
            });
        }
        let id = self.metric_id(&metadata.name, tags);

        {
            let table = self.backend.read();
            if let (Some(previous), Some(existing)) =
                (table.metadata(id.name()), table.get(&id))
            {
                check_type(previous, &metadata)?;
                return reuse(previous, &metadata, existing);
            }
        }

        let mut table = self.backend.write();
        resolve(&mut table, id, metadata, || self.build_default(metric_type))
    }

    fn get_or_create_kind<K: MetricKind>(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<K>> {
        let name = metadata.name.clone();
        let metric = self.get_or_create(K::TYPE, metadata, tags)?;
        narrow(&metric, &name)
    }

    fn build_default(&self, metric_type: MetricType) -> MetricsResult<Metric> {
        let clock = self.clock.clone();
        let metric = match metric_type {
            MetricType::Counter => Counter::wrap(Arc::new(Counter::new())),
            MetricType::ConcurrentGauge => {
                ConcurrentGauge::wrap(Arc::new(ConcurrentGauge::new(clock)))
            }
            MetricType::Histogram => {
                Histogram::wrap(Arc::new(Histogram::new(self.reservoir.build(clock))))
            }
            MetricType::Metered => Meter::wrap(Arc::new(Meter::new(clock))),
            MetricType::Timer => {
                Timer::wrap(Arc::new(Timer::new(self.reservoir.build(clock.clone()), clock)))
            }
            MetricType::Gauge => return Err(MetricsError::GaugeAutoCreate(String::new())),
            MetricType::Invalid => {
                return Err(MetricsError::InternalInvariant(
                    "no instrument for invalid type".to_string(),
                ))
            }
        };
        Ok(metric)
    }

    /// Get or create the counter `name` with `tags`.
    pub fn counter(&self, name: &str, tags: &[Tag]) -> MetricsResult<Arc<Counter>> {
        self.counter_with_metadata(Metadata::new(name, MetricType::Counter), tags)
    }

    /// Get or create a counter described by `metadata`.
    pub fn counter_with_metadata(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<Counter>> {
        self.get_or_create_kind(metadata, tags)
    }

    /// Get or create the concurrent gauge `name` with `tags`.
    pub fn concurrent_gauge(
        &self,
        name: &str,
        tags: &[Tag],
    ) -> MetricsResult<Arc<ConcurrentGauge>> {
        let metadata = Metadata::new(name, MetricType::ConcurrentGauge);
        self.concurrent_gauge_with_metadata(metadata, tags)
    }

    /// Get or create a concurrent gauge described by `metadata`.
    pub fn concurrent_gauge_with_metadata(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<ConcurrentGauge>> {
        self.get_or_create_kind(metadata, tags)
    }

    /// Get or create the histogram `name` with `tags`.
    pub fn histogram(&self, name: &str, tags: &[Tag]) -> MetricsResult<Arc<Histogram>> {
        self.histogram_with_metadata(Metadata::new(name, MetricType::Histogram), tags)
    }

    /// Get or create a histogram described by `metadata`.
    pub fn histogram_with_metadata(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<Histogram>> {
        self.get_or_create_kind(metadata, tags)
    }

    /// Get or create the meter `name` with `tags`.
    pub fn meter(&self, name: &str, tags: &[Tag]) -> MetricsResult<Arc<Meter>> {
        self.meter_with_metadata(Metadata::new(name, MetricType::Metered), tags)
    }

    /// Get or create a meter described by `metadata`.
    pub fn meter_with_metadata(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<Meter>> {
        self.get_or_create_kind(metadata, tags)
    }

    /// Get or create the timer `name` with `tags`.
    pub fn timer(&self, name: &str, tags: &[Tag]) -> MetricsResult<Arc<Timer>> {
        self.timer_with_metadata(Metadata::new(name, MetricType::Timer), tags)
    }

    /// Get or create a timer described by `metadata`.
    pub fn timer_with_metadata(
        &self,
        metadata: Metadata,
        tags: &[Tag],
    ) -> MetricsResult<Arc<Timer>> {
        self.get_or_create_kind(metadata, tags)
    }

    // --- Removal ---

    /// Remove every id named `name` along with the name's metadata.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.backend.write().remove_name(name);
        if removed > 0 {
            log::debug!("Remove metric [name: {name}, ids: {removed}]");
        }
        removed > 0
    }

    /// Remove a single id. The name's metadata goes with its last id.
    pub fn remove_id(&self, id: &MetricId) -> bool {
        let removed = self.backend.write().remove_id(id).is_some();
        if removed {
            log::debug!("Remove metric [id: {id}]");
        }
        removed
    }

    /// Remove every metric selected by `filter`, returning how many were
    /// removed.
    ///
    /// The filter runs over a snapshot of the bindings taken up front; a
    /// binding replaced in the meantime is left alone.
    pub fn remove_matching(&self, filter: impl MetricFilter) -> usize {
        let selected: Vec<_> = self
            .bindings()
            .into_iter()
            .filter(|(id, metric)| filter.matches(id, metric))
            .collect();
        if selected.is_empty() {
            return 0;
        }

        let mut table = self.backend.write();
        let mut removed = 0;
        for (id, metric) in selected {
            let unchanged = table
                .get(&id)
                .is_some_and(|current| current.same_instrument(&metric));
            if unchanged {
                table.remove_id(&id);
                log::debug!("Remove metric [id: {id}]");
                removed += 1;
            }
        }
        removed
    }

    // --- Queries ---

    fn bindings(&self) -> Vec<(MetricId, Metric)> {
        self.backend
            .read()
            .iter()
            .map(|(id, metric)| (id.clone(), metric.clone()))
            .collect()
    }

    /// The registered names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.backend
            .read()
            .ids()
            .map(|id| id.name().to_string())
            .collect()
    }

    /// The registered ids, sorted by name then tags.
    pub fn ids(&self) -> BTreeSet<MetricId> {
        self.backend.read().ids().cloned().collect()
    }

    /// The instrument registered under `id`.
    pub fn get(&self, id: &MetricId) -> Option<Metric> {
        self.backend.read().get(id).cloned()
    }

    /// The metadata bound to `name`.
    pub fn metadata_by_name(&self, name: &str) -> Option<Metadata> {
        self.backend.read().metadata(name).cloned()
    }

    /// A copy of all metadata keyed by name.
    pub fn metadata(&self) -> HashMap<String, Metadata> {
        self.backend
            .read()
            .metadata_entries()
            .map(|(name, metadata)| (name.to_string(), metadata.clone()))
            .collect()
    }

    /// A copy of the current bindings. The instruments are shared, so they
    /// keep reflecting later measurements.
    pub fn metrics(&self) -> HashMap<MetricId, Metric> {
        self.bindings().into_iter().collect()
    }

    /// The instruments of kind `K` selected by `filter`, sorted by id.
    ///
    /// Instruments of other kinds are skipped before the filter runs.
    pub fn metrics_of_type<K: MetricKind>(
        &self,
        filter: impl MetricFilter,
    ) -> BTreeMap<MetricId, Arc<K>> {
        self.bindings()
            .into_iter()
            .filter_map(|(id, metric)| {
                let instrument = K::narrow(&metric)?;
                filter.matches(&id, &metric).then_some((id, instrument))
            })
            .collect()
    }

    /// Counters selected by `filter`.
    pub fn counters(&self, filter: impl MetricFilter) -> BTreeMap<MetricId, Arc<Counter>> {
        self.metrics_of_type(filter)
    }

    /// Concurrent gauges selected by `filter`.
    pub fn concurrent_gauges(
        &self,
        filter: impl MetricFilter,
    ) -> BTreeMap<MetricId, Arc<ConcurrentGauge>> {
        self.metrics_of_type(filter)
    }

    /// Gauges selected by `filter`.
    pub fn gauges(&self, filter: impl MetricFilter) -> BTreeMap<MetricId, Arc<Gauge>> {
        self.metrics_of_type(filter)
    }

    /// Histograms selected by `filter`.
    pub fn histograms(&self, filter: impl MetricFilter) -> BTreeMap<MetricId, Arc<Histogram>> {
        self.metrics_of_type(filter)
    }

    /// Meters selected by `filter`.
    pub fn meters(&self, filter: impl MetricFilter) -> BTreeMap<MetricId, Arc<Meter>> {
        self.metrics_of_type(filter)
    }

    /// Timers selected by `filter`.
    pub fn timers(&self, filter: impl MetricFilter) -> BTreeMap<MetricId, Arc<Timer>> {
        self.metrics_of_type(filter)
    }

    /// Reads every metric selected by `filter` into a serializable dump.
    pub fn export(&self, filter: impl MetricFilter) -> RegistryDump {
        let entries: Vec<(MetricId, Metric, Metadata)> = {
            let table = self.backend.read();
            table
                .iter()
                .filter_map(|(id, metric)| {
                    let metadata = table.metadata(id.name())?;
                    Some((id.clone(), metric.clone(), metadata.clone()))
                })
                .collect()
        };

        let mut metrics: Vec<MetricSample> = entries
            .into_iter()
            .filter(|(id, metric, _)| filter.matches(id, metric))
            .map(|(id, metric, metadata)| MetricSample {
                value: MetricValue::read(&metric),
                id,
                metadata,
            })
            .collect();
        metrics.sort_by(|a, b| a.id.cmp(&b.id));

        RegistryDump {
            scope: self.scope,
            metrics,
        }
    }

    /// Reads every metric into a serializable dump.
    pub fn export_all(&self) -> RegistryDump {
        self.export(ALL)
    }

    /// The number of registered ids.
    pub fn len(&self) -> usize {
        self.backend.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.backend.read().is_empty()
    }

    /// Per-type counts of the registered ids.
    pub fn stats(&self) -> BackendStats {
        self.backend.get_stats()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn narrow<K: MetricKind>(metric: &Metric, name: &str) -> MetricsResult<Arc<K>> {
    K::narrow(metric).ok_or_else(|| {
        MetricsError::InternalInvariant(format!(
            "metric {name} is stored as {} but resolved as {}",
            metric.metric_type(),
            K::TYPE
        ))
    })
}

// Gauges never resolve to an existing instrument.
fn normalize(mut metadata: Metadata) -> Metadata {
    if metadata.metric_type == MetricType::Gauge && metadata.reusable {
        log::warn!(
            "Gauge {} cannot be reusable, registering it as not reusable",
            metadata.name
        );
        metadata.reusable = false;
    }
    metadata
}

fn check_type(previous: &Metadata, metadata: &Metadata) -> MetricsResult<()> {
    if previous.metric_type != metadata.metric_type {
        return Err(MetricsError::TypeMismatch {
            name: metadata.name.clone(),
            expected: metadata.metric_type,
            found: previous.metric_type,
        });
    }
    Ok(())
}

// Decides whether a registration of an already stored id resolves to the
// stored instrument.
fn reuse(previous: &Metadata, metadata: &Metadata, existing: &Metric) -> MetricsResult<Metric> {
    if metadata.metric_type == MetricType::Gauge {
        return Err(MetricsError::DuplicateName(metadata.name.clone()));
    }
    if previous.origin.is_compatible_with(&metadata.origin) {
        return Ok(existing.clone());
    }
    if previous.reusable != metadata.reusable {
        return Err(MetricsError::ReusableMismatch(metadata.name.clone()));
    }
    if !previous.reusable {
        return Err(MetricsError::DuplicateName(metadata.name.clone()));
    }
    Ok(existing.clone())
}

fn resolve<F>(
    table: &mut MetricTable,
    id: MetricId,
    metadata: Metadata,
    create: F,
) -> MetricsResult<Metric>
where
    F: FnOnce() -> MetricsResult<Metric>,
{
    if let Some(previous) = table.metadata(id.name()) {
        check_type(previous, &metadata)?;
        if let Some(existing) = table.get(&id) {
            return reuse(previous, &metadata, existing);
        }
        // A new tag combination under a known name shares its metadata. This
        // holds for gauges too: only an identical id is rejected.
        if !previous.origin.is_compatible_with(&metadata.origin)
            && previous.reusable != metadata.reusable
        {
            return Err(MetricsError::ReusableMismatch(metadata.name));
        }
    }

    let metric = create()?;
    log::info!("Register metric [id: {id}, type: {}]", metadata.metric_type);
    table.insert(id, metric.clone(), metadata);
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter;
    use mensura_core::{ManualClock, Origin};

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.scope(), RegistryScope::Application);
        assert!(registry.global_tags().is_empty());
    }

    #[test]
    fn test_malformed_global_tags_fail_construction() {
        let config = ConfigBag::new().with("mp.metrics.tags", "a=1,oops");
        assert!(matches!(
            MetricsRegistry::from_config(&config),
            Err(MetricsError::MalformedGlobalTags(segment)) if segment == "oops"
        ));
    }

    #[test]
    fn test_counter_registration_and_operations() {
        let registry = MetricsRegistry::new();
        let counter = registry.counter("frame_count", &[]).unwrap();

        counter.inc();
        counter.inc_by(5);
        assert_eq!(counter.count(), 6);

        // Verify it's stored in the registry
        let stored = registry.get(&MetricId::new("frame_count")).unwrap();
        assert_eq!(stored.downcast::<Counter>().unwrap().count(), 6);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.metadata_by_name("frame_count").unwrap().metric_type,
            MetricType::Counter
        );
    }

    #[test]
    fn test_register_by_name_rejects_duplicates() {
        let registry = MetricsRegistry::new();
        let first = Arc::new(Counter::new());
        registry.register("a", first.clone()).unwrap();

        let err = registry.register("a", Arc::new(Counter::new())).unwrap_err();
        assert_eq!(err, MetricsError::DuplicateName("a".to_string()));

        let meter = Arc::new(Meter::new(registry.clock()));
        let err = registry.register("a", meter).unwrap_err();
        assert_eq!(err, MetricsError::DuplicateName("a".to_string()));

        let stored = registry.counters(ALL);
        assert!(Arc::ptr_eq(&stored[&MetricId::new("a")], &first));
    }

    #[test]
    fn test_register_with_untyped_metadata_takes_instrument_type() {
        let registry = MetricsRegistry::new();
        let metadata = Metadata::builder("latency").build();
        let reservoir = ReservoirKind::Uniform.build(registry.clock());
        let timer = Arc::new(Timer::new(reservoir, registry.clock()));
        registry
            .register_with_metadata(metadata, timer, &[])
            .unwrap();
        let stored = registry.metadata_by_name("latency").unwrap();
        assert_eq!(stored.metric_type, MetricType::Timer);
        assert_eq!(stored.unit, "nanoseconds");
    }

    #[test]
    fn test_metadata_disagreeing_with_instrument() {
        let registry = MetricsRegistry::new();
        let metadata = Metadata::new("hits", MetricType::Metered);
        let err = registry
            .register_with_metadata(metadata, Arc::new(Counter::new()), &[])
            .unwrap_err();
        assert!(matches!(err, MetricsError::TypeMismatch { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reusable_mismatch() {
        let registry = MetricsRegistry::new();
        let reusable = Metadata::builder("jobs")
            .with_type(MetricType::Counter)
            .reusable()
            .build();
        registry.counter_with_metadata(reusable, &[]).unwrap();

        let err = registry.counter("jobs", &[]).unwrap_err();
        assert_eq!(err, MetricsError::ReusableMismatch("jobs".to_string()));
    }

    #[test]
    fn test_tagged_ids_share_metadata() {
        let registry = MetricsRegistry::new();
        let a = registry.counter("http", &[Tag::new("route", "/a")]).unwrap();
        let b = registry.counter("http", &[Tag::new("route", "/b")]).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().len(), 1);

        let err = registry.meter("http", &[Tag::new("route", "/c")]).unwrap_err();
        assert!(matches!(err, MetricsError::TypeMismatch { .. }));
    }

    #[test]
    fn test_new_tags_require_matching_reusability() {
        let registry = MetricsRegistry::new();
        registry.counter("http", &[Tag::new("route", "/a")]).unwrap();

        let reusable = Metadata::builder("http")
            .with_type(MetricType::Counter)
            .reusable()
            .build();
        let err = registry
            .counter_with_metadata(reusable, &[Tag::new("route", "/b")])
            .unwrap_err();
        assert_eq!(err, MetricsError::ReusableMismatch("http".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_new_tags_with_injection_points_share_metadata() {
        let registry = MetricsRegistry::new();
        let first = Metadata::builder("http")
            .with_type(MetricType::Counter)
            .with_origin(Origin::InjectionPoint("A.requests".into()))
            .build();
        let second = Metadata::builder("http")
            .with_type(MetricType::Counter)
            .with_origin(Origin::InjectionPoint("B.requests".into()))
            .with_description("ignored")
            .reusable()
            .build();

        let a = registry
            .counter_with_metadata(first.clone(), &[Tag::new("route", "/a")])
            .unwrap();
        let b = registry
            .counter_with_metadata(second, &[Tag::new("route", "/b")])
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.metadata_by_name("http").unwrap(), first);
    }

    #[test]
    fn test_tagged_gauges_under_one_name() {
        let registry = MetricsRegistry::new();
        let gauge = |value: i64| Arc::new(Gauge::new(move || value));
        let metadata = Metadata::new("pool.size", MetricType::Gauge);

        registry
            .register_with_metadata(metadata.clone(), gauge(1), &[Tag::new("pool", "a")])
            .unwrap();
        registry
            .register_with_metadata(metadata.clone(), gauge(2), &[Tag::new("pool", "b")])
            .unwrap();
        assert_eq!(registry.gauges(ALL).len(), 2);

        let err = registry
            .register_with_metadata(metadata, gauge(3), &[Tag::new("pool", "a")])
            .unwrap_err();
        assert_eq!(err, MetricsError::DuplicateName("pool.size".to_string()));
    }

    #[test]
    fn test_get_or_create_gauge_and_invalid() {
        let registry = MetricsRegistry::new();
        let err = registry
            .get_or_create(MetricType::Gauge, Metadata::builder("g").build(), &[])
            .unwrap_err();
        assert_eq!(err, MetricsError::GaugeAutoCreate("g".to_string()));

        let err = registry
            .get_or_create(MetricType::Invalid, Metadata::builder("x").build(), &[])
            .unwrap_err();
        assert!(matches!(err, MetricsError::InternalInvariant(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_null_name() {
        let registry = MetricsRegistry::new();
        let unnamed = Metadata::builder("").build();
        assert_eq!(
            registry
                .get_or_create(MetricType::Gauge, unnamed.clone(), &[])
                .unwrap_err(),
            MetricsError::NullName
        );
        assert_eq!(
            registry
                .get_or_create(MetricType::Invalid, unnamed, &[])
                .unwrap_err(),
            MetricsError::NullName
        );
        assert_eq!(registry.counter("", &[]).unwrap_err(), MetricsError::NullName);
        assert_eq!(
            registry.register("", Arc::new(Counter::new())).unwrap_err(),
            MetricsError::NullName
        );
    }

    #[test]
    fn test_gauge_registered_as_reusable_is_downgraded() {
        let registry = MetricsRegistry::new();
        let metadata = Metadata::builder("temperature")
            .with_type(MetricType::Gauge)
            .reusable()
            .build();
        registry
            .register_with_metadata(metadata, Arc::new(Gauge::new(|| 21)), &[])
            .unwrap();
        assert!(!registry.metadata_by_name("temperature").unwrap().reusable);
    }

    #[test]
    fn test_annotation_origins_must_match() {
        let registry = MetricsRegistry::new();
        let origin = Origin::Annotation {
            class: "Shop".into(),
            method: "buy".into(),
        };
        let metadata = Metadata::builder("purchases")
            .with_type(MetricType::Counter)
            .with_origin(origin.clone())
            .build();
        let first = registry.counter_with_metadata(metadata.clone(), &[]).unwrap();
        let again = registry.counter_with_metadata(metadata, &[]).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let other = Metadata::builder("purchases")
            .with_type(MetricType::Counter)
            .with_origin(Origin::Annotation {
                class: "Shop".into(),
                method: "refund".into(),
            })
            .build();
        assert_eq!(
            registry.counter_with_metadata(other, &[]).unwrap_err(),
            MetricsError::DuplicateName("purchases".to_string())
        );
    }

    #[test]
    fn test_remove_id_and_name() {
        let registry = MetricsRegistry::new();
        registry.counter("a", &[Tag::new("k", "1")]).unwrap();
        registry.counter("a", &[Tag::new("k", "2")]).unwrap();

        assert!(registry.remove_id(&MetricId::new("a").with_tag("k", "1")));
        assert!(!registry.remove_id(&MetricId::new("a").with_tag("k", "1")));
        assert!(registry.metadata_by_name("a").is_some());

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.metadata_by_name("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_matching() {
        let registry = MetricsRegistry::new();
        for name in ["db.reads", "db.writes", "http.requests"] {
            registry.counter(name, &[]).unwrap();
        }
        assert_eq!(registry.remove_matching(filter::name_starts_with("db.")), 2);
        assert_eq!(registry.names().into_iter().collect::<Vec<_>>(), vec!["http.requests"]);
        assert!(registry.metadata_by_name("db.reads").is_none());
    }

    #[test]
    fn test_remove_matching_leaves_replaced_binding() {
        let registry = MetricsRegistry::new();
        let original = registry.counter("jobs", &[]).unwrap();
        registry.counter("other", &[]).unwrap();

        let id = MetricId::new("jobs");
        let replacement = parking_lot::Mutex::new(None);
        let removed = registry.remove_matching(filter::from_fn(|candidate, _| {
            if candidate != &id {
                return true;
            }
            // Swap the instrument while the filter is running.
            assert!(registry.remove_id(&id));
            *replacement.lock() = Some(registry.counter("jobs", &[]).unwrap());
            true
        }));

        assert_eq!(removed, 1);
        let replacement = replacement.into_inner().unwrap();
        assert!(!Arc::ptr_eq(&original, &replacement));
        let stored = registry.counters(ALL);
        assert_eq!(stored.len(), 1);
        assert!(Arc::ptr_eq(&stored[&id], &replacement));
    }

    #[test]
    fn test_metadata_copy() {
        let registry = MetricsRegistry::new();
        registry.counter("a", &[Tag::new("k", "1")]).unwrap();
        registry.counter("a", &[Tag::new("k", "2")]).unwrap();
        registry.meter("b", &[]).unwrap();

        let metadata = registry.metadata();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["a"].metric_type, MetricType::Counter);
        assert_eq!(metadata["b"].metric_type, MetricType::Metered);

        assert!(registry.remove("a"));
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["a"].name, "a");
        assert_eq!(registry.metadata().len(), 1);
    }

    #[test]
    fn test_type_filtering() {
        let registry = MetricsRegistry::new();
        registry.counter("c1", &[]).unwrap();
        registry.counter("c2", &[]).unwrap();
        registry.meter("m1", &[]).unwrap();
        registry.register("g1", Arc::new(Gauge::new(|| 3))).unwrap();

        assert_eq!(registry.counters(ALL).len(), 2);
        assert_eq!(registry.meters(ALL).len(), 1);
        assert_eq!(registry.gauges(ALL).len(), 1);
        assert!(registry.timers(ALL).is_empty());

        let stats = registry.stats();
        assert_eq!(stats.total_metrics, 4);
        assert_eq!(stats.counter_count, 2);
        assert_eq!(stats.meter_count, 1);
        assert_eq!(stats.gauge_count, 1);
    }

    #[test]
    fn test_created_instruments_use_registry_clock() {
        let clock = Arc::new(ManualClock::default());
        let registry = MetricsRegistry::new()
            .with_clock(clock.clone())
            .with_reservoir(ReservoirKind::Uniform);
        let timer = registry.timer("job", &[]).unwrap();
        let context = timer.time_context();
        clock.advance(std::time::Duration::from_millis(2));
        context.stop();
        assert_eq!(timer.snapshot().values(), &[2_000_000]);
    }

    #[test]
    fn test_export_dump() {
        let registry = MetricsRegistry::new().with_scope(RegistryScope::Vendor);
        registry.counter("b", &[]).unwrap().inc_by(2);
        registry.register("a", Arc::new(Gauge::new(|| 7))).unwrap();

        let dump = registry.export_all();
        assert_eq!(dump.scope, RegistryScope::Vendor);
        let names: Vec<_> = dump.metrics.iter().map(|s| s.id.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(dump.metrics[1].value, MetricValue::Counter { count: 2 });

        let json = dump.to_json().unwrap();
        assert!(json.contains("\"scope\":\"vendor\""));
    }
}
