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

//! The two-map table behind a registry.

use crate::instruments::Metric;
use mensura_core::{Metadata, MetricId};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
struct NameEntry {
    metadata: Metadata,
    ids: BTreeSet<MetricId>,
}

/// Instruments keyed by id plus metadata keyed by name.
///
/// Every mutation keeps the two maps in step: a name has metadata exactly
/// while at least one id with that name is stored.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    metrics: HashMap<MetricId, Metric>,
    names: HashMap<String, NameEntry>,
}

impl MetricTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            metrics: HashMap::with_capacity(capacity),
            names: HashMap::with_capacity(capacity),
        }
    }

    /// The instrument stored under `id`.
    pub fn get(&self, id: &MetricId) -> Option<&Metric> {
        self.metrics.get(id)
    }

    /// The metadata bound to `name`.
    pub fn metadata(&self, name: &str) -> Option<&Metadata> {
        self.names.get(name).map(|entry| &entry.metadata)
    }

    /// Whether any id with `name` is stored.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Stores `metric` under `id`.
    ///
    /// `metadata` is bound to the name only if the name is new; ids added
    /// under a known name share the metadata already stored. Returns the
    /// instrument previously stored under `id`, if any.
    pub fn insert(&mut self, id: MetricId, metric: Metric, metadata: Metadata) -> Option<Metric> {
        self.names
            .entry(id.name().to_string())
            .or_insert_with(|| NameEntry {
                metadata,
                ids: BTreeSet::new(),
            })
            .ids
            .insert(id.clone());
        self.metrics.insert(id, metric)
    }

    /// Removes a single id, dropping the name's metadata with its last id.
    pub fn remove_id(&mut self, id: &MetricId) -> Option<Metric> {
        let metric = self.metrics.remove(id)?;
        if let Some(entry) = self.names.get_mut(id.name()) {
            entry.ids.remove(id);
            if entry.ids.is_empty() {
                self.names.remove(id.name());
            }
        }
        Some(metric)
    }

    /// Removes every id with `name` plus the metadata. Returns how many ids
    /// were removed.
    pub fn remove_name(&mut self, name: &str) -> usize {
        let Some(entry) = self.names.remove(name) else {
            return 0;
        };
        for id in &entry.ids {
            self.metrics.remove(id);
        }
        entry.ids.len()
    }

    /// Iterates over the stored bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&MetricId, &Metric)> {
        self.metrics.iter()
    }

    /// Iterates over the stored ids in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &MetricId> {
        self.metrics.keys()
    }

    /// Iterates over name and metadata pairs.
    pub fn metadata_entries(&self) -> impl Iterator<Item = (&str, &Metadata)> {
        self.names
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.metadata))
    }

    /// The number of stored ids.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.metrics.clear();
        self.names.clear();
    }
}
