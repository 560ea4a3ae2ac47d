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

//! The pre-resolved configuration handed to a registry at construction.

use super::metrics::{normalize_tags, MetricsResult, Tag};
use std::collections::HashMap;

/// Preferred key holding the global tags.
pub const GLOBAL_TAGS_KEY: &str = "mp.metrics.tags";

/// Environment-style alias consulted when [`GLOBAL_TAGS_KEY`] is absent.
pub const GLOBAL_TAGS_ENV_KEY: &str = "MP_METRICS_TAGS";

/// A bag of already-resolved configuration values.
///
/// Configuration discovery happens elsewhere; the registry only reads keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBag {
    values: HashMap<String, String>,
}

impl ConfigBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment.
    pub fn from_env() -> Self {
        std::env::vars().collect()
    }

    /// Sets a value, returning the bag.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Reads a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parses the global tag set.
    ///
    /// The value is trimmed as a whole, then split on `,`; every segment must
    /// be a strict `key=value` pair. An absent or empty value yields no tags.
    pub fn global_tags(&self) -> MetricsResult<Vec<Tag>> {
        let raw = match self
            .get(GLOBAL_TAGS_KEY)
            .or_else(|| self.get(GLOBAL_TAGS_ENV_KEY))
        {
            Some(raw) => raw.trim(),
            None => return Ok(Vec::new()),
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let tags = raw
            .split(',')
            .map(str::parse::<Tag>)
            .collect::<MetricsResult<Vec<_>>>()?;
        Ok(normalize_tags(tags))
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
