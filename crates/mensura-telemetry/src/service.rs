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

//! Service owning one registry per scope, and the process-wide default.

use crate::metrics::registry::{MetricsRegistry, RegistryScope};
use mensura_core::{ConfigBag, MetricsResult};
use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL: RwLock<Option<Arc<MetricsService>>> = parking_lot::const_rwlock(None);

/// Service holding the application, base and vendor registries.
#[derive(Debug)]
pub struct MetricsService {
    application: MetricsRegistry,
    base: MetricsRegistry,
    vendor: MetricsRegistry,
}

impl MetricsService {
    /// Creates a service whose registries carry no global tags.
    pub fn new() -> Self {
        Self {
            application: MetricsRegistry::new().with_scope(RegistryScope::Application),
            base: MetricsRegistry::new().with_scope(RegistryScope::Base),
            vendor: MetricsRegistry::new().with_scope(RegistryScope::Vendor),
        }
    }

    /// Creates a service whose registries are all built from `config`.
    pub fn from_config(config: &ConfigBag) -> MetricsResult<Self> {
        let build = |scope| MetricsRegistry::from_config(config).map(|r| r.with_scope(scope));
        Ok(Self {
            application: build(RegistryScope::Application)?,
            base: build(RegistryScope::Base)?,
            vendor: build(RegistryScope::Vendor)?,
        })
    }

    /// Returns the registry of `scope`.
    pub fn registry(&self, scope: RegistryScope) -> &MetricsRegistry {
        match scope {
            RegistryScope::Application => &self.application,
            RegistryScope::Base => &self.base,
            RegistryScope::Vendor => &self.vendor,
        }
    }

    /// Returns the application registry.
    pub fn application(&self) -> &MetricsRegistry {
        &self.application
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs `service` as the process-wide default, returning the one it
/// replaces.
pub fn install(service: MetricsService) -> Option<Arc<MetricsService>> {
    log::info!("Installing process-wide metrics service");
    GLOBAL.write().replace(Arc::new(service))
}

/// Returns the process-wide default service, if one is installed.
pub fn global() -> Option<Arc<MetricsService>> {
    GLOBAL.read().clone()
}

/// Removes the process-wide default service.
///
/// Handles obtained through [`global`] stay usable.
pub fn uninstall() -> Option<Arc<MetricsService>> {
    let previous = GLOBAL.write().take();
    if previous.is_some() {
        log::info!("Uninstalled process-wide metrics service");
    }
    previous
}
