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

//! Registries built from a configuration bag.

use mensura_core::{ConfigBag, MetricId, MetricsError, Tag};
use mensura_telemetry::{service, MetricsRegistry, MetricsService, RegistryScope};

#[test]
fn test_global_tags_merge_into_ids() {
    let config = ConfigBag::new().with("mp.metrics.tags", "a=1");
    let registry = MetricsRegistry::from_config(&config).unwrap();
    registry.counter("x", &[Tag::new("b", "2")]).unwrap();

    let ids: Vec<_> = registry.ids().into_iter().collect();
    assert_eq!(ids, vec![MetricId::new("x").with_tag("a", "1").with_tag("b", "2")]);
}

#[test]
fn test_id_tags_override_global_tags() {
    let config = ConfigBag::new().with("MP_METRICS_TAGS", "env=prod,region=eu");
    let registry = MetricsRegistry::from_config(&config).unwrap();
    registry.counter("x", &[Tag::new("env", "test")]).unwrap();

    let id = registry.ids().into_iter().next().unwrap();
    assert_eq!(id.tag("env"), Some("test"));
    assert_eq!(id.tag("region"), Some("eu"));
}

#[test]
fn test_register_by_name_uses_global_tags() {
    let config = ConfigBag::new().with("mp.metrics.tags", "host=h1");
    let registry = MetricsRegistry::from_config(&config).unwrap();
    registry.register("up", std::sync::Arc::new(mensura_telemetry::Counter::new())).unwrap();
    assert!(registry.get(&MetricId::new("up").with_tag("host", "h1")).is_some());
    assert!(registry.get(&MetricId::new("up")).is_none());
}

#[test]
fn test_malformed_global_tags() {
    let config = ConfigBag::new().with("mp.metrics.tags", "a=1,b");
    let err = MetricsRegistry::from_config(&config).unwrap_err();
    assert_eq!(err, MetricsError::MalformedGlobalTags("b".to_string()));
}

#[test]
fn test_process_wide_service() {
    let config = ConfigBag::new().with("mp.metrics.tags", "app=demo");
    service::install(MetricsService::from_config(&config).unwrap());

    let installed = service::global().unwrap();
    let vendor = installed.registry(RegistryScope::Vendor);
    vendor.counter("gc.count", &[]).unwrap().inc_by(4);

    let dump = service::global().unwrap().registry(RegistryScope::Vendor).export_all();
    assert_eq!(dump.scope, RegistryScope::Vendor);
    assert_eq!(dump.metrics.len(), 1);
    assert_eq!(dump.metrics[0].id.tag("app"), Some("demo"));

    service::uninstall();
    assert!(service::global().is_none());
}
