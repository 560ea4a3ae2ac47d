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

use anyhow::{Context, Result};
use mensura_core::{ConfigBag, Metadata, MetricType, Tag};
use mensura_telemetry::filter;
use mensura_telemetry::service::{self, MetricsService};
use mensura_telemetry::{Gauge, RegistryScope};
use std::sync::Arc;
use std::time::Duration;

fn record(service: &MetricsService) -> Result<()> {
    let app = service.application();

    let requests = app.meter_with_metadata(
        Metadata::builder("http.requests")
            .with_type(MetricType::Metered)
            .with_description("Handled HTTP requests")
            .reusable()
            .build(),
        &[],
    )?;
    let latency = app.timer("http.latency", &[Tag::new("route", "/")])?;
    let in_flight = app.concurrent_gauge("http.in_flight", &[])?;

    for i in 0..50u64 {
        in_flight.inc();
        requests.mark();
        latency.update(Duration::from_micros(200 + (i * 37) % 500));
        in_flight.dec();
    }

    let body = app.histogram("http.body.size", &[])?;
    for size in [512, 1024, 2048, 768, 4096] {
        body.update(size);
    }

    let started = std::time::Instant::now();
    service
        .registry(RegistryScope::Base)
        .register("uptime.seconds", Arc::new(Gauge::new(move || started.elapsed().as_secs_f64())))?;

    log::info!("Recorded {} application metrics", app.len());
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ConfigBag::from_env();
    let metrics = MetricsService::from_config(&config).context("invalid metrics configuration")?;
    service::install(metrics);
    let metrics = service::global().context("metrics service not installed")?;

    record(&metrics)?;

    for scope in RegistryScope::ALL {
        let dump = metrics.registry(scope).export(filter::ALL);
        log::info!("{scope} metrics:\n{}", dump.to_json_pretty()?);
    }

    let dropped = metrics
        .application()
        .remove_matching(filter::name_starts_with("http.body"));
    log::info!("Removed {dropped} metrics");

    service::uninstall();
    Ok(())
}
