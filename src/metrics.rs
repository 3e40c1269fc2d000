//! Prometheus gauges mirroring the latest flow view
//!
//! Each relay owns its registry, so several relays (or tests) can live in
//! one process without clashing on metric names.

use crate::error::{Result, SolarEdgeError};
use crate::flow::FlowView;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};

/// Gauges for one site, namespaced `site_<id>`
#[derive(Clone)]
pub struct RelayMetrics {
    registry: Registry,
    pv: Gauge,
    grid: Gauge,
    battery: Gauge,
    soc: Gauge,
}

impl std::fmt::Debug for RelayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayMetrics")
            .field("pv", &self.pv.get())
            .field("grid", &self.grid.get())
            .field("battery", &self.battery.get())
            .field("soc", &self.soc.get())
            .finish_non_exhaustive()
    }
}

/// `site_<id>` with anything outside `[a-z0-9_]` replaced
pub fn site_namespace(site_id: i64) -> String {
    format!("site_{site_id}")
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

impl RelayMetrics {
    pub fn new(site_id: i64) -> Result<Self> {
        let registry = Registry::new();
        let namespace = site_namespace(site_id);
        let gauge = |subsystem: &str, name: &str, help: &str| -> Result<Gauge> {
            let opts = Opts::new(name, help)
                .namespace(namespace.clone())
                .subsystem(subsystem);
            let gauge = Gauge::with_opts(opts).map_err(metrics_error)?;
            registry
                .register(Box::new(gauge.clone()))
                .map_err(metrics_error)?;
            Ok(gauge)
        };

        Ok(Self {
            pv: gauge("pv", "current_power", "the current power of the pv")?,
            grid: gauge("grid", "current_power", "the current power of the grid")?,
            battery: gauge(
                "battery",
                "current_power",
                "the current power of the battery",
            )?,
            soc: gauge(
                "soc",
                "current_value",
                "the current state of charge of the battery",
            )?,
            registry,
        })
    }

    /// Publish a freshly derived flow view
    pub fn observe(&self, view: &FlowView) {
        self.pv.set(view.pv);
        self.grid.set(view.grid);
        self.battery.set(view.battery);
        self.soc.set(view.soc);
    }

    /// Current gauge values as a flow view
    pub fn current(&self) -> FlowView {
        FlowView {
            pv: self.pv.get(),
            grid: self.grid.get(),
            battery: self.battery.get(),
            soc: self.soc.get(),
        }
    }

    /// Prometheus text exposition of this relay's registry
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| SolarEdgeError::web(e.to_string()))
    }
}

fn metrics_error(err: prometheus::Error) -> SolarEdgeError {
    SolarEdgeError::web(format!("metrics: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        assert_eq!(site_namespace(1234), "site_1234");
        assert_eq!(site_namespace(-5), "site__5");
    }

    #[test]
    fn test_observe_and_render() {
        let metrics = RelayMetrics::new(42).unwrap();
        let view = FlowView {
            pv: 2500.0,
            grid: -300.0,
            battery: 1000.0,
            soc: 80.0,
        };
        metrics.observe(&view);
        assert_eq!(metrics.current(), view);

        let text = metrics.render().unwrap();
        assert!(text.contains("site_42_pv_current_power 2500"));
        assert!(text.contains("site_42_grid_current_power -300"));
        assert!(text.contains("site_42_battery_current_power 1000"));
        assert!(text.contains("site_42_soc_current_value 80"));
        assert!(text.contains("# HELP site_42_soc_current_value the current state of charge"));
    }

    #[test]
    fn test_independent_instances() {
        let a = RelayMetrics::new(1).unwrap();
        let b = RelayMetrics::new(1).unwrap();
        a.observe(&FlowView {
            pv: 1.0,
            ..FlowView::default()
        });
        assert_eq!(b.current().pv, 0.0);
    }
}
