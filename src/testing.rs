//! Scripted snapshot source shared by the relay and web tests

use crate::error::{Result, SolarEdgeError};
use crate::relay::SiteSource;
use crate::types::{
    Overview, OverviewEnergy, OverviewPower, PowerFlow, PowerFlowConnection, PowerFlowStatus, Site,
    StoragePowerFlowStatus,
};
use crate::time::SiteTimestamp;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers each call with the next scripted result; errors once exhausted
#[derive(Default)]
pub(crate) struct ScriptedSource {
    details: Mutex<VecDeque<Result<Site>>>,
    flows: Mutex<VecDeque<Result<PowerFlow>>>,
    overviews: Mutex<VecDeque<Result<Overview>>>,
    flow_delay: Option<Duration>,
    pub details_calls: AtomicUsize,
    pub flow_calls: AtomicUsize,
    pub overview_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Every power flow call sleeps `delay` before answering
    pub fn with_flow_delay(delay: Duration) -> Self {
        Self {
            flow_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_details(&self, r: Result<Site>) -> &Self {
        self.details.lock().unwrap().push_back(r);
        self
    }

    pub fn push_flow(&self, r: Result<PowerFlow>) -> &Self {
        self.flows.lock().unwrap().push_back(r);
        self
    }

    pub fn push_overview(&self, r: Result<Overview>) -> &Self {
        self.overviews.lock().unwrap().push_back(r);
        self
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T>>>, calls: &AtomicUsize) -> Result<T> {
        calls.fetch_add(1, Ordering::SeqCst);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SolarEdgeError::network("no scripted response")))
    }
}

#[async_trait::async_trait]
impl SiteSource for ScriptedSource {
    async fn details(&self) -> Result<Site> {
        Self::next(&self.details, &self.details_calls)
    }

    async fn power_flow(&self) -> Result<PowerFlow> {
        if let Some(delay) = self.flow_delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.flows, &self.flow_calls)
    }

    async fn overview(&self) -> Result<Overview> {
        Self::next(&self.overviews, &self.overview_calls)
    }
}

pub(crate) fn site(id: i64) -> Site {
    Site {
        id,
        name: "Rooftop".to_string(),
        status: "Active".to_string(),
        peak_power: 9.9,
        ..Site::default()
    }
}

/// Power flow in kW where every magnitude is derived from `n`
pub(crate) fn flow(n: f64) -> PowerFlow {
    let node = |p: f64| PowerFlowStatus {
        status: "Active".to_string(),
        current_power: p,
    };
    PowerFlow {
        unit: "kW".to_string(),
        connections: vec![
            PowerFlowConnection::new("PV", "Load"),
            PowerFlowConnection::new("LOAD", "GRID"),
        ],
        grid: node(n / 10.0),
        load: node(n),
        pv: Some(node(n * 2.0)),
        storage: Some(StoragePowerFlowStatus {
            status: "Charging".to_string(),
            current_power: n / 2.0,
            charge_level: 50,
            critical: false,
        }),
    }
}

pub(crate) fn overview(day_energy: f64) -> Overview {
    Overview {
        last_update_time: SiteTimestamp::parse("2024-05-01 13:05:12").unwrap(),
        lifetime_data: OverviewEnergy { energy: 761_985.75 },
        last_year_data: OverviewEnergy { energy: 61_985.8 },
        last_month_data: OverviewEnergy { energy: 4_927.7 },
        last_day_data: OverviewEnergy { energy: day_energy },
        current_power: OverviewPower { power: 304.8 },
        measured_by: "INVERTER".to_string(),
    }
}
