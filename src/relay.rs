//! Refresh cache behind the HTTP relay
//!
//! The relay keeps the latest power flow, overview and site details of one
//! site. Fetches happen outside the lock; the write lock is only taken to
//! swap in the new `Arc`, so a slow upstream never blocks readers. Readers
//! clone the `Arc` under the read lock and serialize after releasing it.
//!
//! A failed refresh is logged and the previous snapshot stays in place.

use crate::config::RelayConfig;
use crate::error::Result;
use crate::flow::{BatterySignPolicy, FlowView};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::metrics::RelayMetrics;
use crate::site::SiteClient;
use crate::types::{Overview, PowerFlow, Site};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[cfg(test)]
mod tests;

/// Where the relay gets its snapshots from
#[async_trait::async_trait]
pub trait SiteSource: Send + Sync {
    async fn details(&self) -> Result<Site>;
    async fn power_flow(&self) -> Result<PowerFlow>;
    async fn overview(&self) -> Result<Overview>;
}

#[async_trait::async_trait]
impl SiteSource for SiteClient {
    async fn details(&self) -> Result<Site> {
        Self::details(self).await
    }

    async fn power_flow(&self) -> Result<PowerFlow> {
        Self::power_flow(self).await
    }

    async fn overview(&self) -> Result<Overview> {
        Self::overview(self).await
    }
}

/// Timer and derivation settings of a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    pub flow_interval: Duration,
    pub poll_interval: Duration,
    pub refresh_details: bool,
    pub battery_sign: BatterySignPolicy,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            flow_interval: config.flow_interval(),
            poll_interval: config.poll_interval(),
            refresh_details: config.refresh_details,
            battery_sign: config.battery_sign,
        }
    }
}

/// Freshness of the cached snapshots as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayPhase {
    /// Power flow or overview never fetched successfully
    Uninitialized,
    /// Every kind fetched and the latest attempts succeeded
    Ready,
    /// The latest attempt of some kind failed; its previous snapshot is served
    Degraded,
}

/// The independently refreshed snapshot kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    PowerFlow,
    Overview,
    Details,
}

impl SnapshotKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PowerFlow => "powerflow",
            Self::Overview => "overview",
            Self::Details => "details",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Health {
    fetched: bool,
    failing: bool,
}

impl Health {
    fn record(&mut self, ok: bool) {
        self.fetched |= ok;
        self.failing = !ok;
    }
}

#[derive(Debug, Default)]
struct Snapshots {
    power_flow: Arc<PowerFlow>,
    overview: Arc<Overview>,
    details: Arc<Site>,
    power_flow_health: Health,
    overview_health: Health,
    details_health: Health,
}

impl Snapshots {
    fn health_mut(&mut self, kind: SnapshotKind) -> &mut Health {
        match kind {
            SnapshotKind::PowerFlow => &mut self.power_flow_health,
            SnapshotKind::Overview => &mut self.overview_health,
            SnapshotKind::Details => &mut self.details_health,
        }
    }

    fn phase(&self) -> RelayPhase {
        if !(self.power_flow_health.fetched && self.overview_health.fetched) {
            RelayPhase::Uninitialized
        } else if self.power_flow_health.failing
            || self.overview_health.failing
            || self.details_health.failing
        {
            RelayPhase::Degraded
        } else {
            RelayPhase::Ready
        }
    }
}

/// Latest-known state of one site plus the loop that keeps it fresh
pub struct Relay {
    source: Arc<dyn SiteSource>,
    settings: RelaySettings,
    state: RwLock<Snapshots>,
    metrics: RelayMetrics,
    logger: StructuredLogger,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("settings", &self.settings)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Relay {
    /// Fetch the site details and set up the gauges.
    ///
    /// Fails if the details cannot be fetched. Power flow and overview start
    /// out empty until [`Relay::initialize`] runs.
    pub async fn new(source: Arc<dyn SiteSource>, settings: RelaySettings) -> Result<Self> {
        let details = source.details().await?;
        let logger = get_logger_with_context(
            LogContext::new("relay").with_site_id(&details.id.to_string()),
        );
        logger.info(&format!(
            "fetched site details: name={:?} status={:?}",
            details.name, details.status
        ));

        let metrics = RelayMetrics::new(details.id)?;
        let mut snapshots = Snapshots {
            details: Arc::new(details),
            ..Snapshots::default()
        };
        snapshots.details_health.record(true);

        Ok(Self {
            source,
            settings,
            state: RwLock::new(snapshots),
            metrics,
            logger,
        })
    }

    pub const fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub const fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// First refresh of both timed kinds; run before serving
    pub async fn initialize(&self) -> RelayPhase {
        self.refresh_power_flow().await;
        self.refresh_overview().await;
        let phase = self.phase().await;
        if phase == RelayPhase::Ready {
            self.logger.info("initial snapshots fetched");
        } else {
            self.logger
                .warn(&format!("initial refresh incomplete, relay is {phase:?}"));
        }
        phase
    }

    /// Refresh the power flow; returns whether a new snapshot was published
    pub async fn refresh_power_flow(&self) -> bool {
        match self.source.power_flow().await {
            Ok(flow) => {
                let view = FlowView::from_power_flow(&flow, self.settings.battery_sign);
                self.logger.debug(&format!("fetched new powerflow: {flow:?}"));
                {
                    let mut state = self.state.write().await;
                    state.power_flow = Arc::new(flow);
                    state.health_mut(SnapshotKind::PowerFlow).record(true);
                }
                self.metrics.observe(&view);
                self.logger.info(&format!(
                    "powerflow updated: pv={} grid={} battery={} soc={}",
                    view.pv, view.grid, view.battery, view.soc
                ));
                true
            }
            Err(e) => {
                self.record_failure(SnapshotKind::PowerFlow, &e).await;
                false
            }
        }
    }

    /// Refresh the overview; returns whether a new snapshot was published
    pub async fn refresh_overview(&self) -> bool {
        match self.source.overview().await {
            Ok(overview) => {
                self.logger.info(&format!(
                    "fetched new overview: last_update={} current_power={}",
                    overview.last_update_time, overview.current_power.power
                ));
                let mut state = self.state.write().await;
                state.overview = Arc::new(overview);
                state.health_mut(SnapshotKind::Overview).record(true);
                true
            }
            Err(e) => {
                self.record_failure(SnapshotKind::Overview, &e).await;
                false
            }
        }
    }

    /// Refetch the site details; returns whether a new snapshot was published
    pub async fn refresh_details(&self) -> bool {
        match self.source.details().await {
            Ok(details) => {
                self.logger
                    .debug(&format!("fetched new site details: {details:?}"));
                let mut state = self.state.write().await;
                state.details = Arc::new(details);
                state.health_mut(SnapshotKind::Details).record(true);
                true
            }
            Err(e) => {
                self.record_failure(SnapshotKind::Details, &e).await;
                false
            }
        }
    }

    async fn record_failure(&self, kind: SnapshotKind, err: &crate::error::SolarEdgeError) {
        self.logger
            .error(&format!("cannot query {}: {err}", kind.as_str()));
        self.state.write().await.health_mut(kind).record(false);
    }

    pub async fn power_flow(&self) -> Arc<PowerFlow> {
        Arc::clone(&self.state.read().await.power_flow)
    }

    pub async fn overview(&self) -> Arc<Overview> {
        Arc::clone(&self.state.read().await.overview)
    }

    pub async fn details(&self) -> Arc<Site> {
        Arc::clone(&self.state.read().await.details)
    }

    /// Flow view derived from the current power flow snapshot
    pub async fn flow_view(&self) -> FlowView {
        let flow = self.power_flow().await;
        FlowView::from_power_flow(&flow, self.settings.battery_sign)
    }

    pub async fn phase(&self) -> RelayPhase {
        self.state.read().await.phase()
    }

    /// Refresh loop; never returns.
    ///
    /// Assumes [`Relay::initialize`] already ran, so the first ticks fire one
    /// full interval from now. Ticks missed while a refresh is running are
    /// skipped, not queued.
    pub async fn run(self: Arc<Self>) {
        let now = Instant::now();
        let flow_every = self.settings.flow_interval;
        let poll_every = self.settings.poll_interval;
        let mut flow_tick = interval_at(now + flow_every, flow_every);
        flow_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll_tick = interval_at(now + poll_every, poll_every);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.logger.info(&format!(
            "refresh loop started: flow every {:?}, poll every {:?}",
            self.settings.flow_interval, self.settings.poll_interval
        ));

        loop {
            tokio::select! {
                _ = flow_tick.tick() => {
                    self.refresh_power_flow().await;
                }
                _ = poll_tick.tick() => {
                    self.refresh_overview().await;
                    if self.settings.refresh_details {
                        self.refresh_details().await;
                    }
                }
            }
        }
    }

    /// Spawn [`Relay::run`] on the runtime
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }
}
