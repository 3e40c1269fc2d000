//! Site scoped queries
//!
//! One method per monitoring API endpoint. Ranged queries render their
//! bounds as wall-clock time in the site's zone.

use crate::client::SolarEdgeClient;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::time::SiteZone;
use crate::types::{
    EnergyDetails, Inventory, Overview, PowerDetails, PowerFlow, Site, StorageBattery, StorageData,
    TimeUnit,
};
use chrono::{DateTime, TimeZone};

/// Client bound to a single site id
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: SolarEdgeClient,
    site_id: String,
    zone: SiteZone,
}

impl SiteClient {
    pub fn new(client: SolarEdgeClient, site_id: String) -> Self {
        Self {
            client,
            site_id,
            zone: SiteZone::default(),
        }
    }

    /// Client, site and zone as configured in `api`
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let client = SolarEdgeClient::builder(api.api_key.clone())
            .base_url(api.base_url.clone())
            .timeout(api.request_timeout())
            .build()?;
        Ok(client.site(api.site_id.trim()).with_zone(api.site_zone()?))
    }

    /// Zone used to render `startTime`/`endTime`
    #[must_use]
    pub const fn with_zone(mut self, zone: SiteZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub const fn zone(&self) -> SiteZone {
        self.zone
    }

    fn path(&self, operation: &str) -> String {
        format!("/site/{}/{}.json", self.site_id, operation)
    }

    fn range_params<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("startTime", self.zone.format(start)),
            ("endTime", self.zone.format(end)),
        ]
    }

    /// Static site metadata
    pub async fn details(&self) -> Result<Site> {
        self.client
            .get(&self.path("details"), &[], "details")
            .await
    }

    /// Installed equipment
    pub async fn inventory(&self) -> Result<Inventory> {
        self.client
            .get(&self.path("inventory"), &[], "Inventory")
            .await
    }

    /// Battery telemetry between `start` and `end`
    pub async fn storage_data<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<Vec<StorageBattery>> {
        let data: StorageData = self
            .client
            .get(
                &self.path("storageData"),
                &self.range_params(start, end),
                "storageData",
            )
            .await?;
        Ok(data.batteries)
    }

    /// Power readings per meter between `start` and `end`
    pub async fn power_details<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<PowerDetails> {
        self.client
            .get(
                &self.path("powerDetails"),
                &self.range_params(start, end),
                "powerDetails",
            )
            .await
    }

    /// Energy per meter between `start` and `end`, aggregated by `time_unit`
    pub async fn energy_details<T: TimeZone>(
        &self,
        time_unit: TimeUnit,
        start: &DateTime<T>,
        end: &DateTime<T>,
    ) -> Result<EnergyDetails> {
        let mut params = self.range_params(start, end);
        params.push(("timeUnit", time_unit.as_str().to_string()));
        self.client
            .get(&self.path("energyDetails"), &params, "energyDetails")
            .await
    }

    /// Current flow of power between grid, load, PV and storage
    pub async fn power_flow(&self) -> Result<PowerFlow> {
        self.client
            .get(
                &self.path("currentPowerFlow"),
                &[],
                "siteCurrentPowerFlow",
            )
            .await
    }

    /// Lifetime and period totals
    pub async fn overview(&self) -> Result<Overview> {
        self.client
            .get(&self.path("overview"), &[], "overview")
            .await
    }
}
