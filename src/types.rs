//! Payload types of the monitoring API
//!
//! Field names follow the vendor JSON. Every struct tolerates missing
//! fields so that sites without meters, storage or sensors still decode.

use crate::time::SiteTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation period for energy queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    #[default]
    QuarterOfAnHour,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QuarterOfAnHour => "QUARTER_OF_AN_HOUR",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "QUARTER_OF_AN_HOUR" | "QUARTER" => Ok(Self::QuarterOfAnHour),
            "HOUR" => Ok(Self::Hour),
            "DAY" => Ok(Self::Day),
            "WEEK" => Ok(Self::Week),
            "MONTH" => Ok(Self::Month),
            "YEAR" => Ok(Self::Year),
            other => Err(format!(
                "unknown time unit {other:?}, expected one of QUARTER_OF_AN_HOUR, HOUR, DAY, WEEK, MONTH, YEAR"
            )),
        }
    }
}

/// Stored site information
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Site {
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub account_id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    pub peak_power: f64,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_code: String,
}

/// Equipment installed at a site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meters: Vec<Meter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<Sensor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<Gateway>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub batteries: Vec<Battery>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inverters: Vec<Inverter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meter {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub connected_to: String,
    #[serde(rename = "connectedSolaredgeDeviceSN")]
    pub connected_solaredge_device_sn: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub form: String,
    #[serde(rename = "SN")]
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sensor {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub connected_to: String,
    #[serde(rename = "connectedSolaredgeDeviceSN")]
    pub connected_solaredge_device_sn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Gateway {
    pub name: String,
    pub serial_number: String,
    pub firmware_version: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Battery {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub connected_to: String,
    #[serde(rename = "connectedSolaredgeDeviceSN")]
    pub connected_solaredge_device_sn: String,
    pub connected_inverter_sn: String,
    pub nameplate_capacity: f64,
    #[serde(rename = "SN")]
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Inverter {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub communication_method: String,
    pub cpu_version: String,
    #[serde(rename = "SN")]
    pub serial_number: String,
    pub connected_optimizers: u32,
}

/// One telemetry sample of a storage battery
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageBatteryTelemetry {
    #[serde(rename = "timeStamp")]
    pub timestamp: SiteTimestamp,
    pub power: f64,
    #[serde(rename = "batteryState")]
    pub state: i32,
    #[serde(rename = "lifeTimeEnergyDischarged")]
    pub lifetime_energy_discharged: i64,
    #[serde(rename = "lifeTimeEnergyCharged")]
    pub lifetime_energy_charged: i64,
    #[serde(rename = "batteryPercentageState")]
    pub percentage_state: f64,
    #[serde(rename = "fullPackEnergyAvailable")]
    pub full_pack_energy_available: f64,
    #[serde(rename = "internalTemp")]
    pub internal_temp: f64,
    #[serde(rename = "ACGridCharging")]
    pub ac_grid_charging: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageBattery {
    pub nameplate: f64,
    pub serial_number: String,
    pub model_number: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telemetries: Vec<StorageBatteryTelemetry>,
}

/// Inner payload of the `storageData` envelope
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageData {
    pub batteries: Vec<StorageBattery>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterValue {
    pub date: SiteTimestamp,
    // The API omits `value` for periods without data
    pub value: Option<f64>,
}

/// Time series of one meter type (Production, Consumption, FeedIn, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteredValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub values: Vec<MeterValue>,
}

/// Power (`powerDetails`) or energy (`energyDetails`) series for a range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeterDetails {
    pub time_unit: TimeUnit,
    pub unit: String,
    pub meters: Vec<MeteredValue>,
}

pub type PowerDetails = MeterDetails;
pub type EnergyDetails = MeterDetails;

/// Direction of power between two nodes of the flow graph
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerFlowConnection {
    pub from: String,
    pub to: String,
}

impl PowerFlowConnection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PowerFlowStatus {
    pub status: String,
    pub current_power: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoragePowerFlowStatus {
    pub status: String,
    pub current_power: f64,
    pub charge_level: i32,
    pub critical: bool,
}

/// Current flow of power through the whole site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerFlow {
    pub unit: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<PowerFlowConnection>,
    #[serde(rename = "GRID")]
    pub grid: PowerFlowStatus,
    #[serde(rename = "LOAD")]
    pub load: PowerFlowStatus,
    #[serde(rename = "PV", skip_serializing_if = "Option::is_none")]
    pub pv: Option<PowerFlowStatus>,
    #[serde(rename = "STORAGE", skip_serializing_if = "Option::is_none")]
    pub storage: Option<StoragePowerFlowStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewEnergy {
    pub energy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewPower {
    pub power: f64,
}

/// Lifetime and period totals of a site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Overview {
    pub last_update_time: SiteTimestamp,
    #[serde(rename = "lifeTimeData")]
    pub lifetime_data: OverviewEnergy,
    pub last_year_data: OverviewEnergy,
    pub last_month_data: OverviewEnergy,
    pub last_day_data: OverviewEnergy,
    pub current_power: OverviewPower,
    pub measured_by: String,
}
