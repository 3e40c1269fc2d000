//! Simplified power flow view
//!
//! The API describes power flow as directed connections between named nodes
//! with unsigned magnitudes in a per-response unit. [`FlowView`] folds that
//! into signed watts: `grid` is positive when importing, `battery` is
//! positive when discharging.

use crate::types::{PowerFlow, PowerFlowConnection};
use serde::{Deserialize, Serialize};

/// Which storage states count as discharging (battery power reported positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatterySignPolicy {
    /// Only `Discharging` flips the sign
    DischargingOnly,
    /// `Discharging` and `Idle` flip the sign
    #[default]
    DischargingOrIdle,
}

impl BatterySignPolicy {
    /// Sign applied to the storage node's current power
    pub fn battery_scale(self, status: &str) -> f64 {
        let discharging = match self {
            Self::DischargingOnly => status == "Discharging",
            Self::DischargingOrIdle => status == "Discharging" || status == "Idle",
        };
        if discharging { 1.0 } else { -1.0 }
    }
}

/// Grid direction rules, checked in order against each connection
const GRID_DIRECTIONS: [(&str, &str, f64); 2] = [("load", "grid", -1.0), ("grid", "load", 1.0)];

/// Multiplier turning a flow unit into watts; unknown units count as watts
pub fn unit_factor(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "kw" => 1_000.0,
        "mw" => 1_000_000.0,
        _ => 1.0,
    }
}

/// Sign of grid power implied by a connection, if it touches the grid
pub fn flow_direction(connection: &PowerFlowConnection) -> Option<f64> {
    GRID_DIRECTIONS
        .iter()
        .find(|(from, to, _)| {
            connection.from.eq_ignore_ascii_case(from) && connection.to.eq_ignore_ascii_case(to)
        })
        .map(|(_, _, sign)| *sign)
}

/// Signed, unit-normalized power flow in watts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowView {
    pub pv: f64,
    pub grid: f64,
    pub battery: f64,
    pub soc: f64,
}

impl FlowView {
    pub fn from_power_flow(flow: &PowerFlow, policy: BatterySignPolicy) -> Self {
        let unit_scale = unit_factor(&flow.unit);
        let mut view = Self::default();

        if let Some(pv) = &flow.pv {
            view.pv = pv.current_power * unit_scale;
        }

        if let Some(storage) = &flow.storage {
            view.battery =
                storage.current_power * policy.battery_scale(&storage.status) * unit_scale;
            view.soc = f64::from(storage.charge_level);
        }

        // First grid-facing connection wins
        if let Some(sign) = flow.connections.iter().find_map(flow_direction) {
            view.grid = flow.grid.current_power * sign * unit_scale;
        }

        view
    }
}
