//! # SolarEdge - monitoring API client and local relay
//!
//! A typed async client for the SolarEdge monitoring API together with a
//! small HTTP relay that keeps the latest readings of one site in memory and
//! serves them as JSON and Prometheus metrics.
//!
//! ## Architecture
//!
//! - `client`: authenticated GETs and envelope decoding
//! - `site`: one method per site endpoint
//! - `types`: the vendor data model
//! - `time`: site-local timestamp codec
//! - `flow`: signed power flow view in watts
//! - `relay`: refresh loop and snapshot cache
//! - `metrics`: per-relay Prometheus gauges
//! - `web`: HTTP server for the relay
//! - `config`, `cli`, `logging`, `error`: configuration and ambient plumbing

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod metrics;
pub mod relay;
pub mod site;
pub mod time;
pub mod types;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use client::SolarEdgeClient;
pub use config::Config;
pub use error::{Result, SolarEdgeError};
pub use flow::{BatterySignPolicy, FlowView};
pub use relay::{Relay, RelayPhase, RelaySettings, SiteSource};
pub use site::SiteClient;
pub use time::{SiteTimestamp, SiteZone};
