//! Command line interface
//!
//! Flags and `SOLAREDGE_*` variables override values loaded from the YAML
//! configuration; anything left unset keeps the file (or default) value.

use crate::config::Config;
use crate::error::{Result, SolarEdgeError};
use crate::types::TimeUnit;
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version = env!("APP_VERSION"), about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// API key for the monitoring API
    #[clap(long = "apikey", env = "SOLAREDGE_APIKEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the monitoring API
    #[clap(long = "baseurl", env = "SOLAREDGE_BASEURL", global = true)]
    pub base_url: Option<String>,

    /// IANA time zone of the site, e.g. `Europe/Berlin`; host zone if unset
    #[clap(long, env = "SOLAREDGE_TIMEZONE", global = true)]
    pub timezone: Option<String>,

    /// YAML configuration file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query one endpoint of a site and print the result as JSON.
    #[clap(name = "site")]
    Site(SiteArgs),

    /// Keep snapshots of a site fresh and serve them over HTTP.
    #[clap(name = "serve")]
    Serve(ServeArgs),
}

#[derive(Debug, Parser)]
pub struct SiteArgs {
    /// Site to query
    #[clap(long = "siteid", env = "SOLAREDGE_SITEID")]
    pub site_id: Option<String>,

    /// Range start (RFC 3339); defaults to `--since` before the end
    #[clap(long)]
    pub start: Option<DateTime<FixedOffset>>,

    /// Range end (RFC 3339); defaults to now
    #[clap(long)]
    pub end: Option<DateTime<FixedOffset>>,

    /// Range length when `--start` is not given
    #[clap(long, default_value = "1h")]
    pub since: humantime::Duration,

    #[command(subcommand)]
    pub query: SiteQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum SiteQuery {
    /// Site metadata
    Details,
    /// Installed equipment
    Inventory,
    /// Battery telemetry in the range
    #[clap(name = "storagedata")]
    StorageData,
    /// Power per meter in the range
    #[clap(name = "powerdetails")]
    PowerDetails,
    /// Energy per meter in the range
    #[clap(name = "energydetails")]
    EnergyDetails {
        /// Aggregation unit, e.g. `day` or `QUARTER_OF_AN_HOUR`
        #[arg(default_value = "DAY")]
        time_unit: TimeUnit,
    },
    /// Current power flow
    #[clap(name = "powerflow")]
    PowerFlow,
    /// Lifetime and period totals
    Overview,
}

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Site to relay
    #[clap(env = "SOLAREDGE_SITEID")]
    pub site_id: Option<String>,

    /// Listen address, `host:port`
    #[clap(long)]
    pub listen: Option<String>,

    /// Power flow refresh interval
    #[clap(long)]
    pub flow: Option<humantime::Duration>,

    /// Overview refresh interval
    #[clap(long)]
    pub poll: Option<humantime::Duration>,
}

impl Args {
    /// Apply every flag that was given on top of `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(key) = &self.api_key {
            config.api.api_key.clone_from(key);
        }
        if let Some(url) = &self.base_url {
            config.api.base_url.clone_from(url);
        }
        if let Some(zone) = &self.timezone {
            config.api.timezone = Some(zone.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }

        match &self.command {
            Command::Site(site) => {
                if let Some(id) = &site.site_id {
                    config.api.site_id.clone_from(id);
                }
            }
            Command::Serve(serve) => {
                if let Some(id) = &serve.site_id {
                    config.api.site_id.clone_from(id);
                }
                if let Some(listen) = &serve.listen {
                    config.relay.listen.clone_from(listen);
                }
                if let Some(flow) = &serve.flow {
                    config.relay.flow_interval_secs = flow.as_secs();
                }
                if let Some(poll) = &serve.poll {
                    config.relay.poll_interval_secs = poll.as_secs();
                }
            }
        }
    }
}

impl SiteArgs {
    /// Resolve the query range relative to `now`
    pub fn range(&self, now: DateTime<Utc>) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let end = self.end.unwrap_or_else(|| now.fixed_offset());
        let start = match self.start {
            Some(start) => start,
            None => {
                let since = chrono::Duration::from_std(*self.since)
                    .map_err(|e| SolarEdgeError::validation("since".to_string(), e.to_string()))?;
                end - since
            }
        };
        if start > end {
            return Err(SolarEdgeError::validation(
                "start",
                "Range start is after its end",
            ));
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("solaredge").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_site_query_parsing() {
        let args = parse(&["site", "--siteid", "42", "energydetails", "quarter_of_an_hour"]);
        let Command::Site(site) = &args.command else {
            panic!("expected site command");
        };
        assert_eq!(site.site_id.as_deref(), Some("42"));
        assert_eq!(
            site.query,
            SiteQuery::EnergyDetails {
                time_unit: TimeUnit::QuarterOfAnHour
            }
        );

        let args = parse(&["site", "--siteid", "42", "energydetails"]);
        let Command::Site(site) = &args.command else {
            panic!("expected site command");
        };
        assert_eq!(
            site.query,
            SiteQuery::EnergyDetails {
                time_unit: TimeUnit::Day
            }
        );
    }

    #[test]
    fn test_serve_overrides_config() {
        let args = parse(&[
            "--apikey", "secret", "--timezone", "Europe/Berlin", "serve", "1234", "--listen",
            "0.0.0.0:9000", "--flow", "30s", "--poll", "5m",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.api.api_key, "secret");
        assert_eq!(config.api.site_id, "1234");
        assert_eq!(config.api.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(config.relay.listen, "0.0.0.0:9000");
        assert_eq!(config.relay.flow_interval_secs, 30);
        assert_eq!(config.relay.poll_interval_secs, 300);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let args = parse(&["serve"]);
        let mut config = Config::default();
        config.relay.listen = "127.0.0.1:8000".to_string();
        args.apply(&mut config);
        assert_eq!(config.relay.listen, "127.0.0.1:8000");
        assert_eq!(config.relay.flow_interval_secs, 60);
    }

    #[test]
    fn test_range_defaults_to_since() {
        let args = parse(&["site", "--since", "2h", "storagedata"]);
        let Command::Site(site) = &args.command else {
            panic!("expected site command");
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let (start, end) = site.range(now).unwrap();
        assert_eq!(end, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let args = parse(&[
            "site",
            "--start",
            "2024-06-02T00:00:00+02:00",
            "--end",
            "2024-06-01T00:00:00+02:00",
            "powerdetails",
        ]);
        let Command::Site(site) = &args.command else {
            panic!("expected site command");
        };
        assert!(site.range(Utc::now()).is_err());
    }
}
