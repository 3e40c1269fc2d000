//! Site-local timestamps
//!
//! The monitoring API exchanges timestamps as `YYYY-MM-DD HH:MM:SS` without
//! an offset; they are wall-clock times in the zone of the site. Payloads keep
//! the wall-clock value as a [`SiteTimestamp`] and a [`SiteZone`], built once at
//! startup and passed by reference, turns them into instants and back.

use crate::error::{Result, SolarEdgeError};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire format of every timestamp the API sends or accepts
pub const DATETIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Time zone the site's wall-clock timestamps are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteZone {
    /// Zone of the host running the process
    #[default]
    Local,
    /// Named IANA zone
    Named(Tz),
}

impl SiteZone {
    /// Resolve an IANA zone name such as `Europe/Berlin`
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim().parse::<Tz>().map(Self::Named).map_err(|_| {
            SolarEdgeError::config(format!(
                "unknown timezone {name:?}, please use a name from the IANA time zone database"
            ))
        })
    }

    /// Zone from an optional configured name; `None` or blank means host local
    pub fn from_optional_name(name: Option<&str>) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::Local),
            Some(n) => Self::from_name(n),
        }
    }

    /// Attach this zone to a wall-clock time.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// that do not exist in the zone (DST spring-forward gap) are rejected.
    pub fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        let resolved = match self {
            Self::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Self::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        };
        resolved.ok_or_else(|| {
            SolarEdgeError::validation(
                "datetime".to_string(),
                format!("{naive} does not exist in zone {self}"),
            )
        })
    }

    /// Parse a wire timestamp into an instant in this zone
    pub fn parse(&self, value: &str) -> Result<DateTime<FixedOffset>> {
        let naive = NaiveDateTime::parse_from_str(value.trim(), DATETIME_PATTERN)?;
        self.localize(naive)
    }

    /// Wall-clock time of `instant` in this zone
    pub fn wall_clock<T: TimeZone>(&self, instant: &DateTime<T>) -> NaiveDateTime {
        match self {
            Self::Local => instant.with_timezone(&Local).naive_local(),
            Self::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Render `instant` in the wire format, as wall-clock time in this zone
    pub fn format<T: TimeZone>(&self, instant: &DateTime<T>) -> String {
        self.wall_clock(instant).format(DATETIME_PATTERN).to_string()
    }

    /// Resolve a decoded payload timestamp to an instant
    pub fn instant(&self, ts: SiteTimestamp) -> Result<DateTime<FixedOffset>> {
        self.localize(ts.0)
    }
}

impl fmt::Display for SiteZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Wall-clock timestamp as sent by the API, still without a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SiteTimestamp(pub NaiveDateTime);

impl SiteTimestamp {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(Self(NaiveDateTime::parse_from_str(
            value.trim(),
            DATETIME_PATTERN,
        )?))
    }
}

impl fmt::Display for SiteTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATETIME_PATTERN))
    }
}

impl From<NaiveDateTime> for SiteTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl Serialize for SiteTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SiteTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), DATETIME_PATTERN)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
