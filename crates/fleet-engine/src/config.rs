//! Tunables for the availability engine.
//!
//! Every field has a default, so an empty TOML/JSON document is a valid
//! configuration.

use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub season: SeasonConfig,
    pub slot_search: SlotSearchConfig,
    /// Insert a charging reservation automatically when a driving request
    /// fails only for lack of range.
    pub auto_insert_charging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            season: SeasonConfig::default(),
            slot_search: SlotSearchConfig::default(),
            auto_insert_charging: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let SeasonConfig {
            summer_start_month: start,
            summer_end_month: end,
            ..
        } = self.season;
        if !(1..=12).contains(&start) || !(1..=12).contains(&end) {
            return Err(FleetError::Config(format!(
                "summer months must be within 1..=12, got {start}..={end}"
            )));
        }
        if start > end {
            return Err(FleetError::Config(format!(
                "summer start month {start} is after end month {end}"
            )));
        }
        let step = self.slot_search.step_minutes;
        if step == 0 || 60 % step != 0 {
            return Err(FleetError::Config(format!(
                "slot search step must divide an hour, got {step} minutes"
            )));
        }
        Ok(())
    }
}

/// Which months use the summer range, and in which timezone the month is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub summer_start_month: u32,
    pub summer_end_month: u32,
    pub timezone: Tz,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            summer_start_month: 4,
            summer_end_month: 9,
            timezone: Tz::UTC,
        }
    }
}

impl SeasonConfig {
    /// True when the local calendar month of `time` falls in the summer months.
    pub fn is_summer(&self, time: DateTime<Utc>) -> bool {
        let month = time.with_timezone(&self.timezone).month();
        (self.summer_start_month..=self.summer_end_month).contains(&month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSearchConfig {
    /// How far back from the requested instant the search may go.
    pub horizon_hours: u32,
    /// Grid the candidate window is anchored to and stepped along.
    pub step_minutes: u32,
    /// Gap placed before a found window in the recommended start.
    pub spacing_minutes: u32,
}

impl Default for SlotSearchConfig {
    fn default() -> Self {
        Self {
            horizon_hours: 72,
            step_minutes: 30,
            spacing_minutes: 30,
        }
    }
}

impl SlotSearchConfig {
    pub fn horizon(&self) -> Duration {
        Duration::hours(i64::from(self.horizon_hours))
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    pub fn spacing(&self) -> Duration {
        Duration::minutes(i64::from(self.spacing_minutes))
    }
}
