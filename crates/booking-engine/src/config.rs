//! Engine configuration: backend endpoints, opening hours, date-picker range.
//!
//! Loaded from TOML. Every section and field is optional; missing values fall
//! back to the defaults of the reference restaurant deployment.
//!
//! ```toml
//! window_days = 14
//!
//! [db]
//! url = "http://localhost:3131"
//! bookings = "booking"
//! events = "event"
//!
//! [hours]
//! open = 12
//! close = 24
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::record::Reservation;
use crate::slot::{DateWindow, HourSlot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub db: DbSettings,
    pub hours: OpeningHours,
    /// Days after today that the date picker still offers.
    pub window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db: DbSettings::default(),
            hours: OpeningHours::default(),
            window_days: 14,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(BookingError::Config("window_days must be at least 1".to_string()));
        }
        if self.hours.open >= self.hours.close {
            return Err(BookingError::Config(format!(
                "opening hour {} must be before closing hour {}",
                self.hours.open, self.hours.close
            )));
        }
        if self.db.url.trim().is_empty() {
            return Err(BookingError::Config("db.url must not be empty".to_string()));
        }
        Ok(())
    }

    /// The booking window the date picker offers when opened on `today`.
    pub fn window_from(&self, today: NaiveDate) -> Result<DateWindow> {
        DateWindow::starting(today, self.window_days)
    }
}

/// Backend endpoint paths and query parameter names.
///
/// `not_repeat_param` and `repeat_param` are complete `key=value` filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub url: String,
    pub bookings: String,
    pub events: String,
    pub date_start_param: String,
    pub date_end_param: String,
    pub not_repeat_param: String,
    pub repeat_param: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3131".to_string(),
            bookings: "booking".to_string(),
            events: "event".to_string(),
            date_start_param: "date_gte".to_string(),
            date_end_param: "date_lte".to_string(),
            not_repeat_param: "repeat=false".to_string(),
            repeat_param: "repeat_ne=false".to_string(),
        }
    }
}

impl DbSettings {
    /// Join the base url and a collection path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Venue opening hours. A reservation must start at or after `open` and end at
/// or before `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub open: HourSlot,
    pub close: HourSlot,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            open: HourSlot::from_half_hours(24),
            close: HourSlot::from_half_hours(48),
        }
    }
}

impl OpeningHours {
    pub fn contains(&self, reservation: &Reservation) -> bool {
        self.open <= reservation.start() && reservation.end() <= self.close
    }
}
