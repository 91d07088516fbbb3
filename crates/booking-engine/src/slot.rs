//! Calendar primitives: dates, half-hour slots, durations, tables and date windows.
//!
//! Hours travel over the wire either as numbers (`12.5`) or as clock strings
//! (`"12:30"`). Internally every hour and duration is a count of half hours so
//! that slots are exact, totally ordered map keys.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BookingError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Convert a fractional hour value into a count of half hours.
///
/// Returns `None` for negative, non-finite, or off-grid values.
fn to_half_hours(hours: f64) -> Option<u16> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let doubled = hours * 2.0;
    if doubled.fract() != 0.0 || doubled > f64::from(u16::MAX) {
        return None;
    }
    Some(doubled as u16)
}

// ---------------------------------------------------------------------------
// DateKey
// ---------------------------------------------------------------------------

/// A calendar date in canonical `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DateKey {
    type Err = BookingError;

    /// Only the canonical zero-padded form is accepted, so that
    /// `parse(s).to_string() == s` for every accepted `s`.
    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| BookingError::InvalidDate(s.to_string()))?;
        if date.format(DATE_FORMAT).to_string() != s {
            return Err(BookingError::InvalidDate(s.to_string()));
        }
        Ok(Self(date))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// HourSlot
// ---------------------------------------------------------------------------

/// Start of a 30-minute slot, counted in half hours since midnight.
///
/// `HourSlot::from_hours(12.5)` and `"12:30".parse::<HourSlot>()` are the same
/// slot. Values of 24 and above are legal: a reservation that runs past
/// midnight keeps its trailing slots on the day it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourSlot(u16);

impl HourSlot {
    pub fn from_half_hours(half_hours: u16) -> Self {
        Self(half_hours)
    }

    pub fn from_hours(hours: f64) -> Result<Self> {
        to_half_hours(hours)
            .map(Self)
            .ok_or_else(|| BookingError::InvalidHour(hours.to_string()))
    }

    /// Parse a clock string such as `"18:00"` or `"9:30"`.
    pub fn from_clock(clock: &str) -> Result<Self> {
        let invalid = || BookingError::InvalidHour(clock.to_string());
        let (hours, minutes) = clock.trim().split_once(':').ok_or_else(invalid)?;
        if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let half = match minutes {
            "00" => 0,
            "30" => 1,
            _ => return Err(invalid()),
        };
        hours
            .checked_mul(2)
            .and_then(|h| h.checked_add(half))
            .map(Self)
            .ok_or_else(invalid)
    }

    pub fn half_hours(self) -> u16 {
        self.0
    }

    pub fn hours(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// The slot `duration` after this one, or `None` on overflow.
    pub fn checked_add(self, duration: SlotDuration) -> Option<Self> {
        self.0.checked_add(duration.half_hours()).map(Self)
    }
}

impl FromStr for HourSlot {
    type Err = BookingError;

    /// Accepts clock strings (`"12:30"`) and decimal hours (`"12.5"`).
    fn from_str(s: &str) -> Result<Self> {
        if s.contains(':') {
            return Self::from_clock(s);
        }
        let hours: f64 = s
            .trim()
            .parse()
            .map_err(|_| BookingError::InvalidHour(s.to_string()))?;
        Self::from_hours(hours)
    }
}

impl fmt::Display for HourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = if self.0 % 2 == 0 { 0 } else { 30 };
        write!(f, "{:02}:{:02}", self.0 / 2, minutes)
    }
}

impl Serialize for HourSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct HourSlotVisitor;

impl<'de> Visitor<'de> for HourSlotVisitor {
    type Value = HourSlot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an hour as a number (12.5) or clock string (\"12:30\")")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<HourSlot, E> {
        HourSlot::from_hours(v as f64).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<HourSlot, E> {
        HourSlot::from_hours(v as f64).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<HourSlot, E> {
        HourSlot::from_hours(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<HourSlot, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for HourSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(HourSlotVisitor)
    }
}

// ---------------------------------------------------------------------------
// SlotDuration
// ---------------------------------------------------------------------------

/// Length of a reservation: a positive whole number of half hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotDuration(u16);

impl SlotDuration {
    pub fn from_half_hours(half_hours: u16) -> Result<Self> {
        if half_hours == 0 {
            return Err(BookingError::InvalidDuration("0".to_string()));
        }
        Ok(Self(half_hours))
    }

    pub fn from_hours(hours: f64) -> Result<Self> {
        to_half_hours(hours)
            .filter(|&n| n > 0)
            .map(Self)
            .ok_or_else(|| BookingError::InvalidDuration(hours.to_string()))
    }

    /// Number of 30-minute slots this duration covers.
    pub fn half_hours(self) -> u16 {
        self.0
    }

    pub fn hours(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl fmt::Display for SlotDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl Serialize for SlotDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.hours())
    }
}

impl<'de> Deserialize<'de> for SlotDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hours = f64::deserialize(deserializer)?;
        SlotDuration::from_hours(hours).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TableId
// ---------------------------------------------------------------------------

/// Identifier of a physical table on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TableId(u32);

impl TableId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Accept a JSON number only if it is a non-negative integer within `u32`.
    pub fn from_number(value: f64) -> Result<Self> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX)
        {
            Ok(Self(value as u32))
        } else {
            Err(BookingError::InvalidTable(value.to_string()))
        }
    }
}

impl FromStr for TableId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| BookingError::InvalidTable(s.to_string()))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TableId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

struct TableIdVisitor;

impl<'de> Visitor<'de> for TableIdVisitor {
    type Value = TableId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a table id as a number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<TableId, E> {
        u32::try_from(v)
            .map(TableId)
            .map_err(|_| E::custom(BookingError::InvalidTable(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<TableId, E> {
        u32::try_from(v)
            .map(TableId)
            .map_err(|_| E::custom(BookingError::InvalidTable(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<TableId, E> {
        TableId::from_number(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<TableId, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for TableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TableIdVisitor)
    }
}

// ---------------------------------------------------------------------------
// DateWindow
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` range of dates the widget shows and accepts bookings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    min_date: DateKey,
    max_date: DateKey,
}

impl DateWindow {
    pub fn new(min_date: DateKey, max_date: DateKey) -> Result<Self> {
        if min_date > max_date {
            return Err(BookingError::InvalidWindow(format!(
                "{min_date} is after {max_date}"
            )));
        }
        Ok(Self { min_date, max_date })
    }

    pub fn parse(min_date: &str, max_date: &str) -> Result<Self> {
        Self::new(min_date.parse()?, max_date.parse()?)
    }

    /// A window opening on `today` and closing `days_ahead` days later.
    pub fn starting(today: NaiveDate, days_ahead: u32) -> Result<Self> {
        let max = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .ok_or_else(|| {
                BookingError::InvalidWindow(format!("{today} + {days_ahead} days is out of range"))
            })?;
        Self::new(DateKey(today), DateKey(max))
    }

    pub fn min_date(&self) -> DateKey {
        self.min_date
    }

    pub fn max_date(&self) -> DateKey {
        self.max_date
    }

    pub fn contains(&self, date: DateKey) -> bool {
        self.min_date <= date && date <= self.max_date
    }

    /// Number of calendar days in the window, both ends included.
    pub fn len_days(&self) -> u64 {
        (self.max_date.0 - self.min_date.0).num_days() as u64 + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min_date, self.max_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_round_trips_canonical_form() {
        let key: DateKey = "2024-03-10".parse().unwrap();
        assert_eq!(key.to_string(), "2024-03-10");
    }

    #[test]
    fn date_key_rejects_unpadded_and_garbage() {
        assert!("2024-3-10".parse::<DateKey>().is_err());
        assert!("2024-02-30".parse::<DateKey>().is_err());
        assert!(" 2024-03-10".parse::<DateKey>().is_err());
        assert!("tomorrow".parse::<DateKey>().is_err());
    }

    #[test]
    fn hour_slot_accepts_numbers_and_clock_strings() {
        assert_eq!("12:30".parse::<HourSlot>().unwrap(), HourSlot::from_hours(12.5).unwrap());
        assert_eq!("9:00".parse::<HourSlot>().unwrap().half_hours(), 18);
        assert_eq!("18.5".parse::<HourSlot>().unwrap().to_string(), "18:30");
    }

    #[test]
    fn hour_slot_rejects_off_grid_values() {
        assert!(HourSlot::from_hours(12.25).is_err());
        assert!(HourSlot::from_hours(-0.5).is_err());
        assert!(HourSlot::from_hours(f64::NAN).is_err());
        assert!("12:15".parse::<HourSlot>().is_err());
        assert!("12:3".parse::<HourSlot>().is_err());
        assert!(":30".parse::<HourSlot>().is_err());
    }

    #[test]
    fn duration_must_be_positive_half_hours() {
        assert_eq!(SlotDuration::from_hours(1.5).unwrap().half_hours(), 3);
        assert!(SlotDuration::from_hours(0.0).is_err());
        assert!(SlotDuration::from_hours(-1.0).is_err());
        assert!(SlotDuration::from_hours(0.75).is_err());
        assert!(SlotDuration::from_hours(f64::INFINITY).is_err());
    }

    #[test]
    fn duration_display_drops_trailing_zero() {
        assert_eq!(SlotDuration::from_hours(2.0).unwrap().to_string(), "2");
        assert_eq!(SlotDuration::from_hours(1.5).unwrap().to_string(), "1.5");
    }

    #[test]
    fn table_id_deserializes_from_number_or_string() {
        let a: TableId = serde_json::from_str("4").unwrap();
        let b: TableId = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<TableId>("-1").is_err());
        assert!(serde_json::from_str::<TableId>("\"window\"").is_err());
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(DateWindow::parse("2024-01-03", "2024-01-01").is_err());
        let w = DateWindow::parse("2024-01-01", "2024-01-01").unwrap();
        assert_eq!(w.len_days(), 1);
    }

    #[test]
    fn window_contains_both_ends_only() {
        let w = DateWindow::parse("2024-02-28", "2024-03-01").unwrap();
        assert!(w.contains("2024-02-28".parse().unwrap()));
        assert!(w.contains("2024-02-29".parse().unwrap()));
        assert!(w.contains("2024-03-01".parse().unwrap()));
        assert!(!w.contains("2024-02-27".parse().unwrap()));
        assert!(!w.contains("2024-03-02".parse().unwrap()));
    }

    #[test]
    fn window_starting_today_spans_days_ahead_inclusive() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let w = DateWindow::starting(today, 14).unwrap();
        assert_eq!(w.max_date().to_string(), "2025-01-08");
        assert_eq!(w.len_days(), 15);
    }
}
