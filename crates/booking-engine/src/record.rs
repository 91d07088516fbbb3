//! Raw reservation records as fetched from the backend, and their normalized form.
//!
//! Records arrive loosely typed: hours may be numbers or clock strings, table ids
//! may be numbers or numeric strings. They are kept raw until the index builder
//! normalizes them. [`parse_collection`] decodes a fetched JSON array element by
//! element, so a record with a missing or wrongly typed field (`"table": null`)
//! is reported with its collection and position like any other invalid record.

use std::fmt;
use std::ops::Range;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result, TransportError};
use crate::recurrence::RepeatRule;
use crate::slot::{DateKey, HourSlot, SlotDuration, TableId};

/// Which fetched collection a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Booking,
    SingleEvent,
    RecurringEvent,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Booking => "booking",
            RecordKind::SingleEvent => "single event",
            RecordKind::RecurringEvent => "recurring event",
        })
    }
}

/// A loosely typed JSON scalar: either a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn to_hour(&self) -> Result<HourSlot> {
        match self {
            Scalar::Number(n) => HourSlot::from_hours(*n),
            Scalar::Text(s) => s.parse(),
        }
    }

    pub fn to_table(&self) -> Result<TableId> {
        match self {
            Scalar::Number(n) => TableId::from_number(*n),
            Scalar::Text(s) => s.parse(),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Number(f64::from(n))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// A booking or single (non-recurring) event with a concrete date.
///
/// Extra fields the backend stores alongside (`id`, `ppl`, `phone`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub hour: Scalar,
    pub duration: f64,
    pub table: Scalar,
}

impl RawRecord {
    pub fn new(date: &str, hour: f64, duration: f64, table: u32) -> Self {
        Self {
            date: date.to_string(),
            hour: Scalar::from(hour),
            duration,
            table: Scalar::from(table),
        }
    }

    pub fn to_reservation(&self) -> Result<Reservation> {
        Reservation::new(
            self.date.parse()?,
            self.hour.to_hour()?,
            SlotDuration::from_hours(self.duration)?,
            self.table.to_table()?,
        )
    }
}

/// An event that repeats according to `repeat` and has no concrete date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRecord {
    pub repeat: RepeatRule,
    pub hour: Scalar,
    pub duration: f64,
    pub table: Scalar,
}

impl RecurringRecord {
    pub fn new(repeat: RepeatRule, hour: f64, duration: f64, table: u32) -> Self {
        Self {
            repeat,
            hour: Scalar::from(hour),
            duration,
            table: Scalar::from(table),
        }
    }

    /// Validate the time/table fields and return a reservation anchored on
    /// `date`, ready to be moved onto each expanded occurrence.
    pub fn template(&self, date: DateKey) -> Result<Reservation> {
        Reservation::new(
            date,
            self.hour.to_hour()?,
            SlotDuration::from_hours(self.duration)?,
            self.table.to_table()?,
        )
    }
}

/// The three collections that feed one index rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    #[serde(default)]
    pub bookings: Vec<RawRecord>,
    #[serde(default, alias = "eventsCurrent")]
    pub single_events: Vec<RawRecord>,
    #[serde(default, alias = "eventsRepeat")]
    pub recurring_events: Vec<RecurringRecord>,
}

impl RecordSet {
    /// Decode the three fetched JSON arrays.
    pub fn from_json(bookings: &str, single_events: &str, recurring_events: &str) -> Result<Self> {
        Ok(Self {
            bookings: parse_collection(RecordKind::Booking, bookings)?,
            single_events: parse_collection(RecordKind::SingleEvent, single_events)?,
            recurring_events: parse_collection(RecordKind::RecurringEvent, recurring_events)?,
        })
    }

    pub fn len(&self) -> usize {
        self.bookings.len() + self.single_events.len() + self.recurring_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode one fetched collection.
///
/// A body that is not a JSON array is a malformed response. An element that
/// does not have the record's shape fails with its position attached.
pub fn parse_collection<T: DeserializeOwned>(kind: RecordKind, json: &str) -> Result<Vec<T>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| {
        BookingError::RefreshFailed(TransportError::MalformedResponse(format!("{kind} collection: {e}")))
    })?;
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value(item)
                .map_err(|e| BookingError::MalformedRecord(e.to_string()).in_record(kind, position))
        })
        .collect()
}

/// A validated `{date, hour, duration, table}` reservation.
///
/// Its slots form the contiguous half-open run `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reservation {
    date: DateKey,
    start: HourSlot,
    duration: SlotDuration,
    table: TableId,
}

impl Reservation {
    pub fn new(date: DateKey, start: HourSlot, duration: SlotDuration, table: TableId) -> Result<Self> {
        if start.checked_add(duration).is_none() {
            return Err(BookingError::InvalidDuration(format!(
                "{duration} hours from {start} overflows the day grid"
            )));
        }
        Ok(Self {
            date,
            start,
            duration,
            table,
        })
    }

    pub fn date(&self) -> DateKey {
        self.date
    }

    pub fn start(&self) -> HourSlot {
        self.start
    }

    pub fn duration(&self) -> SlotDuration {
        self.duration
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    /// First slot after the reservation (exclusive end).
    pub fn end(&self) -> HourSlot {
        HourSlot::from_half_hours(self.start.half_hours() + self.duration.half_hours())
    }

    /// Every slot the reservation occupies, in ascending order.
    pub fn slots(&self) -> Slots {
        Slots {
            range: self.start.half_hours()..self.end().half_hours(),
        }
    }

    /// The same reservation moved to another date.
    pub fn on(&self, date: DateKey) -> Self {
        Self { date, ..*self }
    }
}

/// Iterator over the slots of a [`Reservation`].
#[derive(Debug, Clone)]
pub struct Slots {
    range: Range<u16>,
}

impl Iterator for Slots {
    type Item = HourSlot;

    fn next(&mut self) -> Option<HourSlot> {
        self.range.next().map(HourSlot::from_half_hours)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for Slots {}
