//! Error types for booking-engine operations.

use thiserror::Error;

use crate::record::RecordKind;
use crate::slot::{DateKey, DateWindow, HourSlot, TableId};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid hour: {0} (expected a non-negative multiple of 0.5 or HH:00 / HH:30)")]
    InvalidHour(String),

    #[error("Invalid duration: {0} (expected a positive multiple of 0.5 hours)")]
    InvalidDuration(String),

    #[error("Invalid table id: {0}")]
    InvalidTable(String),

    #[error("Invalid date window: {0}")]
    InvalidWindow(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A record from one of the fetched collections could not be indexed.
    /// `position` is the 0-based index of the record within its collection.
    #[error("Invalid {collection} record at position {position}: {source}")]
    InvalidRecord {
        collection: RecordKind,
        position: usize,
        source: Box<BookingError>,
    },

    #[error("Reservation {start}-{end} is outside opening hours {open}-{close}")]
    OutsideOpeningHours {
        start: HourSlot,
        end: HourSlot,
        open: HourSlot,
        close: HourSlot,
    },

    /// Recurring events are only expanded inside the window, so availability
    /// outside it is unknown.
    #[error("Date {date} is outside the booking window {window}")]
    OutsideWindow { date: DateKey, window: DateWindow },

    #[error("No availability loaded; rebuild before booking")]
    NotLoaded,

    /// The requested reservation overlaps an occupied slot. Reported before any
    /// network call so the caller can re-render instead of retrying.
    #[error("Table {table} is not free on {date} at {hour}")]
    SlotUnavailable {
        date: DateKey,
        hour: HourSlot,
        table: TableId,
    },

    #[error("Refresh failed: {0}")]
    RefreshFailed(#[source] TransportError),

    #[error("Booking failed: {0}")]
    BookingFailed(#[source] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookingError {
    /// Attach collection/position context to a validation fault raised while
    /// normalizing a fetched record.
    pub fn in_record(self, collection: RecordKind, position: usize) -> Self {
        BookingError::InvalidRecord {
            collection,
            position,
            source: Box::new(self),
        }
    }

    /// True for faults caused by malformed input rather than by the backend or
    /// by the current occupancy state.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            BookingError::SlotUnavailable { .. }
                | BookingError::NotLoaded
                | BookingError::RefreshFailed(_)
                | BookingError::BookingFailed(_)
                | BookingError::Config(_)
        )
    }
}

/// Failure reported by a record-fetch or submission collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("rejected by server (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
