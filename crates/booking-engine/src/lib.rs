//! # booking-engine
//!
//! Table availability for a restaurant booking widget.
//!
//! Reservation records come from three backend collections: bookings, one-off
//! events, and events that repeat daily. The engine folds them into a single
//! occupancy index keyed by date and half-hour slot, answers "is table T free at
//! date D, hour H", tracks the user's table selection, and marks new bookings in
//! place once the backend has accepted them.
//!
//! ## Quick start
//!
//! ```rust
//! use booking_engine::{BookingEngine, DateWindow, RawRecord, RecordSet, TableId};
//!
//! let window = DateWindow::parse("2024-03-10", "2024-03-24").unwrap();
//! let records = RecordSet {
//!     bookings: vec![RawRecord::new("2024-03-10", 18.0, 1.5, 4)],
//!     ..RecordSet::default()
//! };
//!
//! let mut engine = BookingEngine::new();
//! engine.rebuild(&records, window).unwrap();
//!
//! let date = "2024-03-10".parse().unwrap();
//! assert!(!engine.is_free(date, "19:00".parse().unwrap(), TableId::new(4)));
//! assert!(engine.is_free(date, "19:30".parse().unwrap(), TableId::new(4)));
//! ```
//!
//! ## Modules
//!
//! - [`slot`] — `DateKey`, `HourSlot`, `SlotDuration`, `TableId`, `DateWindow`
//! - [`record`] — raw backend records and the normalized `Reservation`
//! - [`recurrence`] — repeat rules expanded over a date window
//! - [`index`] — the sparse date → slot → tables occupancy index
//! - [`engine`] — free/occupied queries and table selection
//! - [`source`] — record-fetch boundary and the joined refresh
//! - [`submission`] — booking submission boundary and coordinator
//! - [`config`] — endpoints, opening hours, booking window length
//! - [`error`] — Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod record;
pub mod recurrence;
pub mod slot;
pub mod source;
pub mod submission;

pub use config::{DbSettings, EngineConfig, OpeningHours};
pub use engine::{BookingEngine, Selection, TableState};
pub use error::{BookingError, TransportError};
pub use index::{rebuild, OccupancyIndex};
pub use record::{parse_collection, RawRecord, RecordKind, RecordSet, RecurringRecord, Reservation, Scalar};
pub use recurrence::{expand, Expansion, RepeatRule};
pub use slot::{DateKey, DateWindow, HourSlot, SlotDuration, TableId};
pub use source::{fetch_records, RecordQuery, RecordSource};
pub use submission::{BookingBackend, BookingCoordinator, BookingReceipt, BookingRequest, PreparedBooking};
