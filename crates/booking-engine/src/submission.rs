//! Booking submission -- re-check, send, then fold the result into the index.
//!
//! Nothing is marked before the backend confirms. A failed submission leaves the
//! index exactly as it was; a confirmed one is marked with the same operation the
//! index builder uses, so queries reflect it without a re-fetch.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OpeningHours;
use crate::engine::BookingEngine;
use crate::error::{BookingError, Result, TransportError};
use crate::record::Reservation;
use crate::slot::{DateKey, HourSlot, SlotDuration, TableId};

/// A reservation request as posted to the backend.
///
/// `people`, `starters`, `phone` and `address` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub date: DateKey,
    pub hour: HourSlot,
    pub table: TableId,
    pub duration: SlotDuration,
    #[serde(rename = "ppl", default = "default_people")]
    pub people: u32,
    #[serde(default)]
    pub starters: Vec<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

fn default_people() -> u32 {
    1
}

impl BookingRequest {
    pub fn new(date: DateKey, hour: HourSlot, duration: SlotDuration, table: TableId) -> Self {
        Self {
            date,
            hour,
            table,
            duration,
            people: default_people(),
            starters: Vec::new(),
            phone: String::new(),
            address: String::new(),
        }
    }

    pub fn with_people(mut self, people: u32) -> Self {
        self.people = people;
        self
    }

    pub fn with_starter(mut self, starter: impl Into<String>) -> Self {
        self.starters.push(starter.into());
        self
    }

    pub fn with_contact(mut self, phone: impl Into<String>, address: impl Into<String>) -> Self {
        self.phone = phone.into();
        self.address = address.into();
        self
    }

    pub fn reservation(&self) -> Result<Reservation> {
        Reservation::new(self.date, self.hour, self.duration, self.table)
    }

    /// Human-readable confirmation shown to the guest.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BookingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = if self.duration.half_hours() == 2 { "hour" } else { "hours" };
        let people = if self.people == 1 { "person" } else { "people" };
        write!(
            f,
            "Order summary: {} at {}, table {}, for {} {} and {} {}",
            self.date, self.hour, self.table, self.duration, hours, self.people, people
        )?;
        if !self.starters.is_empty() {
            write!(f, ", starters: {}", self.starters.join(", "))?;
        }
        f.write_str(".")
    }
}

/// Where confirmed bookings are sent.
#[async_trait]
pub trait BookingBackend {
    async fn submit(&self, request: &BookingRequest) -> std::result::Result<(), TransportError>;
}

/// A request that passed validation and the availability re-check.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBooking {
    request: BookingRequest,
    reservation: Reservation,
}

impl PreparedBooking {
    pub fn request(&self) -> &BookingRequest {
        &self.request
    }

    pub fn reservation(&self) -> &Reservation {
        &self.reservation
    }
}

/// Result of a booking the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub reservation: Reservation,
    pub summary: String,
}

/// Coordinates validation, submission and index update for new bookings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingCoordinator {
    hours: Option<OpeningHours>,
}

impl BookingCoordinator {
    /// A coordinator that does not restrict reservations to opening hours.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opening_hours(hours: OpeningHours) -> Self {
        Self { hours: Some(hours) }
    }

    /// Validate `request` and check that every slot it needs is still free.
    ///
    /// The date must fall inside the window of the engine's last rebuild;
    /// outside it recurring events were never expanded.
    pub fn prepare(&self, engine: &BookingEngine, request: BookingRequest) -> Result<PreparedBooking> {
        let reservation = self.validate(&request)?;
        let window = engine.window().ok_or(BookingError::NotLoaded)?;
        if !window.contains(reservation.date()) {
            warn!(date = %reservation.date(), %window, "booking rejected: outside window");
            return Err(BookingError::OutsideWindow {
                date: reservation.date(),
                window: *window,
            });
        }
        if let Some(hour) = engine.first_conflict(&reservation) {
            warn!(
                date = %reservation.date(),
                %hour,
                table = %reservation.table(),
                "booking rejected: slot unavailable"
            );
            return Err(BookingError::SlotUnavailable {
                date: reservation.date(),
                hour,
                table: reservation.table(),
            });
        }
        Ok(PreparedBooking {
            request,
            reservation,
        })
    }

    /// Mark a prepared booking the backend has accepted.
    pub fn commit(&self, engine: &mut BookingEngine, prepared: PreparedBooking) -> BookingReceipt {
        engine.mark_occupied(&prepared.reservation);
        info!(
            date = %prepared.reservation.date(),
            hour = %prepared.reservation.start(),
            duration = %prepared.reservation.duration(),
            table = %prepared.reservation.table(),
            "booking confirmed"
        );
        BookingReceipt {
            reservation: prepared.reservation,
            summary: prepared.request.summary(),
        }
    }

    /// Mark a booking the backend accepted through a transport the host owns.
    ///
    /// Skips the availability check: the server's acceptance is authoritative.
    pub fn confirm(&self, engine: &mut BookingEngine, request: BookingRequest) -> Result<BookingReceipt> {
        let reservation = self.validate(&request)?;
        Ok(self.commit(
            engine,
            PreparedBooking {
                request,
                reservation,
            },
        ))
    }

    /// Re-check availability, submit, and mark the index only on success.
    ///
    /// The engine stays mutably borrowed while the backend call is pending.
    /// Hosts that must keep rendering availability during the request should
    /// call [`prepare`](Self::prepare), send the request themselves, then
    /// [`commit`](Self::commit).
    pub async fn submit_booking<B>(
        &self,
        engine: &mut BookingEngine,
        backend: &B,
        request: BookingRequest,
    ) -> Result<BookingReceipt>
    where
        B: BookingBackend + ?Sized,
    {
        let prepared = self.prepare(engine, request)?;
        if let Err(e) = backend.submit(prepared.request()).await {
            warn!(error = %e, table = %prepared.reservation.table(), "booking submission failed");
            return Err(BookingError::BookingFailed(e));
        }
        Ok(self.commit(engine, prepared))
    }

    fn validate(&self, request: &BookingRequest) -> Result<Reservation> {
        let reservation = request.reservation()?;
        if let Some(hours) = self.hours {
            if !hours.contains(&reservation) {
                return Err(BookingError::OutsideOpeningHours {
                    start: reservation.start(),
                    end: reservation.end(),
                    open: hours.open,
                    close: hours.close,
                });
            }
        }
        Ok(reservation)
    }
}
