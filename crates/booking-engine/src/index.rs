//! Occupancy index -- date → half-hour slot → tables occupying that slot.
//!
//! Both levels of the map are sparse. A missing date or a missing slot means
//! every table is free there; lookups check existence at each level instead of
//! assuming a default.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::record::{RawRecord, RecordKind, RecordSet, RecurringRecord, Reservation};
use crate::recurrence;
use crate::slot::{DateKey, DateWindow, HourSlot, TableId};

/// Tables occupying each slot of one day.
pub type DaySlots = BTreeMap<HourSlot, Vec<TableId>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OccupancyIndex {
    days: BTreeMap<DateKey, DaySlots>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the three fetched collections.
    ///
    /// Bookings and single events are marked on their own date; recurring events
    /// are expanded over `window` first. The first record that fails validation
    /// aborts the build with its collection and position attached.
    pub fn build(records: &RecordSet, window: &DateWindow) -> Result<Self> {
        rebuild(
            &records.bookings,
            &records.single_events,
            &records.recurring_events,
            window,
        )
    }

    /// Mark every slot of `reservation` as occupied by its table.
    ///
    /// A table already present in a slot is appended again; membership, not
    /// count, is what queries look at.
    pub fn mark(&mut self, reservation: &Reservation) {
        let day = self.days.entry(reservation.date()).or_default();
        for slot in reservation.slots() {
            day.entry(slot).or_default().push(reservation.table());
        }
    }

    pub fn is_free(&self, date: DateKey, hour: HourSlot, table: TableId) -> bool {
        let Some(day) = self.days.get(&date) else {
            return true;
        };
        let Some(tables) = day.get(&hour) else {
            return true;
        };
        !tables.contains(&table)
    }

    /// First slot of `reservation` whose table is already taken, if any.
    pub fn first_conflict(&self, reservation: &Reservation) -> Option<HourSlot> {
        reservation
            .slots()
            .find(|&slot| !self.is_free(reservation.date(), slot, reservation.table()))
    }

    pub fn is_span_free(&self, reservation: &Reservation) -> bool {
        self.first_conflict(reservation).is_none()
    }

    /// Tables occupying `hour` on `date`, in marking order. Empty when free.
    pub fn occupied_tables(&self, date: DateKey, hour: HourSlot) -> &[TableId] {
        self.days
            .get(&date)
            .and_then(|day| day.get(&hour))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Dates with at least one marked slot, ascending.
    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.days.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total number of (date, slot) entries.
    pub fn slot_count(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }
}

/// Build a fresh index from bookings, single events and recurring events.
pub fn rebuild(
    bookings: &[RawRecord],
    single_events: &[RawRecord],
    recurring_events: &[RecurringRecord],
    window: &DateWindow,
) -> Result<OccupancyIndex> {
    let mut index = OccupancyIndex::new();

    mark_dated(&mut index, bookings, RecordKind::Booking)?;
    mark_dated(&mut index, single_events, RecordKind::SingleEvent)?;

    for (position, record) in recurring_events.iter().enumerate() {
        let template = record
            .template(window.min_date())
            .map_err(|e| e.in_record(RecordKind::RecurringEvent, position))?;
        if !record.repeat.is_supported() {
            debug!(rule = %record.repeat, position, "skipping recurring event with unsupported rule");
            continue;
        }
        for date in &recurrence::expand(&record.repeat, *window) {
            index.mark(&template.on(date));
        }
    }

    debug!(
        bookings = bookings.len(),
        single_events = single_events.len(),
        recurring_events = recurring_events.len(),
        dates = index.days.len(),
        slots = index.slot_count(),
        "occupancy index rebuilt"
    );
    Ok(index)
}

fn mark_dated(index: &mut OccupancyIndex, records: &[RawRecord], kind: RecordKind) -> Result<()> {
    for (position, record) in records.iter().enumerate() {
        let reservation = record
            .to_reservation()
            .map_err(|e| e.in_record(kind, position))?;
        index.mark(&reservation);
    }
    Ok(())
}
