//! Query/selection engine -- the live occupancy index plus the user's table selection.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::index::OccupancyIndex;
use crate::record::{RecordSet, Reservation};
use crate::slot::{DateKey, DateWindow, HourSlot, TableId};

/// The table currently chosen by the user, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Selection(Option<TableId>);

impl Selection {
    pub const NONE: Selection = Selection(None);

    pub fn table(self) -> Option<TableId> {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0.is_none()
    }

    pub fn is(self, table: TableId) -> bool {
        self.0 == Some(table)
    }
}

/// Whether a table can be booked for a given date and hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableState {
    Free,
    Occupied,
}

/// Owns the occupancy index for the current window and the selection state.
///
/// The engine never clears a selection on its own when the table it points at
/// becomes occupied; callers use [`BookingEngine::renderable_state`] and call
/// [`BookingEngine::clear_selection`] themselves.
#[derive(Debug, Clone, Default)]
pub struct BookingEngine {
    index: OccupancyIndex,
    window: Option<DateWindow>,
    selection: Selection,
}

impl BookingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from freshly fetched records.
    ///
    /// On a validation fault the current index, window and selection are kept.
    pub fn rebuild(&mut self, records: &RecordSet, window: DateWindow) -> Result<&OccupancyIndex> {
        let index = OccupancyIndex::build(records, &window)?;
        self.replace_index(index, window);
        Ok(&self.index)
    }

    /// Swap in an already-built index. Resets the selection.
    pub fn replace_index(&mut self, index: OccupancyIndex, window: DateWindow) {
        self.index = index;
        self.window = Some(window);
        if let Some(table) = self.selection.table() {
            debug!(%table, "selection reset by index rebuild");
        }
        self.selection = Selection::NONE;
    }

    pub fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    /// Window of the last successful rebuild.
    pub fn window(&self) -> Option<&DateWindow> {
        self.window.as_ref()
    }

    pub fn is_free(&self, date: DateKey, hour: HourSlot, table: TableId) -> bool {
        self.index.is_free(date, hour, table)
    }

    pub fn is_span_free(&self, reservation: &Reservation) -> bool {
        self.index.is_span_free(reservation)
    }

    pub fn first_conflict(&self, reservation: &Reservation) -> Option<HourSlot> {
        self.index.first_conflict(reservation)
    }

    /// Fold a reservation into the live index without a re-fetch.
    pub fn mark_occupied(&mut self, reservation: &Reservation) {
        self.index.mark(reservation);
    }

    /// Toggle `table`: selecting the selected table clears the selection,
    /// selecting any other table replaces it.
    pub fn select(&mut self, table: TableId) -> Selection {
        self.selection = if self.selection.is(table) {
            Selection::NONE
        } else {
            Selection(Some(table))
        };
        self.selection
    }

    pub fn clear_selection(&mut self) -> Selection {
        self.selection = Selection::NONE;
        self.selection
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Free/occupied state of each of `tables` at `date`/`hour`.
    pub fn renderable_state(
        &self,
        date: DateKey,
        hour: HourSlot,
        tables: &[TableId],
    ) -> BTreeMap<TableId, TableState> {
        tables
            .iter()
            .map(|&table| {
                let state = if self.is_free(date, hour, table) {
                    TableState::Free
                } else {
                    TableState::Occupied
                };
                (table, state)
            })
            .collect()
    }
}
