//! Record-fetch boundary and the joined refresh that feeds an index rebuild.
//!
//! The three collections are fetched concurrently and joined all-or-nothing:
//! if any fetch fails, no index is built from the others and the engine keeps
//! serving the previous one.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DbSettings;
use crate::engine::BookingEngine;
use crate::error::{BookingError, Result, TransportError};
use crate::record::{RawRecord, RecordKind, RecordSet, RecurringRecord};
use crate::slot::DateWindow;

/// The filter the backend should apply for one of the three collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordQuery {
    pub kind: RecordKind,
    /// Collection endpoint, without query string.
    pub endpoint: String,
    /// `key=value` pieces, in request order.
    pub params: Vec<String>,
}

impl RecordQuery {
    /// Bookings dated inside the window.
    pub fn bookings(window: &DateWindow, db: &DbSettings) -> Self {
        Self {
            kind: RecordKind::Booking,
            endpoint: db.endpoint(&db.bookings),
            params: vec![start_param(window, db), end_param(window, db)],
        }
    }

    /// Non-repeating events dated inside the window.
    pub fn single_events(window: &DateWindow, db: &DbSettings) -> Self {
        Self {
            kind: RecordKind::SingleEvent,
            endpoint: db.endpoint(&db.events),
            params: vec![
                db.not_repeat_param.clone(),
                start_param(window, db),
                end_param(window, db),
            ],
        }
    }

    /// Repeating events that started on or before the end of the window.
    pub fn recurring_events(window: &DateWindow, db: &DbSettings) -> Self {
        Self {
            kind: RecordKind::RecurringEvent,
            endpoint: db.endpoint(&db.events),
            params: vec![db.repeat_param.clone(), end_param(window, db)],
        }
    }

    pub fn query_string(&self) -> String {
        self.params.join("&")
    }

    pub fn url(&self) -> String {
        if self.params.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?{}", self.endpoint, self.query_string())
        }
    }
}

fn start_param(window: &DateWindow, db: &DbSettings) -> String {
    format!("{}={}", db.date_start_param, window.min_date())
}

fn end_param(window: &DateWindow, db: &DbSettings) -> String {
    format!("{}={}", db.date_end_param, window.max_date())
}

/// Source of the three record collections for a window.
#[async_trait]
pub trait RecordSource {
    async fn fetch_bookings(
        &self,
        query: &RecordQuery,
    ) -> std::result::Result<Vec<RawRecord>, TransportError>;

    async fn fetch_single_events(
        &self,
        query: &RecordQuery,
    ) -> std::result::Result<Vec<RawRecord>, TransportError>;

    async fn fetch_recurring_events(
        &self,
        query: &RecordQuery,
    ) -> std::result::Result<Vec<RecurringRecord>, TransportError>;
}

/// Fetch all three collections concurrently. Fails as a whole if any one fails.
pub async fn fetch_records<S>(source: &S, window: &DateWindow, db: &DbSettings) -> Result<RecordSet>
where
    S: RecordSource + ?Sized,
{
    let bookings_query = RecordQuery::bookings(window, db);
    let single_query = RecordQuery::single_events(window, db);
    let recurring_query = RecordQuery::recurring_events(window, db);

    let (bookings, single_events, recurring_events) = futures::try_join!(
        source.fetch_bookings(&bookings_query),
        source.fetch_single_events(&single_query),
        source.fetch_recurring_events(&recurring_query),
    )
    .map_err(|e| {
        warn!(error = %e, min_date = %window.min_date(), max_date = %window.max_date(), "record refresh failed");
        BookingError::RefreshFailed(e)
    })?;

    Ok(RecordSet {
        bookings,
        single_events,
        recurring_events,
    })
}

impl BookingEngine {
    /// Fetch the window's records and rebuild the index from them.
    ///
    /// Transport and validation failures both leave the current index untouched.
    pub async fn refresh<S>(&mut self, source: &S, window: DateWindow, db: &DbSettings) -> Result<()>
    where
        S: RecordSource + ?Sized,
    {
        let records = fetch_records(source, &window, db).await?;
        let index = self.rebuild(&records, window)?;
        info!(
            records = records.len(),
            dates = index.dates().count(),
            min_date = %window.min_date(),
            max_date = %window.max_date(),
            "availability refreshed"
        );
        Ok(())
    }
}
