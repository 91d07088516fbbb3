//! Tests for the joined three-collection refresh.

use std::sync::Mutex;

use async_trait::async_trait;
use booking_engine::{
    fetch_records, BookingEngine, BookingError, DateWindow, DbSettings, HourSlot, RawRecord,
    RecordKind, RecordQuery, RecordSource, RecurringRecord, RepeatRule, TableId, TransportError,
};

// ── Fake source ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeSource {
    bookings: Vec<RawRecord>,
    single_events: Vec<RawRecord>,
    recurring_events: Vec<RecurringRecord>,
    failing: Option<RecordKind>,
    seen: Mutex<Vec<RecordQuery>>,
}

impl FakeSource {
    fn answer<T: Clone>(&self, query: &RecordQuery, records: &[T]) -> Result<Vec<T>, TransportError> {
        self.seen.lock().unwrap().push(query.clone());
        if self.failing == Some(query.kind) {
            return Err(TransportError::Request(format!("{} unreachable", query.endpoint)));
        }
        Ok(records.to_vec())
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_bookings(&self, query: &RecordQuery) -> Result<Vec<RawRecord>, TransportError> {
        self.answer(query, &self.bookings)
    }

    async fn fetch_single_events(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<RawRecord>, TransportError> {
        self.answer(query, &self.single_events)
    }

    async fn fetch_recurring_events(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<RecurringRecord>, TransportError> {
        self.answer(query, &self.recurring_events)
    }
}

fn populated() -> FakeSource {
    FakeSource {
        bookings: vec![RawRecord::new("2024-03-10", 18.0, 1.5, 4)],
        single_events: vec![RawRecord::new("2024-03-11", 20.0, 2.0, 1)],
        recurring_events: vec![RecurringRecord::new(RepeatRule::Daily, 12.0, 1.0, 2)],
        ..FakeSource::default()
    }
}

fn window() -> DateWindow {
    DateWindow::parse("2024-03-10", "2024-03-14").unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn hour(h: f64) -> HourSlot {
    HourSlot::from_hours(h).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_indexes_all_three_collections() {
    init_tracing();
    let source = populated();
    let mut engine = BookingEngine::new();

    engine
        .refresh(&source, window(), &DbSettings::default())
        .await
        .unwrap();

    let d10 = "2024-03-10".parse().unwrap();
    let d11 = "2024-03-11".parse().unwrap();
    let d14 = "2024-03-14".parse().unwrap();
    assert!(!engine.is_free(d10, hour(19.0), TableId::new(4)));
    assert!(!engine.is_free(d11, hour(21.5), TableId::new(1)));
    assert!(!engine.is_free(d14, hour(12.5), TableId::new(2)));
    assert_eq!(engine.window(), Some(&window()));
}

#[tokio::test]
async fn each_collection_gets_its_own_filter() {
    let source = populated();
    fetch_records(&source, &window(), &DbSettings::default())
        .await
        .unwrap();

    let mut urls: Vec<String> = source.seen.lock().unwrap().iter().map(RecordQuery::url).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "http://localhost:3131/booking?date_gte=2024-03-10&date_lte=2024-03-14",
            "http://localhost:3131/event?repeat=false&date_gte=2024-03-10&date_lte=2024-03-14",
            "http://localhost:3131/event?repeat_ne=false&date_lte=2024-03-14",
        ]
    );
}

#[tokio::test]
async fn one_failed_fetch_fails_the_whole_refresh() {
    init_tracing();
    for failing in [RecordKind::Booking, RecordKind::SingleEvent, RecordKind::RecurringEvent] {
        let mut engine = BookingEngine::new();
        engine
            .refresh(&populated(), window(), &DbSettings::default())
            .await
            .unwrap();
        engine.select(TableId::new(3));
        let before = engine.index().clone();

        let source = FakeSource {
            failing: Some(failing),
            ..populated()
        };
        let later = DateWindow::parse("2024-03-15", "2024-03-20").unwrap();
        let err = engine
            .refresh(&source, later, &DbSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::RefreshFailed(_)), "{failing}: {err}");
        assert_eq!(engine.index(), &before, "{failing}: index must be untouched");
        assert_eq!(engine.window(), Some(&window()));
        assert!(engine.selection().is(TableId::new(3)));
    }
}

#[tokio::test]
async fn malformed_record_fails_refresh_with_context() {
    let mut source = populated();
    source.bookings.push(RawRecord::new("2024-03-12", 18.0, 0.0, 5));

    let mut engine = BookingEngine::new();
    let err = engine
        .refresh(&source, window(), &DbSettings::default())
        .await
        .unwrap_err();

    match err {
        BookingError::InvalidRecord {
            collection,
            position,
            ..
        } => {
            assert_eq!(collection, RecordKind::Booking);
            assert_eq!(position, 1);
        }
        other => panic!("expected InvalidRecord, got {other}"),
    }
    assert!(engine.index().is_empty());
    assert_eq!(engine.window(), None);
}
