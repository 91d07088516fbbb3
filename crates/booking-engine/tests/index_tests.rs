//! Tests for occupancy index construction and free/occupied queries.

use booking_engine::{
    BookingEngine, DateKey, DateWindow, HourSlot, RawRecord, RecordSet, RecurringRecord,
    RepeatRule, TableId, TableState,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(s: &str) -> DateKey {
    s.parse().unwrap()
}

fn hour(h: f64) -> HourSlot {
    HourSlot::from_hours(h).unwrap()
}

fn table(id: u32) -> TableId {
    TableId::new(id)
}

fn engine_with(records: RecordSet, min: &str, max: &str) -> BookingEngine {
    let mut engine = BookingEngine::new();
    engine
        .rebuild(&records, DateWindow::parse(min, max).unwrap())
        .expect("records should index");
    engine
}

// ── Booking spans ───────────────────────────────────────────────────────────

#[test]
fn booking_occupies_exactly_its_span() {
    // 18:00 for 1.5h → 18.0, 18.5, 19.0
    let engine = engine_with(
        RecordSet {
            bookings: vec![RawRecord::new("2024-03-10", 18.0, 1.5, 4)],
            ..RecordSet::default()
        },
        "2024-03-10",
        "2024-03-24",
    );
    let d = date("2024-03-10");

    assert!(engine.is_free(d, hour(17.5), table(4)), "slot before the span");
    assert!(!engine.is_free(d, hour(18.0), table(4)));
    assert!(!engine.is_free(d, hour(18.5), table(4)));
    assert!(!engine.is_free(d, hour(19.0), table(4)));
    assert!(engine.is_free(d, hour(19.5), table(4)), "slot at hour + duration");
}

#[test]
fn other_tables_and_dates_stay_free() {
    let engine = engine_with(
        RecordSet {
            bookings: vec![RawRecord::new("2024-03-10", 18.0, 1.5, 4)],
            ..RecordSet::default()
        },
        "2024-03-10",
        "2024-03-24",
    );

    assert!(engine.is_free(date("2024-03-10"), hour(18.0), table(3)));
    assert!(engine.is_free(date("2024-03-11"), hour(18.0), table(4)));
}

#[test]
fn several_tables_share_a_slot() {
    let engine = engine_with(
        RecordSet {
            bookings: vec![
                RawRecord::new("2024-03-10", 18.0, 1.0, 1),
                RawRecord::new("2024-03-10", 18.0, 1.0, 2),
            ],
            single_events: vec![RawRecord::new("2024-03-10", 18.5, 0.5, 3)],
            ..RecordSet::default()
        },
        "2024-03-10",
        "2024-03-10",
    );
    let occupants = engine.index().occupied_tables(date("2024-03-10"), hour(18.5));
    assert_eq!(occupants, &[table(1), table(2), table(3)]);
}

#[test]
fn reservation_past_midnight_keeps_its_start_date() {
    let engine = engine_with(
        RecordSet {
            bookings: vec![RawRecord::new("2024-03-10", 23.5, 1.0, 5)],
            ..RecordSet::default()
        },
        "2024-03-10",
        "2024-03-11",
    );
    assert!(!engine.is_free(date("2024-03-10"), hour(24.0), table(5)));
    assert!(engine.is_free(date("2024-03-11"), hour(0.0), table(5)));
}

// ── Recurring events ────────────────────────────────────────────────────────

#[test]
fn daily_event_occupies_every_day_of_the_window() {
    // {hour: 12, duration: 1, table: 2} over 5 days
    let engine = engine_with(
        RecordSet {
            recurring_events: vec![RecurringRecord::new(RepeatRule::Daily, 12.0, 1.0, 2)],
            ..RecordSet::default()
        },
        "2024-02-27",
        "2024-03-02",
    );

    for d in ["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01", "2024-03-02"] {
        assert!(!engine.is_free(date(d), hour(12.0), table(2)), "{d} 12:00");
        assert!(!engine.is_free(date(d), hour(12.5), table(2)), "{d} 12:30");
        assert!(engine.is_free(date(d), hour(13.0), table(2)), "{d} 13:00");
    }
    assert!(engine.is_free(date("2024-02-26"), hour(12.0), table(2)));
    assert!(engine.is_free(date("2024-03-03"), hour(12.0), table(2)));
    assert_eq!(engine.index().dates().count(), 5);
}

#[test]
fn recurring_event_with_clock_hour_from_json() {
    let json = r#"{
        "bookings": [],
        "eventsCurrent": [{"id": 1, "date": "2024-03-10", "hour": "20:00", "duration": 2, "table": 1, "repeat": false}],
        "eventsRepeat": [{"id": 2, "date": "2024-01-01", "hour": "12:30", "duration": 0.5, "table": "3", "repeat": "daily"}]
    }"#;
    let records: RecordSet = serde_json::from_str(json).unwrap();
    let engine = engine_with(records, "2024-03-10", "2024-03-11");

    assert!(!engine.is_free(date("2024-03-10"), hour(21.5), table(1)));
    assert!(!engine.is_free(date("2024-03-11"), hour(12.5), table(3)));
    assert!(engine.is_free(date("2024-03-11"), hour(13.0), table(3)));
}

// ── Renderable state ────────────────────────────────────────────────────────

#[test]
fn renderable_state_drives_selection_clearing() {
    let mut engine = engine_with(
        RecordSet {
            bookings: vec![RawRecord::new("2024-03-10", 19.0, 1.0, 2)],
            ..RecordSet::default()
        },
        "2024-03-10",
        "2024-03-10",
    );
    let tables = [table(1), table(2), table(3)];

    // User picks table 2 at 18:00, where it is still free.
    let state = engine.renderable_state(date("2024-03-10"), hour(18.0), &tables);
    assert_eq!(state[&table(2)], TableState::Free);
    engine.select(table(2));

    // The hour moves to 19:00; the engine reports it occupied but keeps the selection.
    let state = engine.renderable_state(date("2024-03-10"), hour(19.0), &tables);
    assert_eq!(state[&table(2)], TableState::Occupied);
    assert!(engine.selection().is(table(2)));

    // Caller clears it based on the returned state.
    if let Some(selected) = engine.selection().table() {
        if state[&selected] == TableState::Occupied {
            engine.clear_selection();
        }
    }
    assert!(engine.selection().is_none());
}
