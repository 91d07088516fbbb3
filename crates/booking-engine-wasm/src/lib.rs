//! WASM bindings for booking-engine.
//!
//! Exposes a `BookingWidget` class to the JavaScript booking widget. The host
//! page keeps doing its own `fetch` calls: it asks the widget which URLs to
//! load, hands the three JSON responses back to `rebuild`, and after the
//! booking POST succeeds reports it through `commitBooking`. All complex
//! values cross the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p booking-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/booking-widget/wasm/ \
//!   target/wasm32-unknown-unknown/release/booking_engine_wasm.wasm
//! ```

use booking_engine::{
    BookingCoordinator, BookingEngine, BookingRequest, DateKey, DateWindow, EngineConfig,
    HourSlot, RecordQuery, RecordSet, TableId,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryUrlsDto {
    bookings: String,
    events_current: String,
    events_repeat: String,
}

#[derive(Serialize)]
struct ConfirmationDto {
    date: String,
    hour: String,
    table: u32,
    duration: f64,
    summary: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_message(e: impl std::fmt::Display) -> String {
    e.to_string()
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {what} JSON: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {e}"))
}

fn parse_slot(date: &str, hour: &str) -> Result<(DateKey, HourSlot), String> {
    Ok((
        date.parse().map_err(to_message)?,
        hour.parse().map_err(to_message)?,
    ))
}

// ---------------------------------------------------------------------------
// Widget state (plain Rust, testable off-wasm)
// ---------------------------------------------------------------------------

/// Engine, coordinator and config behind one widget instance.
pub struct WidgetState {
    engine: BookingEngine,
    coordinator: BookingCoordinator,
    config: EngineConfig,
}

impl WidgetState {
    pub fn new(config_toml: Option<&str>) -> Result<Self, String> {
        let config = match config_toml {
            Some(toml) => EngineConfig::from_toml_str(toml).map_err(to_message)?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            engine: BookingEngine::new(),
            coordinator: BookingCoordinator::with_opening_hours(config.hours),
            config,
        })
    }

    /// `{"minDate": ..., "maxDate": ...}` for a date picker opened on `today`.
    pub fn window_from(&self, today: &str) -> Result<String, String> {
        let today: DateKey = today.parse().map_err(to_message)?;
        let window = self.config.window_from(today.date()).map_err(to_message)?;
        to_json(&window)
    }

    /// The three URLs the host must fetch for `[min_date, max_date]`.
    pub fn query_urls(&self, min_date: &str, max_date: &str) -> Result<String, String> {
        let window = DateWindow::parse(min_date, max_date).map_err(to_message)?;
        let db = &self.config.db;
        to_json(&QueryUrlsDto {
            bookings: RecordQuery::bookings(&window, db).url(),
            events_current: RecordQuery::single_events(&window, db).url(),
            events_repeat: RecordQuery::recurring_events(&window, db).url(),
        })
    }

    pub fn rebuild(
        &mut self,
        bookings_json: &str,
        events_current_json: &str,
        events_repeat_json: &str,
        min_date: &str,
        max_date: &str,
    ) -> Result<(), String> {
        let window = DateWindow::parse(min_date, max_date).map_err(to_message)?;
        let records = RecordSet::from_json(bookings_json, events_current_json, events_repeat_json)
            .map_err(to_message)?;
        self.engine.rebuild(&records, window).map_err(to_message)?;
        Ok(())
    }

    pub fn is_free(&self, date: &str, hour: &str, table: u32) -> Result<bool, String> {
        let (date, hour) = parse_slot(date, hour)?;
        Ok(self.engine.is_free(date, hour, TableId::new(table)))
    }

    pub fn select(&mut self, table: u32) -> Option<u32> {
        self.engine.select(TableId::new(table)).table().map(TableId::get)
    }

    pub fn clear_selection(&mut self) {
        self.engine.clear_selection();
    }

    pub fn selection(&self) -> Option<u32> {
        self.engine.selection().table().map(TableId::get)
    }

    /// `{"<table>": "free" | "occupied"}` for the tables listed in `tables_json`.
    pub fn renderable_state(&self, date: &str, hour: &str, tables_json: &str) -> Result<String, String> {
        let (date, hour) = parse_slot(date, hour)?;
        let tables: Vec<TableId> = parse_json("tables", tables_json)?;
        to_json(&self.engine.renderable_state(date, hour, &tables))
    }

    /// Validate a booking payload and re-check availability.
    ///
    /// Returns the normalized payload to POST. Nothing is marked yet.
    pub fn prepare_booking(&self, payload_json: &str) -> Result<String, String> {
        let request: BookingRequest = parse_json("booking", payload_json)?;
        let prepared = self
            .coordinator
            .prepare(&self.engine, request)
            .map_err(to_message)?;
        to_json(prepared.request())
    }

    /// Mark a booking the backend accepted. Returns the confirmation.
    pub fn commit_booking(&mut self, payload_json: &str) -> Result<String, String> {
        let request: BookingRequest = parse_json("booking", payload_json)?;
        let receipt = self
            .coordinator
            .confirm(&mut self.engine, request)
            .map_err(to_message)?;
        let r = receipt.reservation;
        to_json(&ConfirmationDto {
            date: r.date().to_string(),
            hour: r.start().to_string(),
            table: r.table().get(),
            duration: r.duration().hours(),
            summary: receipt.summary,
        })
    }
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

#[wasm_bindgen]
pub struct BookingWidget {
    state: WidgetState,
}

#[wasm_bindgen]
impl BookingWidget {
    /// Create a widget. `config_toml` overrides endpoints and opening hours.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<BookingWidget, JsValue> {
        WidgetState::new(config_toml.as_deref())
            .map(|state| BookingWidget { state })
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = "windowFrom")]
    pub fn window_from(&self, today: &str) -> Result<String, JsValue> {
        self.state.window_from(today).map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = "queryUrls")]
    pub fn query_urls(&self, min_date: &str, max_date: &str) -> Result<String, JsValue> {
        self.state
            .query_urls(min_date, max_date)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Rebuild availability from the three fetched JSON arrays.
    pub fn rebuild(
        &mut self,
        bookings_json: &str,
        events_current_json: &str,
        events_repeat_json: &str,
        min_date: &str,
        max_date: &str,
    ) -> Result<(), JsValue> {
        self.state
            .rebuild(
                bookings_json,
                events_current_json,
                events_repeat_json,
                min_date,
                max_date,
            )
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = "isFree")]
    pub fn is_free(&self, date: &str, hour: &str, table: u32) -> Result<bool, JsValue> {
        self.state
            .is_free(date, hour, table)
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn select(&mut self, table: u32) -> Option<u32> {
        self.state.select(table)
    }

    #[wasm_bindgen(js_name = "clearSelection")]
    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    pub fn selection(&self) -> Option<u32> {
        self.state.selection()
    }

    #[wasm_bindgen(js_name = "renderableState")]
    pub fn renderable_state(&self, date: &str, hour: &str, tables_json: &str) -> Result<String, JsValue> {
        self.state
            .renderable_state(date, hour, tables_json)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = "prepareBooking")]
    pub fn prepare_booking(&self, payload_json: &str) -> Result<String, JsValue> {
        self.state
            .prepare_booking(payload_json)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = "commitBooking")]
    pub fn commit_booking(&mut self, payload_json: &str) -> Result<String, JsValue> {
        self.state
            .commit_booking(payload_json)
            .map_err(|e| JsValue::from_str(&e))
    }
}
