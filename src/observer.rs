use std::cell::RefCell;
use std::io::Write;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Everything the pipeline reports while it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Uploaded { source: String, path: String, bytes: usize },
    SplitPlanned { source: String, pages: usize, chunks: Vec<Vec<usize>> },
    BillingCheckFailed { source: String, page: usize, message: String },
    OcrPreview { unit: String, text: String },
    OcrFailed { unit: String, message: String },
    DumpFailed { unit: String, path: String, message: String },
    ChecksumFailed { unit: String, message: String },
    Renamed { unit: String, output: String, reference: Option<String> },
    UnitFailed { unit: String, stage: String, message: String },
    Progress { done: usize, total: usize },
    Archived { path: String, entries: usize },
    Finished { renamed: usize, unresolved: usize, failed: usize },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::BillingCheckFailed { .. }
            | Event::OcrFailed { .. }
            | Event::DumpFailed { .. }
            | Event::ChecksumFailed { .. } => Level::Warn,
            Event::UnitFailed { .. } => Level::Error,
            _ => Level::Info,
        }
    }
}

/// Sink for pipeline events. Keeps UI and diagnostics out of the core logic.
pub trait Observer {
    fn notify(&self, event: &Event);
}

/// Writes one JSON object per event to stderr.
#[derive(Debug, Default)]
pub struct JsonLinesObserver {
    pub quiet: bool,
}

impl JsonLinesObserver {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Observer for JsonLinesObserver {
    fn notify(&self, event: &Event) {
        let level = event.level();
        if self.quiet && level == Level::Info {
            return;
        }
        let mut value = match serde_json::to_value(event) {
            Ok(v) => v,
            Err(_) => return,
        };
        if let Some(obj) = value.as_object_mut() {
            obj.insert("level".into(), serde_json::json!(level));
        }
        let _ = writeln!(std::io::stderr().lock(), "{}", value);
    }
}

/// Keeps every event in memory; handy for tests and for building summaries.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}
