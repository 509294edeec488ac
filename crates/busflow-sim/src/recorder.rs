//! The recorder seam.
//!
//! The day loop never decides where events go. It hands each [`StopEvent`]
//! to an [`EventRecorder`] as soon as the event exists; exporters, charting
//! and KPI aggregation all live behind this trait.
//!
//! - [`MemoryRecorder`] – keeps every event in a `Vec`, for tests and for
//!   in-process consumers.
//! - [`JsonLinesRecorder`] – writes one flat JSON object per line to any
//!   [`Write`] sink.

use std::io::Write;

use busflow_types::{BusflowError, StopEvent};

/// Consumer of the stop-event stream.
pub trait EventRecorder {
    /// Accept one event. An error aborts the run.
    fn record(&mut self, event: &StopEvent) -> Result<(), BusflowError>;

    /// Called once after the last event of a run.
    fn flush(&mut self) -> Result<(), BusflowError> {
        Ok(())
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Vec<StopEvent>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StopEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StopEvent> {
        self.events
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&mut self, event: &StopEvent) -> Result<(), BusflowError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Writes each event as a single line of JSON.
#[derive(Debug)]
pub struct JsonLinesRecorder<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of events written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventRecorder for JsonLinesRecorder<W> {
    fn record(&mut self, event: &StopEvent) -> Result<(), BusflowError> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| BusflowError::Serialization(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| BusflowError::Recorder(e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BusflowError> {
        self.writer
            .flush()
            .map_err(|e| BusflowError::Recorder(e.to_string()))
    }
}
