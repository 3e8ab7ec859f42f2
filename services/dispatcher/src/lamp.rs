//! A [`LampSink`] that logs LED updates through `tracing` instead of
//! driving real hardware — the physical lamp driver is out of scope
//! (spec.md §1).

use dispatcher_core::{LampSink, StudioLedStatus};

pub struct LoggingLampSink {
    studio_name: String,
}

impl LoggingLampSink {
    pub fn new(studio_name: impl Into<String>) -> Self {
        LoggingLampSink { studio_name: studio_name.into() }
    }
}

impl LampSink for LoggingLampSink {
    fn set_led_status(&self, status: StudioLedStatus) {
        tracing::info!(
            studio = %self.studio_name,
            green = ?status.green.state,
            yellow = ?status.yellow.state,
            red = ?status.red.state,
            "led status"
        );
    }
}
