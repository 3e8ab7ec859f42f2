//! Studio identity, physical button events, and the tri-color LED model
//! (spec.md §3, §6).

use std::sync::Arc;

/// Which physical button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    Takeover,
    Release,
    Immediate,
}

/// A tri-color LED's steady/blink state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    On,
    Blink,
}

/// One LED's target state plus its blink frequency (only meaningful while
/// [`LedState::Blink`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedStatus {
    pub state: LedState,
    pub blink_freq_hz: u8,
}

impl LedStatus {
    pub const OFF: LedStatus = LedStatus { state: LedState::Off, blink_freq_hz: 2 };
    pub const ON: LedStatus = LedStatus { state: LedState::On, blink_freq_hz: 2 };
    pub const BLINK: LedStatus = LedStatus { state: LedState::Blink, blink_freq_hz: 2 };
    pub const BLINK_FAST: LedStatus = LedStatus { state: LedState::Blink, blink_freq_hz: 4 };
}

/// The green/yellow/red recipe for one studio's LED panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudioLedStatus {
    pub green: LedStatus,
    pub yellow: LedStatus,
    pub red: LedStatus,
}

impl StudioLedStatus {
    pub const ALL_OFF: StudioLedStatus = StudioLedStatus {
        green: LedStatus::OFF,
        yellow: LedStatus::OFF,
        red: LedStatus::OFF,
    };
}

/// The per-role LED recipe carried by a dispatcher state: who plays X, who
/// plays Y, and everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedStateTarget {
    pub x: StudioLedStatus,
    pub y: StudioLedStatus,
    pub other: StudioLedStatus,
}

/// A button press from one studio's panel.
#[derive(Debug, Clone)]
pub struct ButtonEvent {
    pub studio: Arc<Studio>,
    pub button: ButtonKind,
}

/// Receives LED updates for one studio. The physical lamp driver is an
/// out-of-scope collaborator (spec.md §1); this is its interface.
pub trait LampSink: Send + Sync {
    fn set_led_status(&self, status: StudioLedStatus);
}

/// A lamp sink that just records every update it receives, for tests.
#[derive(Default)]
pub struct RecordingLampSink {
    updates: std::sync::Mutex<Vec<StudioLedStatus>>,
}

impl RecordingLampSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<StudioLedStatus> {
        self.updates.lock().unwrap().last().copied()
    }

    pub fn history(&self) -> Vec<StudioLedStatus> {
        self.updates.lock().unwrap().clone()
    }
}

impl LampSink for RecordingLampSink {
    fn set_led_status(&self, status: StudioLedStatus) {
        self.updates.lock().unwrap().push(status);
    }
}

/// One studio position: an identity plus where its LED updates go.
///
/// Identity is by name — studios are constructed once at configuration time
/// (spec.md §3) and compared throughout the dispatcher by that name, the
/// Rust stand-in for the original's object identity comparison.
pub struct Studio {
    pub name: String,
    lamp_sink: Arc<dyn LampSink>,
}

impl Studio {
    pub fn new(name: impl Into<String>, lamp_sink: Arc<dyn LampSink>) -> Arc<Studio> {
        Arc::new(Studio {
            name: name.into(),
            lamp_sink,
        })
    }

    pub fn set_led_status(&self, status: StudioLedStatus) {
        self.lamp_sink.set_led_status(status);
    }
}

impl PartialEq for Studio {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Studio {}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio").field("name", &self.name).finish()
    }
}
