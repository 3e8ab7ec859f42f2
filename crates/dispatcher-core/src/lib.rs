pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod persistence;
pub mod studio;
pub mod timers;

pub use controller::{Button, Controller, Selector, SelectorKind, SymnetDevice};
pub use dispatcher::{Dispatcher, DispatcherConfig, State, StudioDefinition, Trigger};
pub use error::DispatcherError;
pub use persistence::{PersistedState, PersistenceStore};
pub use studio::{
    ButtonEvent, ButtonKind, LampSink, LedState, LedStateTarget, LedStatus, RecordingLampSink, Studio,
    StudioLedStatus,
};
