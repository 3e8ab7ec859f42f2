use thiserror::Error;

/// Errors surfaced by the controller cache, selector/button mapping, and
/// persistence layers. Transport/NAK failures from the protocol client pass
/// through unchanged (spec.md §7: "Protocol NAK ... surfaced to the
/// awaiting operation as a failure").
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error(transparent)]
    Protocol(#[from] symnet_protocol::ProtocolError),

    #[error("dummy selector does not perform protocol I/O")]
    DummyNotSupported,

    #[error("selector position {position} out of range 1..={max}")]
    PositionOutOfRange { position: u32, max: u32 },

    #[error("persistence I/O error: {0}")]
    PersistenceIo(#[from] std::io::Error),

    #[error("persistence JSON error: {0}")]
    PersistenceJson(#[from] serde_json::Error),

    #[error("unknown studio name in persisted dispatcher state: {0}")]
    UnknownStudio(String),
}
