use thiserror::Error;

/// Failures surfaced by the SymNet protocol client.
///
/// `Transport` and `Nak` map onto the "Transport error" / "Protocol NAK"
/// kinds of spec.md §7; `Cancelled` is what an awaiter sees when the client
/// is torn down with its request still pending (spec.md §5, "Pending
/// response promises that were never resolved are dropped").
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("symnet transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("symnet device responded NAK")]
    Nak,
    #[error("symnet device sent a malformed or unexpected response")]
    MalformedResponse,
    #[error("request cancelled before a response arrived")]
    Cancelled,
}
