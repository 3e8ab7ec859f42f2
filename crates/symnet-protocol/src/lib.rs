//! SymNet UDP control protocol: wire framing, request/response correlation,
//! and server-push decoding. See spec.md §4.A.

pub mod codec;
pub mod correlator;
pub mod error;
pub mod transport;

pub use codec::{ControllerNumber, ControllerState, RawValue};
pub use correlator::{Correlator, Expectation, SymResponse};
pub use error::ProtocolError;
pub use transport::SymnetClient;
