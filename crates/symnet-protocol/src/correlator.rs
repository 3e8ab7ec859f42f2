//! FIFO request/response correlator for the SymNet datagram transport.
//!
//! The wire protocol carries no transaction id, so a pending request is
//! matched against incoming datagrams by *shape*: either a full-body
//! pattern (the protocol's "regex", embedding e.g. the controller number a
//! `GS2` expects back) or an expected non-empty line count. See spec.md
//! §4.A for the exact matching algorithm this mirrors step for step.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::codec::{ControllerState, ControllerNumber, RawValue, parse_gs2_response, parse_push_line, split_lines};
use crate::error::ProtocolError;

/// What a successfully matched datagram delivers to its awaiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymResponse {
    Ack,
    Gs2Value(RawValue),
    /// Delivered by the line-count matching path, with the raw datagram
    /// body for callers that don't need pattern extraction.
    Raw(String),
}

/// A pattern predicate: matches a response body and extracts its payload.
type PatternFn = Box<dyn Fn(&str) -> Option<SymResponse> + Send + Sync>;

/// The matching rule for one pending request (spec.md §4.A, "pattern").
pub enum Expectation {
    Pattern(PatternFn),
    LineCount(usize),
}

impl Expectation {
    /// Matches a single-line `GS2` response for `number`.
    pub fn gs2(number: ControllerNumber) -> Self {
        Expectation::Pattern(Box::new(move |body: &str| {
            let lines = split_lines(body);
            if lines.len() != 1 {
                return None;
            }
            parse_gs2_response(lines[0], number).map(SymResponse::Gs2Value)
        }))
    }

    /// Matches a single-line `ACK` response (used by `CS` requests — the
    /// `NAK` case is always caught by the head-of-queue rule first).
    pub fn ack() -> Self {
        Expectation::Pattern(Box::new(|body: &str| {
            let lines = split_lines(body);
            if lines.len() == 1 && lines[0] == "ACK" {
                Some(SymResponse::Ack)
            } else {
                None
            }
        }))
    }
}

struct Pending {
    expectation: Expectation,
    responder: oneshot::Sender<Result<SymResponse, ProtocolError>>,
}

/// The pending-callback FIFO queue plus the datagram-to-push decoder.
///
/// Pure and synchronous on purpose — no I/O — so the protocol-parser
/// boundary tests in spec.md §8 can drive it directly.
#[derive(Default)]
pub struct Correlator {
    pending: VecDeque<Pending>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending request and return the receiver its eventual
    /// response (or cancellation) will arrive on.
    pub fn enqueue(&mut self, expectation: Expectation) -> oneshot::Receiver<Result<SymResponse, ProtocolError>> {
        let (tx, rx) = oneshot::channel();
        self.pending.push_back(Pending {
            expectation,
            responder: tx,
        });
        rx
    }

    /// Process one received datagram body. Returns any server-pushed
    /// controller states contained in it (empty unless the datagram was
    /// unsolicited push data).
    pub fn on_datagram(&mut self, body: &str) -> Vec<ControllerState> {
        let lines = split_lines(body);

        if !self.pending.is_empty() {
            // Step 2a: an exact, lone NAK always fails the head of the
            // queue, regardless of what the head was waiting for.
            if lines.len() == 1 && lines[0] == "NAK" {
                if let Some(head) = self.pending.pop_front() {
                    let _ = head.responder.send(Err(ProtocolError::Nak));
                }
                return Vec::new();
            }

            // Steps 2b/2c: walk the queue in order, deliver to the first
            // entry whose pattern or line count matches.
            for i in 0..self.pending.len() {
                let matched = match &self.pending[i].expectation {
                    Expectation::Pattern(matcher) => matcher(body),
                    Expectation::LineCount(expected) => {
                        if lines.len() == *expected {
                            Some(SymResponse::Raw(body.to_owned()))
                        } else {
                            None
                        }
                    }
                };
                if let Some(response) = matched {
                    if let Some(pending) = self.pending.remove(i) {
                        let _ = pending.responder.send(Ok(response));
                    }
                    return Vec::new();
                }
            }
        }

        // Step 3: an uncaught ACK/NAK with nobody waiting is logged and
        // swallowed.
        if lines.len() == 1 && (lines[0] == "ACK" || lines[0] == "NAK") {
            tracing::warn!(line = lines[0], "uncaught ACK/NAK with no pending request");
            return Vec::new();
        }

        // Step 4: every remaining non-empty line is unsolicited push data.
        let mut pushed = Vec::with_capacity(lines.len());
        for line in &lines {
            match parse_push_line(line) {
                Some(state) => pushed.push(state),
                None => tracing::warn!(line = *line, "malformed push line, skipping"),
            }
        }
        pushed
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gs2_response_satisfies_pending_request() {
        let mut correlator = Correlator::new();
        let rx = correlator.enqueue(Expectation::gs2(42));

        let pushed = correlator.on_datagram("42 17000\r");
        assert!(pushed.is_empty());

        let response = rx.await.unwrap().unwrap();
        assert_eq!(response, SymResponse::Gs2Value(17000));
    }

    #[tokio::test]
    async fn nak_fails_the_head_of_the_queue() {
        let mut correlator = Correlator::new();
        let rx = correlator.enqueue(Expectation::ack());

        correlator.on_datagram("NAK\r");

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, ProtocolError::Nak));
    }

    #[tokio::test]
    async fn nak_fails_head_even_when_head_expected_a_multiline_response() {
        // spec.md §9: the head-of-queue NAK rule short-circuits regardless
        // of the head callback's own pattern.
        let mut correlator = Correlator::new();
        let rx = correlator.enqueue(Expectation::LineCount(2));

        correlator.on_datagram("NAK\r");

        assert!(matches!(rx.await.unwrap().unwrap_err(), ProtocolError::Nak));
    }

    #[test]
    fn push_datagram_with_empty_queue_yields_two_states() {
        let mut correlator = Correlator::new();
        let pushed = correlator.on_datagram("#00042=17000\r#00043=-0001\r");
        assert_eq!(
            pushed,
            vec![
                ControllerState { number: 42, value: 17000 },
                ControllerState { number: 43, value: -1 },
            ]
        );
    }

    #[test]
    fn malformed_push_line_yields_nothing() {
        let mut correlator = Correlator::new();
        let pushed = correlator.on_datagram("#00042=abcd\r");
        assert!(pushed.is_empty());
    }

    #[tokio::test]
    async fn non_matching_head_does_not_block_a_later_matching_request() {
        let mut correlator = Correlator::new();
        let gs2_7 = correlator.enqueue(Expectation::gs2(7));
        let gs2_9 = correlator.enqueue(Expectation::gs2(9));

        // Response for controller 9 arrives even though 7's request is
        // still at the head of the queue.
        correlator.on_datagram("9 500\r");

        assert_eq!(correlator.pending_len(), 1);
        assert_eq!(gs2_9.await.unwrap().unwrap(), SymResponse::Gs2Value(500));

        correlator.on_datagram("7 1\r");
        assert_eq!(gs2_7.await.unwrap().unwrap(), SymResponse::Gs2Value(1));
    }

    #[tokio::test]
    async fn dropping_the_correlator_cancels_pending_requests() {
        let mut correlator = Correlator::new();
        let rx = correlator.enqueue(Expectation::ack());
        drop(correlator);
        assert!(rx.await.is_err());
    }
}
