//! Connected UDP transport for the SymNet protocol: wires a socket to a
//! [`Correlator`] and exposes request/response methods plus a channel of
//! server-pushed controller states.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::codec::{ControllerNumber, ControllerState, RawValue, encode_cs, encode_gs2};
use crate::correlator::{Correlator, Expectation, SymResponse};
use crate::error::ProtocolError;

const MAX_DATAGRAM: usize = 2048;

/// A connected SymNet client: one outstanding request is the normal case,
/// but several may be in flight at once (spec.md §4.A).
#[derive(Clone)]
pub struct SymnetClient {
    socket: Arc<UdpSocket>,
    correlator: Arc<Mutex<Correlator>>,
}

impl SymnetClient {
    /// Bind `local_addr`, connect to `remote_addr`, and spawn the receive
    /// loop that decodes datagrams and forwards pushed controller states on
    /// `push_tx`.
    pub async fn connect(
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
        push_tx: mpsc::Sender<ControllerState>,
    ) -> Result<(Self, JoinHandle<()>), ProtocolError> {
        let socket = UdpSocket::bind(local_addr).await?;
        socket.connect(remote_addr).await?;
        let socket = Arc::new(socket);
        let correlator = Arc::new(Mutex::new(Correlator::new()));

        let recv_socket = socket.clone();
        let recv_correlator = correlator.clone();
        let handle = tokio::spawn(recv_loop(recv_socket, recv_correlator, push_tx));

        Ok((
            SymnetClient {
                socket,
                correlator,
            },
            handle,
        ))
    }

    /// `GS2 <n>` — fetch a controller's current raw value.
    pub async fn gs2(&self, number: ControllerNumber) -> Result<RawValue, ProtocolError> {
        let rx = self.send_request(encode_gs2(number), Expectation::gs2(number)).await?;
        match rx.await {
            Ok(Ok(SymResponse::Gs2Value(value))) => Ok(value),
            Ok(Ok(_)) => Err(ProtocolError::MalformedResponse),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProtocolError::Cancelled),
        }
    }

    /// `CS <n> <v>` — set a controller's raw value, awaiting `ACK`.
    pub async fn cs(&self, number: ControllerNumber, value: RawValue) -> Result<(), ProtocolError> {
        let rx = self.send_request(encode_cs(number, value), Expectation::ack()).await?;
        match rx.await {
            Ok(Ok(SymResponse::Ack)) => Ok(()),
            Ok(Ok(_)) => Err(ProtocolError::MalformedResponse),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProtocolError::Cancelled),
        }
    }

    /// Enqueue an expectation and send the request under the same
    /// correlator lock, so the queue order always matches send order.
    async fn send_request(
        &self,
        line: String,
        expectation: Expectation,
    ) -> Result<tokio::sync::oneshot::Receiver<Result<SymResponse, ProtocolError>>, ProtocolError> {
        let mut guard = self.correlator.lock().await;
        let rx = guard.enqueue(expectation);
        self.socket.send(line.as_bytes()).await?;
        Ok(rx)
    }
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    correlator: Arc<Mutex<Correlator>>,
    push_tx: mpsc::Sender<ControllerState>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let n = match socket.recv(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "symnet transport recv error");
                continue;
            }
        };
        let body = match std::str::from_utf8(&buf[..n]) {
            Ok(s) => s,
            Err(_) => {
                tracing::error!("non-utf8 datagram from symnet device, dropping");
                continue;
            }
        };

        let pushed = correlator.lock().await.on_datagram(body);
        for state in pushed {
            if push_tx.send(state).await.is_err() {
                tracing::debug!("push receiver dropped, stopping symnet recv loop");
                return;
            }
        }
    }
}
