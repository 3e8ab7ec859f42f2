//! A minimal stand-in for the SymNet DSP, playing the same role for
//! protocol/dispatcher integration tests that the teacher's
//! `crates/emulator` / `services/emulator` play for IPICO chip readers:
//! a real UDP peer driving the client through its actual socket rather
//! than only in-process unit tests.

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Command {
    PushLine(String),
    Nak(bool),
}

/// A running fake device. Drop or call [`FakeSymnetDevice::shutdown`] to
/// stop it.
pub struct FakeSymnetDevice {
    pub local_addr: SocketAddr,
    command_tx: mpsc::Sender<Command>,
    handle: JoinHandle<()>,
}

impl FakeSymnetDevice {
    /// Bind to an ephemeral local port and start answering `GS2`/`CS`.
    pub async fn spawn() -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let local_addr = socket.local_addr()?;
        let (command_tx, command_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(socket, command_rx));
        Ok(FakeSymnetDevice {
            local_addr,
            command_tx,
            handle,
        })
    }

    /// Push an unsolicited `#NNNNN=VVVVV` line to whichever peer most
    /// recently sent this device a request.
    pub async fn push(&self, controller: u32, value: i32) {
        let _ = self
            .command_tx
            .send(Command::PushLine(format!("#{controller:05}={value}\r")))
            .await;
    }

    /// Make every subsequent `GS2`/`CS` request receive a `NAK`.
    pub async fn set_nak_mode(&self, nak: bool) {
        let _ = self.command_tx.send(Command::Nak(nak)).await;
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn run(socket: UdpSocket, mut commands: mpsc::Receiver<Command>) {
    let mut values: HashMap<u32, i32> = HashMap::new();
    let mut peer: Option<SocketAddr> = None;
    let mut nak_mode = false;
    let mut buf = [0u8; 2048];

    loop {
        tokio::select! {
            recv = socket.recv_from(&mut buf) => {
                let Ok((n, addr)) = recv else { continue };
                peer = Some(addr);
                let body = String::from_utf8_lossy(&buf[..n]).into_owned();
                for line in body.split('\r').filter(|l| !l.is_empty()) {
                    if let Some(response) = handle_line(line, &mut values, nak_mode) {
                        let _ = socket.send_to(response.as_bytes(), addr).await;
                    }
                }
            }
            command = commands.recv() => {
                match command {
                    Some(Command::PushLine(line)) => {
                        if let Some(addr) = peer {
                            let _ = socket.send_to(line.as_bytes(), addr).await;
                        }
                    }
                    Some(Command::Nak(v)) => nak_mode = v,
                    None => return,
                }
            }
        }
    }
}

fn handle_line(line: &str, values: &mut HashMap<u32, i32>, nak_mode: bool) -> Option<String> {
    if nak_mode {
        return Some("NAK\r".to_owned());
    }
    if let Some(rest) = line.strip_prefix("GS2 ") {
        let number: u32 = rest.trim().parse().ok()?;
        let value = *values.get(&number).unwrap_or(&0);
        Some(format!("{number} {value}\r"))
    } else if let Some(rest) = line.strip_prefix("CS ") {
        let mut parts = rest.split_whitespace();
        let number: u32 = parts.next()?.parse().ok()?;
        let value: i32 = parts.next()?.parse().ok()?;
        values.insert(number, value);
        Some("ACK\r".to_owned())
    } else {
        None
    }
}
