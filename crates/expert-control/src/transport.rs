//! UDP transport for status reception and command transmission
//!
//! The amplifier broadcasts status on port 45454 and listens for
//! commands on port 45455. Status is inherently "wait for the next
//! broadcast": there is no request/response, so every receive operation
//! takes a caller-supplied timeout and fails cleanly when nothing
//! arrives.
//!
//! Commands are never acknowledged. The only delivery compensation the
//! protocol offers is brute force: every logical command is transmitted
//! exactly [`SEND_REPEAT`] times, each attempt stamped with its own
//! counter value and checksum. The device applies the same final state
//! no matter how many of the copies arrive.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use expert_proto::{decode_status, CommandFrame, StatusSnapshot, STATUS_LEN};

use crate::error::ControlError;
use crate::session::SessionState;

/// Port the amplifier broadcasts status datagrams on.
pub const STATUS_PORT: u16 = 45454;

/// Port the amplifier accepts command datagrams on.
pub const COMMAND_PORT: u16 = 45455;

/// Number of times each logical command is transmitted.
pub const SEND_REPEAT: usize = 4;

/// Receive buffer size. Status frames are 598 bytes, but the buffer is
/// oversized so an unexpectedly large datagram is observed at its full
/// length instead of being silently truncated by the socket.
const RECV_BUF_LEN: usize = 2048;

/// Wait for the next status broadcast and decode it.
///
/// Returns the source address alongside the snapshot. A datagram
/// shorter than [`STATUS_LEN`] is a [`DecodeError`], not a snapshot;
/// silence until the deadline is a [`ControlError::Timeout`].
///
/// [`DecodeError`]: expert_proto::DecodeError
pub async fn read_status(
    status_port: u16,
    timeout: Duration,
) -> Result<(SocketAddr, StatusSnapshot), ControlError> {
    let socket = bind_status_socket(status_port).await?;
    let mut buf = [0u8; RECV_BUF_LEN];

    match tokio::time::timeout(timeout, socket.recv_from(&mut buf)).await {
        Ok(Ok((n, source))) => {
            trace!(bytes = n, %source, "received status datagram");
            let snapshot = decode_status(&buf[..n])?;
            Ok((source, snapshot))
        }
        Ok(Err(e)) => Err(ControlError::Io(e)),
        Err(_) => Err(ControlError::Timeout(timeout)),
    }
}

/// Passively discover the amplifier.
///
/// Listens on the status port until the first full-size datagram
/// arrives; its source address is the device. Undersized datagrams
/// (other chatter on the port) are skipped rather than failing the
/// discovery.
pub async fn discover(
    status_port: u16,
    timeout: Duration,
) -> Result<(IpAddr, StatusSnapshot), ControlError> {
    let socket = bind_status_socket(status_port).await?;
    let mut buf = [0u8; RECV_BUF_LEN];

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(ControlError::Timeout(timeout));
        }

        match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, source))) if n >= STATUS_LEN => {
                let snapshot = decode_status(&buf[..n])?;
                debug!(%source, device = %snapshot.device_name, "discovered amplifier");
                return Ok((source.ip(), snapshot));
            }
            Ok(Ok((n, source))) => {
                trace!(bytes = n, %source, "ignoring undersized datagram during discovery");
            }
            Ok(Err(e)) => return Err(ControlError::Io(e)),
            Err(_) => return Err(ControlError::Timeout(timeout)),
        }
    }
}

/// Transmit one logical command as [`SEND_REPEAT`] stamped datagrams.
///
/// Each attempt takes the session lock just long enough to draw the
/// next counter value, then stamps and sends outside of it, so a slow
/// network never stalls other users of the session beyond the counter
/// increment itself.
pub async fn send_command(
    session: &Mutex<SessionState>,
    device: IpAddr,
    command_port: u16,
    frame: &mut CommandFrame,
) -> Result<(), ControlError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let target = SocketAddr::new(device, command_port);

    for attempt in 0..SEND_REPEAT {
        let counter = { session.lock().await.next_counter() };
        frame.stamp(counter);
        socket.send_to(frame.as_bytes(), target).await?;
        debug!(attempt, counter, %target, "transmitted command frame");
    }

    Ok(())
}

async fn bind_status_socket(status_port: u16) -> Result<UdpSocket, ControlError> {
    let socket = UdpSocket::bind(("0.0.0.0", status_port)).await?;
    trace!(port = status_port, "listening for status broadcasts");
    Ok(socket)
}
