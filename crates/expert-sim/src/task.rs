//! Loopback UDP wrapper around the virtual amplifier
//!
//! Runs a [`VirtualAmplifier`] the way the device behaves on the
//! network: status frames go out on a fixed cadence and command
//! datagrams are applied as they arrive, with no acknowledgment.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::VirtualAmplifier;

/// Handle to a running simulated amplifier
pub struct SimAmplifier {
    state: Arc<Mutex<VirtualAmplifier>>,
    command_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SimAmplifier {
    /// Put a virtual amplifier on loopback UDP sockets.
    ///
    /// Status frames are sent to `status_target` every
    /// `status_interval`; commands are accepted on an ephemeral port
    /// reported by [`SimAmplifier::command_addr`].
    pub async fn spawn(
        amp: VirtualAmplifier,
        status_target: SocketAddr,
        status_interval: Duration,
    ) -> io::Result<Self> {
        let command_socket = UdpSocket::bind("127.0.0.1:0").await?;
        let status_socket = UdpSocket::bind("127.0.0.1:0").await?;
        let command_addr = command_socket.local_addr()?;
        debug!(%command_addr, %status_target, "simulated amplifier starting");

        let state = Arc::new(Mutex::new(amp));
        let task_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(status_interval);
            let mut buf = [0u8; 2048];

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let frame = task_state.lock().await.status_frame();
                        if let Err(e) = status_socket.send_to(&frame, status_target).await {
                            trace!(error = %e, "status broadcast failed");
                        }
                    }
                    result = command_socket.recv_from(&mut buf) => {
                        match result {
                            Ok((n, source)) => {
                                trace!(bytes = n, %source, "sim received command datagram");
                                task_state.lock().await.apply_frame(&buf[..n]);
                            }
                            Err(e) => {
                                trace!(error = %e, "sim command recv failed");
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            state,
            command_addr,
            task,
        })
    }

    /// Address the simulated amplifier accepts commands on.
    pub fn command_addr(&self) -> SocketAddr {
        self.command_addr
    }

    /// Shared amplifier state, for test inspection.
    pub fn state(&self) -> Arc<Mutex<VirtualAmplifier>> {
        Arc::clone(&self.state)
    }
}

impl Drop for SimAmplifier {
    fn drop(&mut self) {
        self.task.abort();
    }
}
