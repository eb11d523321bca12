//! Controller facade
//!
//! One controller instance speaks to one amplifier. It owns the session
//! state (device address and packet counter) behind a mutex, so
//! concurrent callers may share a controller: sends serialize on the
//! counter, while status reads use their own socket and run freely
//! alongside them.

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use expert_proto::{Command, CommandFrame, StatusSnapshot};
use expert_proto::volume::{VOLUME_MAX_DB, VOLUME_MIN_DB};

use crate::error::ControlError;
use crate::session::SessionState;
use crate::transport::{self, COMMAND_PORT, STATUS_PORT};

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Device address, if known up front. Leave `None` to discover.
    pub device: Option<IpAddr>,
    /// Port to listen on for status broadcasts.
    pub status_port: u16,
    /// Port to send command datagrams to.
    pub command_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device: None,
            status_port: STATUS_PORT,
            command_port: COMMAND_PORT,
        }
    }
}

/// Facade over the codec and transport layers
///
/// Exposes the two operations external collaborators consume, "read
/// status" and "send command", plus a convenience wrapper per command
/// kind. All sends are fire-and-forget; poll [`Controller::status`]
/// afterwards to observe the effect.
pub struct Controller {
    config: ControllerConfig,
    session: Mutex<SessionState>,
}

impl Controller {
    /// Create a controller with default ports and no known address.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Create a controller from explicit configuration.
    pub fn with_config(config: ControllerConfig) -> Self {
        let session = Mutex::new(SessionState::new(config.device));
        Self { config, session }
    }

    /// Listen for the first status broadcast and record its source as
    /// the device address.
    pub async fn discover(&self, timeout: Duration) -> Result<IpAddr, ControlError> {
        let (addr, _) = transport::discover(self.config.status_port, timeout).await?;
        self.session.lock().await.device = Some(addr);
        Ok(addr)
    }

    /// Wait for the next status broadcast and decode it.
    ///
    /// Also records the source address if none is known yet, so a
    /// status read doubles as discovery.
    pub async fn status(&self, timeout: Duration) -> Result<StatusSnapshot, ControlError> {
        let (source, snapshot) = transport::read_status(self.config.status_port, timeout).await?;
        let mut session = self.session.lock().await;
        if session.device.is_none() {
            debug!(source = %source.ip(), "recording device address from status read");
            session.device = Some(source.ip());
        }
        Ok(snapshot)
    }

    /// Turn the amplifier on or off (leave or enter standby).
    pub async fn set_power(&self, on: bool) -> Result<(), ControlError> {
        self.send(Command::Power { on }).await
    }

    /// Mute or unmute the outputs.
    pub async fn set_mute(&self, on: bool) -> Result<(), ControlError> {
        self.send(Command::Mute { on }).await
    }

    /// Set the volume in dB.
    ///
    /// The requested value is clamped to the device's operating range
    /// of -96.0 to 0.0 dB and rounded to the nearest 0.5 dB step, the
    /// finest resolution the encoding can express.
    pub async fn set_volume(&self, db: f64) -> Result<(), ControlError> {
        let clamped = db.clamp(VOLUME_MIN_DB, VOLUME_MAX_DB);
        let snapped = (clamped * 2.0).round() / 2.0;
        if snapped != db {
            debug!(requested = db, sent = snapped, "adjusted volume request");
        }
        self.send(Command::Volume { db: snapped }).await
    }

    /// Switch to an input channel, by status-frame channel index.
    ///
    /// Fails with an encode error for channels the device does not
    /// expose over the network (indices 6-13 and anything above 14).
    pub async fn set_channel(&self, index: u8) -> Result<(), ControlError> {
        self.send(Command::Channel { index }).await
    }

    /// Read the current power state and send the opposite.
    pub async fn toggle_power(&self, timeout: Duration) -> Result<(), ControlError> {
        let status = self.status(timeout).await?;
        self.set_power(!status.powered).await
    }

    /// Read the current mute state and send the opposite.
    pub async fn toggle_mute(&self, timeout: Duration) -> Result<(), ControlError> {
        let status = self.status(timeout).await?;
        self.set_mute(!status.muted).await
    }

    /// Encode and transmit one logical command.
    async fn send(&self, command: Command) -> Result<(), ControlError> {
        let device = self
            .session
            .lock()
            .await
            .device
            .ok_or(ControlError::NoDevice)?;

        let mut frame = CommandFrame::encode(&command)?;
        transport::send_command(&self.session, device, self.config.command_port, &mut frame).await
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
