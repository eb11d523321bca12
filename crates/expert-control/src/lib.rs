//! Expert Pro Amplifier Control
//!
//! This crate owns everything between the wire codec in `expert-proto`
//! and the caller: UDP transport, passive discovery, the session packet
//! counter, and the fixed 4x retransmission scheme that compensates for
//! the protocol's complete lack of acknowledgments.
//!
//! # Architecture
//!
//! - [`session`]: per-controller mutable state (device address, packet
//!   counter). The counter is the only shared mutable state in the
//!   crate and is serialized behind a mutex.
//! - [`transport`]: socket plumbing. Discovery and status reads listen
//!   on the broadcast port with a caller-supplied timeout; sends stamp
//!   the counter and checksum into the frame per attempt.
//! - [`controller`]: the facade consumed by CLI/REST layers. Two real
//!   operations, "read status" and "send command", plus convenience
//!   wrappers per command kind.
//!
//! Commands are fire-and-forget: success means "transmitted four
//! times", never "applied". Callers poll [`Controller::status`]
//! afterwards to confirm the effect, subject to the device's ~1 Hz
//! broadcast cadence.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use expert_control::Controller;
//!
//! # async fn example() -> Result<(), expert_control::ControlError> {
//! let controller = Controller::new();
//! let addr = controller.discover(Duration::from_secs(2)).await?;
//! println!("amplifier at {addr}");
//!
//! controller.set_volume(-20.0).await?;
//! let status = controller.status(Duration::from_secs(2)).await?;
//! println!("volume now {} dB", status.volume_db);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod session;
pub mod transport;

pub use controller::{Controller, ControllerConfig};
pub use error::ControlError;
pub use session::SessionState;
pub use transport::{COMMAND_PORT, SEND_REPEAT, STATUS_PORT};

// The snapshot type crosses the facade boundary; spare callers a direct
// dependency on the codec crate for it.
pub use expert_proto::{Command, StatusSnapshot};
