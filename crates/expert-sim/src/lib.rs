//! Simulated Expert Pro amplifier
//!
//! This crate provides a virtual amplifier for exercising the codec and
//! control layers without hardware. It includes:
//!
//! - **VirtualAmplifier**: pure state machine that renders authentic
//!   598-byte status frames and applies 142-byte command frames
//! - **SimAmplifier**: a tokio task that puts a `VirtualAmplifier` on
//!   real loopback UDP sockets, broadcasting status at a configurable
//!   cadence and accepting commands, the way the device does
//!
//! # Example
//!
//! ```rust
//! use expert_sim::VirtualAmplifier;
//! use expert_proto::decode_status;
//!
//! let mut amp = VirtualAmplifier::new("Bench Amp");
//! amp.set_volume_db(-20.0);
//!
//! let frame = amp.status_frame();
//! let snapshot = decode_status(&frame).unwrap();
//! assert_eq!(snapshot.volume_db, -20.0);
//! assert!(snapshot.checksum_valid);
//! ```

pub mod amplifier;
pub mod task;

pub use amplifier::VirtualAmplifier;
pub use task::SimAmplifier;
