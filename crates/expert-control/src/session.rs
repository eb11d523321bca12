//! Per-controller session state

use std::net::IpAddr;

/// Mutable state shared by all commands issued through one controller
///
/// Holds the discovered or configured device address and the packet
/// counter. The counter only ever moves forward for the lifetime of the
/// controller; the on-wire fields take its low bytes, so it wraps per
/// the field width rather than resetting. Access must be serialized by
/// the owner (the controller keeps it behind a mutex).
#[derive(Debug)]
pub struct SessionState {
    /// Device address, once known
    pub device: Option<IpAddr>,
    counter: u32,
}

impl SessionState {
    /// Create session state, optionally with a preconfigured address.
    pub fn new(device: Option<IpAddr>) -> Self {
        Self { device, counter: 0 }
    }

    /// Return the current counter value and advance it.
    pub fn next_counter(&mut self) -> u32 {
        let current = self.counter;
        self.counter = self.counter.wrapping_add(1);
        current
    }
}
