//! Integration tests for the amplifier control layer
//!
//! These tests run the full UDP path over loopback against the
//! simulated amplifier from `expert-sim`:
//! - Passive discovery from status broadcasts
//! - Status decoding end to end
//! - The 4x retransmission scheme (distinct counters, valid checksums)
//! - Command effects on amplifier state (power, mute, volume, channel)
//! - Timeout and decode failure surfacing

use std::net::SocketAddr;
use std::time::Duration;

use expert_control::{ControlError, Controller, ControllerConfig, SEND_REPEAT};
use expert_proto::{crc16, DecodeError};
use expert_sim::{SimAmplifier, VirtualAmplifier};

mod helpers {
    use super::*;

    pub const STATUS_INTERVAL: Duration = Duration::from_millis(50);
    pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

    /// Reserve an ephemeral UDP port on loopback.
    pub fn free_port() -> u16 {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind ephemeral port");
        socket.local_addr().expect("local addr").port()
    }

    /// Spawn a simulated amplifier broadcasting to a fresh status port.
    pub async fn spawn_sim() -> (SimAmplifier, u16) {
        let status_port = free_port();
        let target: SocketAddr = format!("127.0.0.1:{status_port}").parse().unwrap();
        let sim = SimAmplifier::spawn(
            VirtualAmplifier::new("Test Expert"),
            target,
            STATUS_INTERVAL,
        )
        .await
        .expect("spawn sim");
        (sim, status_port)
    }

    /// Controller wired to a simulated amplifier's ports.
    pub fn controller_for(sim: &SimAmplifier, status_port: u16) -> Controller {
        Controller::with_config(ControllerConfig {
            device: Some("127.0.0.1".parse().unwrap()),
            status_port,
            command_port: sim.command_addr().port(),
        })
    }

    /// Wait until the sim has received `count` command frames.
    pub async fn wait_for_frames(sim: &SimAmplifier, count: usize) -> Vec<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            {
                let state = sim.state();
                let amp = state.lock().await;
                if amp.received().len() >= count {
                    return amp.received().to_vec();
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} command frames"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

// ============================================================================
// Discovery and Status
// ============================================================================

#[tokio::test]
async fn discovery_finds_simulated_amplifier() {
    let (_sim, status_port) = helpers::spawn_sim().await;
    let controller = Controller::with_config(ControllerConfig {
        device: None,
        status_port,
        ..Default::default()
    });

    let addr = controller
        .discover(helpers::RECV_TIMEOUT)
        .await
        .expect("discovery");
    assert_eq!(addr, "127.0.0.1".parse::<std::net::IpAddr>().unwrap());
}

#[tokio::test]
async fn discovery_times_out_on_silence() {
    let status_port = helpers::free_port();
    let controller = Controller::with_config(ControllerConfig {
        device: None,
        status_port,
        ..Default::default()
    });

    let result = controller.discover(Duration::from_millis(200)).await;
    assert!(matches!(result, Err(ControlError::Timeout(_))));
}

#[tokio::test]
async fn discovery_skips_undersized_datagrams() {
    let (_sim, status_port) = helpers::spawn_sim().await;

    // Extra chatter on the port: 100-byte datagrams that are not status
    let noise = tokio::spawn(async move {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        loop {
            let _ = socket
                .send_to(&[0u8; 100], ("127.0.0.1", status_port))
                .await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let controller = Controller::with_config(ControllerConfig {
        device: None,
        status_port,
        ..Default::default()
    });
    let addr = controller.discover(helpers::RECV_TIMEOUT).await;
    noise.abort();
    assert!(addr.is_ok());
}

#[tokio::test]
async fn status_decodes_simulated_frame() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    let status = controller.status(helpers::RECV_TIMEOUT).await.expect("status");
    assert_eq!(status.device_name, "Test Expert");
    assert!(status.powered);
    assert!(!status.muted);
    assert_eq!(status.active_channel, 0);
    assert_eq!(status.volume_db, -20.0);
    assert!(status.checksum_valid);
    assert_eq!(status.channels.get(&1).map(String::as_str), Some("Phono"));
    assert_eq!(status.channels.get(&14).map(String::as_str), Some("Air"));
}

#[tokio::test]
async fn status_surfaces_decode_error_for_short_datagrams() {
    let status_port = helpers::free_port();

    // Only undersized datagrams on this port
    let noise = tokio::spawn(async move {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        loop {
            let _ = socket
                .send_to(&[0u8; 100], ("127.0.0.1", status_port))
                .await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let controller = Controller::with_config(ControllerConfig {
        device: None,
        status_port,
        ..Default::default()
    });
    let result = controller.status(helpers::RECV_TIMEOUT).await;
    noise.abort();
    assert!(matches!(
        result,
        Err(ControlError::Decode(DecodeError::Truncated { len: 100, .. }))
    ));
}

// ============================================================================
// Command Transmission
// ============================================================================

#[tokio::test]
async fn command_is_transmitted_four_times_with_distinct_counters() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    controller.set_power(false).await.expect("send power");
    let frames = helpers::wait_for_frames(&sim, SEND_REPEAT).await;
    assert_eq!(frames.len(), SEND_REPEAT);

    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.len(), 142);
        assert_eq!(&frame[..2], &[0x44, 0x72]);
        // Fresh controller: counters 0..4, strictly increasing
        assert_eq!(frame[3], i as u8);
        assert_eq!(frame[5], (i as u8) >> 1);
        // Each attempt independently signed
        let stored = u16::from_be_bytes([frame[12], frame[13]]);
        assert_eq!(stored, crc16(&frame[..12]));
    }

    let state = sim.state();
    assert!(!state.lock().await.powered());
}

#[tokio::test]
async fn counter_keeps_advancing_across_commands() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    controller.set_mute(true).await.expect("mute");
    controller.set_mute(false).await.expect("unmute");
    let frames = helpers::wait_for_frames(&sim, 2 * SEND_REPEAT).await;

    let counters: Vec<u8> = frames.iter().map(|f| f[3]).collect();
    assert_eq!(counters, vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn volume_command_reaches_the_amplifier() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    controller.set_volume(-35.5).await.expect("volume");
    helpers::wait_for_frames(&sim, SEND_REPEAT).await;

    let state = sim.state();
    assert_eq!(state.lock().await.volume_raw(), 124); // -35.5 dB
}

#[tokio::test]
async fn volume_is_clamped_and_snapped() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    // +10 dB is above the recommended range: clamped to 0.0
    controller.set_volume(10.0).await.expect("volume");
    helpers::wait_for_frames(&sim, SEND_REPEAT).await;
    {
        let state = sim.state();
        assert_eq!(state.lock().await.volume_raw(), 195); // 0.0 dB
    }

    // -20.3 dB is not a half-step: rounds to -20.5
    controller.set_volume(-20.3).await.expect("volume");
    helpers::wait_for_frames(&sim, 2 * SEND_REPEAT).await;
    let state = sim.state();
    assert_eq!(state.lock().await.volume_raw(), 154); // -20.5 dB
}

#[tokio::test]
async fn channel_commands_switch_inputs() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    controller.set_channel(5).await.expect("spotify");
    helpers::wait_for_frames(&sim, SEND_REPEAT).await;
    {
        let state = sim.state();
        assert_eq!(state.lock().await.channel(), 5);
    }

    // Phono, the hardcoded-bytes special case
    controller.set_channel(1).await.expect("phono");
    helpers::wait_for_frames(&sim, 2 * SEND_REPEAT).await;
    let state = sim.state();
    assert_eq!(state.lock().await.channel(), 1);
}

#[tokio::test]
async fn unsupported_channel_sends_nothing() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    let result = controller.set_channel(9).await;
    assert!(matches!(result, Err(ControlError::Encode(_))));

    // Give any stray datagrams time to arrive, then confirm silence
    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = sim.state();
    assert!(state.lock().await.received().is_empty());
}

// ============================================================================
// Toggles (status read + inverse send)
// ============================================================================

#[tokio::test]
async fn toggle_mute_reads_then_inverts() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    controller
        .toggle_mute(helpers::RECV_TIMEOUT)
        .await
        .expect("toggle");
    helpers::wait_for_frames(&sim, SEND_REPEAT).await;
    {
        let state = sim.state();
        assert!(state.lock().await.muted());
    }

    controller
        .toggle_mute(helpers::RECV_TIMEOUT)
        .await
        .expect("toggle back");
    helpers::wait_for_frames(&sim, 2 * SEND_REPEAT).await;
    let state = sim.state();
    assert!(!state.lock().await.muted());
}

#[tokio::test]
async fn toggle_power_reads_then_inverts() {
    let (sim, status_port) = helpers::spawn_sim().await;
    let controller = helpers::controller_for(&sim, status_port);

    // Sim starts powered on; toggle should turn it off
    controller
        .toggle_power(helpers::RECV_TIMEOUT)
        .await
        .expect("toggle");
    helpers::wait_for_frames(&sim, SEND_REPEAT).await;
    let state = sim.state();
    assert!(!state.lock().await.powered());
}
