use std::time::Duration;

use super::*;
use crate::components::cartridge::{CartridgeRom, SimulatedSlot};
use crate::components::gpio::{Level, SimulatedPort};
use crate::components::indicator::AccessLed;
use crate::components::wiring::Wiring;
use crate::protocol::header::split_reply;
use crate::protocol::info::{DeviceInfo, DEVICE_INFO, DEVICE_INFO_SIZE};
use crate::protocol::transport::ScriptedTransport;

fn config() -> BridgeConfig {
    BridgeConfig {
        read_timeout: Duration::from_millis(10),
        announce_blinks: 2,
        blink_on: Duration::ZERO,
        blink_off: Duration::ZERO,
    }
}

fn bridge() -> Bridge<SimulatedSlot, AccessLed<SimulatedPort>> {
    let image: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let rom = CartridgeRom::try_from(image).unwrap();
    let bus = CartridgeBus::new(SimulatedSlot::new(rom, Wiring::STANDARD), Wiring::STANDARD);
    let led = AccessLed::new(SimulatedPort::default(), Wiring::STANDARD.access_led);
    Bridge::new(bus, led, config())
}

/// Runs one exchange and returns the decoded reply with its payload.
fn roundtrip(
    bridge: &mut Bridge<SimulatedSlot, AccessLed<SimulatedPort>>,
    transport: &mut ScriptedTransport,
) -> (Header, Vec<u8>) {
    let exchange = bridge.exchange(transport).unwrap();
    let written = transport.take_written();
    let (header, payload, rest) = split_reply(&written).unwrap();
    assert!(rest.is_empty(), "exactly one frame");
    assert_eq!(exchange, Exchange::Replied(header));
    assert!(header.is_intact(payload), "reply checksum");
    (header, payload.to_vec())
}

#[test]
fn get_info() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'I', 0, 0, &[]), &[]);

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(header.reply_length as usize, DEVICE_INFO_SIZE);
    assert_eq!(DeviceInfo::decode(&payload), Some(DEVICE_INFO));
}

#[test]
fn read_single() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'r', 0x1100, 1, &[]), &[]);

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(payload, vec![(0x100 % 251) as u8]);
    assert_eq!(bridge.bus().gpio().contention_events(), 0);
}

#[test]
fn emulate_single_echoes_payload() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'e', 0x0042, 1, &[0x99]), &[0x99]);

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(payload, vec![0x99]);
    assert_eq!(bridge.bus().gpio().driven_data(), 0x99);
}

#[test]
fn corrupted_checksum() {
    for cmd in [b'r', b'e', b'R', b'I', b'w', b'?'] {
        let mut bridge = bridge();
        let mut transport = ScriptedTransport::new();
        let mut request = Header::request(cmd, 0x0010, 4, &[1]);
        request.checksum ^= 0x0100;
        transport.push_frame(&request, &[1]);

        let (header, payload) = roundtrip(&mut bridge, &mut transport);
        assert!(
            ErrorFlags::from_bits_truncate(header.status).contains(ErrorFlags::CHECKSUM),
            "cmd {}",
            cmd as char
        );
        assert_eq!(header.reply_length, 0);
        assert!(payload.is_empty());
        assert_eq!(bridge.indicator().activations(), 0, "not dispatched");
    }
}

#[test]
fn oversized_request_skips_payload_and_dispatch() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    let mut request = Header::request(b'I', 0, 0, &[]);
    request.request_length = BUFFER_SIZE as u16 + 1;
    request.seal(&[]);
    let follow_up = Header::request(b'I', 0, 0, &[]);
    transport.push_frame(&request, &[]).push_frame(&follow_up, &[]);

    let (header, _) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, ErrorFlags::LENGTH.bits());
    assert_eq!(header.reply_length, 0);
    assert_eq!(bridge.indicator().activations(), 0);

    // The follow-up frame was not swallowed as payload.
    let (header, _) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(header.reply_length as usize, DEVICE_INFO_SIZE);
}

#[test]
fn sync_and_idle_produce_no_reply() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_bytes(&[SYNC; HEADER_SIZE]).push_stall();

    assert_eq!(bridge.exchange(&mut transport).unwrap(), Exchange::Resync);
    assert_eq!(bridge.exchange(&mut transport).unwrap(), Exchange::Resync);
    assert!(transport.written().is_empty());
}

#[test]
fn partial_header_is_a_timeout() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_bytes(&[b'I', 0, 0, 0]).push_stall();

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.cmd, b'I');
    assert_eq!(header.status, ErrorFlags::TIMEOUT.bits());
    assert!(payload.is_empty());
    assert_eq!(bridge.indicator().activations(), 0);
}

#[test]
fn short_payload_is_a_timeout() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    let request = Header::request(b'e', 0x0001, 1, &[7, 7, 7]);
    transport.push_frame(&request, &[7]).push_stall();

    let (header, _) = roundtrip(&mut bridge, &mut transport);
    let status = ErrorFlags::from_bits_truncate(header.status);
    assert!(status.contains(ErrorFlags::TIMEOUT | ErrorFlags::CHECKSUM));
    assert_eq!(header.reply_length, 0);
}

#[test]
fn errors_accumulate() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    let mut request = Header::request(b'r', 0x2000, 1, &[]);
    request.checksum = request.checksum.wrapping_add(1);
    transport.push_frame(&request, &[]);

    let (header, _) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(
        header.status,
        (ErrorFlags::CHECKSUM | ErrorFlags::RANGE).bits()
    );
}

#[test]
fn unsupported_command() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'W', 0x0000, 0, &[]), &[]);

    let (header, _) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, ErrorFlags::COMMAND.bits());
    assert_eq!(bridge.indicator().activations(), 1);
    assert!(!bridge.indicator().is_lit());
    let led = Wiring::STANDARD.access_led;
    assert_eq!(bridge.indicator().gpio().level(led), Level::High, "active-low LED off");
}

#[test]
fn read_block_within_bound() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'R', 0x0000, 0x0FFF, &[]), &[]);

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(payload.len(), 0x0FFF);
}

#[test]
fn read_block_across_boundary() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'R', 0x0FFE, 4, &[]), &[]);

    let (header, payload) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, ErrorFlags::RANGE.bits());
    assert!(payload.is_empty());
}

#[test]
fn oversized_reply_length_is_clamped_not_flagged() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport.push_frame(&Header::request(b'I', 0, 0xFFFF, &[]), &[]);

    let (header, _) = roundtrip(&mut bridge, &mut transport);
    assert_eq!(header.status, 0);
    assert_eq!(header.reply_length as usize, DEVICE_INFO_SIZE);
}

#[test]
fn reply_length_guard_is_unreachable() {
    for cmd in (0..=255u8).filter(|c| *c != SYNC) {
        for address in [0x0000, 0x0800, 0x1000] {
            let mut bridge = bridge();
            let mut transport = ScriptedTransport::new();
            let payload = [0x5A];
            transport.push_frame(&Header::request(cmd, address, 0xFFFF, &payload), &payload);

            let (header, _) = roundtrip(&mut bridge, &mut transport);
            let status = ErrorFlags::from_bits_truncate(header.status);
            assert!(!status.contains(ErrorFlags::REPLY_LENGTH), "cmd {:#04x}", cmd);
            assert!(header.reply_length as usize <= BUFFER_SIZE);
        }
    }
}

#[test]
fn serve_until_disconnect() {
    let mut bridge = bridge();
    let mut transport = ScriptedTransport::new();
    transport
        .push_frame(&Header::request(b'I', 0, 0, &[]), &[])
        .push_bytes(&[SYNC])
        .push_stall()
        .push_frame(&Header::request(b'd', 0, 0, &[]), &[])
        .push_frame(&Header::request(b'r', 0x1FFF, 1, &[]), &[]);

    let stats = bridge.serve(&mut transport).unwrap();
    assert_eq!(
        stats,
        SessionStats {
            replies: 3,
            error_replies: 1,
            resyncs: 1,
        }
    );
    assert!(!transport.is_connected());
}

#[test]
fn announce_blinks() {
    let mut bridge = bridge();
    bridge.announce();
    assert_eq!(bridge.indicator().activations(), 2);
    assert!(!bridge.indicator().is_lit());
}
