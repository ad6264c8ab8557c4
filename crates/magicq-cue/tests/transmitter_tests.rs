//! Transmitter tests over loopback UDP and mock sockets

mod common;

use common::Wire;
use magicq_cue::{
    CueSettings, Field, FieldValue, MagicQCue, OscSettings, OscTransmitter, Operation,
    PaddingMode, Playable, Pulsable, TransportError,
};
use magicq_test_utils::{address_of, init_test_logging, UdpCapture, DEFAULT_TIMEOUT};
use rosc::OscPacket;
use std::net::SocketAddr;
use std::time::Duration;

fn settings_for(capture: &UdpCapture) -> OscSettings {
    OscSettings::with_port(0).with_destination(capture.addr())
}

fn live(playback: i16) -> CueSettings {
    CueSettings {
        playback,
        ..Default::default()
    }
}

// ============================================================================
// Loopback UDP
// ============================================================================

#[test]
fn test_datagram_arrives() {
    init_test_logging();
    let capture = UdpCapture::bind();
    let mut transmitter = OscTransmitter::new(settings_for(&capture));

    let sent = transmitter.send(Operation::Activate, &live(3)).unwrap();
    assert_eq!(sent, 12);
    assert!(transmitter.is_bound());
    assert_ne!(transmitter.local_addr().map(|a| a.port()), Some(0));

    let datagram = capture.recv(DEFAULT_TIMEOUT).expect("no datagram");
    assert_eq!(datagram, b"/rpc/3A\0,\0\0\0".to_vec());
}

#[test]
fn test_socket_is_reused_between_sends() {
    let capture = UdpCapture::bind();
    let mut transmitter = OscTransmitter::new(settings_for(&capture));

    transmitter.send(Operation::Go, &live(1)).unwrap();
    let first = transmitter.local_addr();
    transmitter.send(Operation::Release, &live(1)).unwrap();
    assert_eq!(transmitter.local_addr(), first);

    let addresses: Vec<String> = capture
        .collect(2, DEFAULT_TIMEOUT)
        .iter()
        .map(|d| address_of(d))
        .collect();
    assert_eq!(addresses, vec!["/rpc/1G", "/rpc/1R"]);
}

#[test]
fn test_legacy_padding_on_the_wire() {
    let capture = UdpCapture::bind();
    let mut transmitter = OscTransmitter::new(settings_for(&capture));

    // 9 bytes with the terminator pads to 10
    transmitter.send(Operation::Activate, &live(10)).unwrap();
    let datagram = capture.recv(DEFAULT_TIMEOUT).unwrap();
    assert_eq!(datagram.len(), 14);
    assert_eq!(&datagram[..8], b"/rpc/10A");
    assert_eq!(&datagram[8..], b"\0\0,\0\0\0");
}

#[test]
fn test_strict_padding_decodes_with_rosc() {
    let capture = UdpCapture::bind();
    let settings = settings_for(&capture).with_padding(PaddingMode::Strict);
    let mut transmitter = OscTransmitter::new(settings);

    let cue = CueSettings {
        playback: 10,
        level: 100,
        ..Default::default()
    };
    transmitter.send(Operation::SetLevel, &cue).unwrap();

    let datagram = capture.recv(DEFAULT_TIMEOUT).unwrap();
    assert_eq!(datagram.len() % 4, 0);

    let (_, packet) = rosc::decoder::decode_udp(&datagram).unwrap();
    match packet {
        OscPacket::Message(msg) => {
            assert_eq!(msg.addr, "/rpc/10,100L");
            assert!(msg.args.is_empty());
        }
        other => panic!("Expected message, got {:?}", other),
    }
}

#[test]
fn test_encode_error_sends_nothing() {
    let capture = UdpCapture::bind();
    let mut transmitter = OscTransmitter::new(settings_for(&capture));

    let cue = CueSettings {
        playback: 1,
        jump_cue_id: "9".repeat(30),
        ..Default::default()
    };
    let result = transmitter.send(Operation::JumpToCueId, &cue);
    assert!(matches!(result, Err(TransportError::Encode(_))));

    capture.expect_silence(Duration::from_millis(100));
}

#[test]
fn test_cue_fires_to_console() {
    init_test_logging();
    let capture = UdpCapture::bind();
    let mut cue = MagicQCue::with_settings(settings_for(&capture));

    cue.set(Field::Playback, FieldValue::Int(2)).unwrap();
    cue.set(Field::Level, FieldValue::Int(60)).unwrap();
    cue.set(Field::JumpCueId, FieldValue::Text("3".into()))
        .unwrap();
    for field in [
        Field::ActionActivate,
        Field::ActionLevel,
        Field::ActionGo,
        Field::ActionJump,
        Field::ActionStop,
        Field::ActionRelease,
    ] {
        cue.set(field, FieldValue::Bool(true)).unwrap();
    }

    cue.play().unwrap();
    cue.pulse(0);

    let addresses: Vec<String> = capture
        .collect(6, DEFAULT_TIMEOUT)
        .iter()
        .map(|d| address_of(d))
        .collect();
    assert_eq!(
        addresses,
        vec!["/rpc/2A", "/rpc/2,60L", "/rpc/2G", "/rpc/2,3J", "/rpc/2A", "/rpc/2R"]
    );
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn test_send_failure_drops_socket_and_rebinds() {
    let wire = Wire::default();
    let mut transmitter = OscTransmitter::with_binder(OscSettings::with_port(0), wire.binder());

    transmitter.send(Operation::Go, &live(1)).unwrap();
    assert_eq!(wire.binds.get(), 1);

    wire.fail_sends.set(1);
    let result = transmitter.send(Operation::Go, &live(1));
    assert!(matches!(result, Err(TransportError::Send { .. })));
    assert!(!transmitter.is_bound());
    assert_eq!(wire.drops.get(), 1);

    transmitter.send(Operation::Go, &live(1)).unwrap();
    assert_eq!(wire.binds.get(), 2);
    assert_eq!(wire.socket_ids(), vec![1, 2]);
}

#[test]
fn test_bind_failure_is_retried_on_next_send() {
    let wire = Wire::default();
    let mut transmitter = OscTransmitter::with_binder(OscSettings::with_port(8000), wire.binder());
    wire.fail_binds.set(1);

    let result = transmitter.send(Operation::Release, &live(4));
    match result {
        Err(TransportError::Bind { addr, .. }) => {
            assert_eq!(addr, "0.0.0.0:8000".parse().unwrap())
        }
        other => panic!("Expected bind error, got {:?}", other),
    }
    assert!(!transmitter.is_bound());

    transmitter.send(Operation::Release, &live(4)).unwrap();
    assert!(transmitter.is_bound());
    assert_eq!(wire.addresses(), vec!["/rpc/4R"]);
}

#[test]
fn test_datagrams_go_to_the_destination() {
    let wire = Wire::default();
    let settings = OscSettings::with_port(7000).with_destination("10.1.2.3:7001".parse().unwrap());
    let mut transmitter = OscTransmitter::with_binder(settings, wire.binder());

    transmitter.send(Operation::Stop, &live(9)).unwrap();

    let sent = wire.sent.borrow();
    assert_eq!(sent[0].2, "10.1.2.3:7001".parse().unwrap());
    assert_eq!(address_of(&sent[0].1), "/rpc/9S");
}

#[test]
fn test_ipv6_destination_binds_ipv6_wildcard() {
    let wire = Wire::default();
    let settings = OscSettings::from_lookup(|key| match key {
        magicq_cue::PORT_ENV => Some("47123".to_string()),
        magicq_cue::HOST_ENV => Some("::1".to_string()),
        _ => None,
    });
    let mut transmitter = OscTransmitter::with_binder(settings, wire.binder());

    transmitter.send(Operation::Go, &live(2)).unwrap();

    assert_eq!(*wire.bound.borrow(), vec!["[::]:47123".parse::<SocketAddr>().unwrap()]);
    assert_eq!(wire.sent.borrow()[0].2, "[::1]:47123".parse().unwrap());
}

#[test]
fn test_changing_settings_closes_socket() {
    let wire = Wire::default();
    let mut transmitter = OscTransmitter::with_binder(OscSettings::with_port(0), wire.binder());
    transmitter.send(Operation::Go, &live(1)).unwrap();

    transmitter.set_settings(OscSettings::with_port(0));
    assert!(transmitter.is_bound());

    transmitter.set_settings(OscSettings::with_port(0).with_padding(PaddingMode::Strict));
    assert!(!transmitter.is_bound());
    assert_eq!(transmitter.settings().padding, PaddingMode::Strict);

    transmitter.close();
    assert_eq!(wire.drops.get(), 1);
}
