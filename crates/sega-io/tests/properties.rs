//! Property suites for resolution, framing and bounded handshakes.

#![allow(clippy::pedantic, clippy::nursery)]

use log as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use proptest::prelude::*;
use sega_io::saturn::{send_frame, ID2_NON_CONNECTION};
use sega_io::signal::{line_mask, SignalLine};
use sega_io::sim::SimBus;
use sega_io::timing::{spin_limit, WaitKind};
use sega_io::{
    resolve, AdapterConfig, ControllerStates, DeviceType, GpioBus, IoFault, MultitapMode,
    NoKeyboard, PortId, SaturnFrame, System, WIRED_MAX_DEV,
};

fn system() -> impl Strategy<Value = System> {
    prop_oneof![Just(System::Genesis), Just(System::Saturn)]
}

fn multitap() -> impl Strategy<Value = MultitapMode> {
    (0u32..6).prop_map(MultitapMode::from_u32)
}

fn config() -> impl Strategy<Value = AdapterConfig> {
    (system(), multitap(), prop::array::uniform12(0u8..6)).prop_map(
        |(system, multitap, modes)| {
            let mut config = AdapterConfig::new(system, multitap);
            config.dev_modes = modes;
            config
        },
    )
}

fn states(seed: &[u8]) -> ControllerStates {
    let states = ControllerStates::new();
    for logical in 0..WIRED_MAX_DEV {
        states.port_or_idle(logical).store_bytes(0, seed);
    }
    states
}

/// Walks `[header, payload...]` sub-frames and returns the total byte count
/// they declare.
fn declared_len(sub_frames: &[u8]) -> usize {
    let mut cursor = 0;
    while let Some(header) = sub_frames.get(cursor) {
        let count = if *header == ID2_NON_CONNECTION << 4 {
            0
        } else {
            usize::from(header & 0xF)
        };
        cursor += 1 + count;
    }
    cursor
}

proptest! {
    #[test]
    fn property_resolution_is_idempotent(config in config()) {
        prop_assert_eq!(resolve(&config), resolve(&config));
    }

    #[test]
    fn property_disabled_multitap_yields_leaf_ports(system in system(), modes in prop::array::uniform12(0u8..6)) {
        let mut config = AdapterConfig::new(system, MultitapMode::Disabled);
        config.dev_modes = modes;
        let layout = resolve(&config);
        for port in PortId::ALL {
            let resolved = layout.port(port);
            prop_assert!(!resolved.device.is_multitap());
            prop_assert_eq!(usize::from(resolved.offset), port.index());
            prop_assert!(resolved.slots().is_empty());
        }
    }

    #[test]
    fn property_dual_hubs_cover_logical_ports_once(system in system(), modes in prop::array::uniform12(0u8..6)) {
        let mut config = AdapterConfig::new(system, MultitapMode::Dual);
        config.dev_modes = modes;
        let layout = resolve(&config);
        let first = layout.port(PortId::P1).logical_range();
        let second = layout.port(PortId::P2).logical_range();
        prop_assert!(layout.port(PortId::P1).device.is_multitap());
        prop_assert!(layout.port(PortId::P2).device.is_multitap());
        prop_assert_eq!(first.start, 0);
        prop_assert_eq!(first.end, second.start);
        prop_assert!(second.end <= WIRED_MAX_DEV);
    }

    #[test]
    fn property_frame_length_matches_declared_payload(
        multitap in multitap(),
        modes in prop::array::uniform12(0u8..6),
        seed in prop::collection::vec(any::<u8>(), 8),
    ) {
        let mut config = AdapterConfig::new(System::Saturn, multitap);
        config.dev_modes = modes;
        let layout = resolve(&config);
        let states = states(&seed);
        for port in layout.ports() {
            let mut frame = SaturnFrame::new();
            let Ok(()) = frame.build(port, &states, &mut NoKeyboard) else {
                prop_assert!(frame.is_empty());
                continue;
            };
            let bytes = frame.as_bytes();
            prop_assert_eq!(bytes.last(), Some(&0x01));
            if port.device == DeviceType::SaturnMultitap {
                prop_assert_eq!(bytes[0], 0x41);
                prop_assert_eq!(usize::from(bytes[1] >> 4), port.slots().len());
                prop_assert_eq!(2 + declared_len(&bytes[2..bytes.len() - 1]) + 1, bytes.len());
            } else {
                prop_assert_eq!(usize::from(bytes[0] & 0xF) + 2, bytes.len());
            }
        }
    }

    #[test]
    fn property_silent_console_times_out_with_tl_high(
        frame in prop::collection::vec(any::<u8>(), 1..45),
        port in prop_oneof![Just(PortId::P1), Just(PortId::P2)],
    ) {
        let mut bus = SimBus::new();
        bus.set_input_levels(line_mask(port, SignalLine::ReplyA), 0);

        let result = send_frame(&mut bus, port, &frame);

        prop_assert_eq!(result, Err(IoFault::HandshakeTimeout));
        let limit = u64::from(spin_limit(WaitKind::HandshakeAck));
        prop_assert!(bus.input_reads() <= 2 * (limit + 1));
        let tl = line_mask(port, SignalLine::ReplyB);
        let bank = sega_io::signal::line_addr(port, SignalLine::ReplyB).bank;
        prop_assert_eq!(bus.output(bank) & tl, tl);
        prop_assert!(bus.received_bytes(port).is_empty());
    }
}
