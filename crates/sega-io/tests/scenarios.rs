//! End-to-end bus scenarios against the simulated console.

#![allow(clippy::pedantic, clippy::nursery, clippy::too_many_lines)]

use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use sega_io::genesis::{direction_mask, vertical_mask, MachineState};
use sega_io::signal::{line_mask, output_mask, LineAddr, SignalLine, EA_SELECT_PIN};
use sega_io::sim::{th_both_high, th_low, CountingStall, QueuedScancodes, SimBus, TraceLog};
use sega_io::{
    init, resolve, Activation, AdapterConfig, Bank, ControllerStates, DevMode, DeviceType,
    Dispatch, Engine, GenesisEngine, GpioBus, IoFault, MultitapMode, NoKeyboard, Phase, PortId,
    SaturnDispatcher, System, TraceEvent,
};

const HOLD: u32 = 2;

fn latches(log: &TraceLog) -> Vec<(PortId, Phase, u32, u32)> {
    log.events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::LatchDriven {
                port,
                phase,
                low,
                high,
            } => Some((port, phase, low, high)),
            _ => None,
        })
        .collect()
}

/// Stores six latch words for `logical`: every bit outside the port's own
/// lines is high, the port's own bits carry `seed`-derived data.
fn store_latch_words(states: &ControllerStates, logical: usize, port: PortId, seed: u32) {
    let buffer = states.port_or_idle(logical);
    for word in 0..6 {
        let bank = if word < 3 { Bank::Low } else { Bank::High };
        let own = output_mask(port, bank);
        let data = seed.rotate_left(u32::try_from(word * 5).unwrap()) & own;
        buffer.store_word(word, !own | data);
    }
}

#[test]
fn scenario_a_three_and_six_button_sequences() {
    let config = AdapterConfig::new(System::Genesis, MultitapMode::Disabled)
        .with_modes(&[DevMode::Pad, DevMode::PadAlt]);
    let layout = resolve(&config);
    assert_eq!(layout.port(PortId::P1).device, DeviceType::Genesis3Button);
    assert_eq!(layout.port(PortId::P2).device, DeviceType::Genesis6Button);

    let states = ControllerStates::new();
    store_latch_words(&states, 0, PortId::P1, 0x5A5A_A5A5);
    store_latch_words(&states, 1, PortId::P2, 0x3C3C_C3C3);

    let mut bus = SimBus::new();
    bus.script_high(&[
        (th_both_high(), HOLD),
        (th_low(PortId::P1), HOLD),
        (th_both_high(), HOLD),
        (th_low(PortId::P1), HOLD),
    ]);
    let p2_th = line_mask(PortId::P2, SignalLine::Handshake);
    for _ in 0..4 {
        bus.script_high(&[(0, HOLD), (p2_th, HOLD)]);
    }

    let log = TraceLog::default();
    let mut engine = GenesisEngine::new(&layout, &states, bus, CountingStall::default());
    engine.set_trace_sink(Box::new(log.clone()));

    assert_eq!(
        engine.poll_once(),
        Activation::Completed { port: PortId::P1 }
    );
    assert_eq!(
        engine.poll_once(),
        Activation::Completed { port: PortId::P2 }
    );

    let driven = latches(&log);
    let p1 = states.port_or_idle(0);
    let p1_phases: Vec<_> = driven
        .iter()
        .filter(|(port, ..)| *port == PortId::P1)
        .collect();
    assert_eq!(p1_phases.len(), 3);
    let own = output_mask(PortId::P1, Bank::Low);
    assert_eq!(p1_phases[0].1, Phase::Cycle0Low);
    assert_eq!(p1_phases[0].2 & own, p1.word(1) & own);
    assert_eq!(p1_phases[1].2 & own, p1.word(0) & own);
    assert_eq!(p1_phases[2].2 & own, p1.word(1) & own);

    let p2 = states.port_or_idle(1);
    let own_low = output_mask(PortId::P2, Bank::Low);
    let own_high = output_mask(PortId::P2, Bank::High);
    let p2_phases: Vec<_> = driven
        .iter()
        .filter(|(port, ..)| *port == PortId::P2)
        .map(|(_, phase, low, high)| (*phase, low & own_low, high & own_high))
        .collect();
    assert_eq!(
        p2_phases,
        vec![
            (Phase::Cycle0Low, p2.word(1) & own_low, p2.word(4) & own_high),
            (Phase::Cycle0High, p2.word(0) & own_low, p2.word(3) & own_high),
            (Phase::Cycle1Low, p2.word(1) & own_low, p2.word(4) & own_high),
            (Phase::Cycle1High, p2.word(0) & own_low, p2.word(3) & own_high),
            (
                Phase::Cycle2Low,
                p2.word(1) & own_low & !vertical_mask(PortId::P2),
                p2.word(4) & own_high
            ),
            (Phase::Cycle2High, p2.word(2) & own_low, p2.word(5) & own_high),
            (
                Phase::Cycle3Low,
                (p2.word(1) | direction_mask(PortId::P2)) & own_low,
                p2.word(4) & own_high
            ),
            (Phase::Cycle3High, p2.word(0) & own_low, p2.word(3) & own_high),
        ]
    );
    assert_eq!(engine.diagnostics().activations, 2);
    assert_eq!(engine.stall().stalls(), engine.stall().releases());
}

#[test]
fn scenario_b_saturn_multitap_frame() {
    let config = AdapterConfig::new(System::Saturn, MultitapMode::Slot1).with_modes(&[
        DevMode::Pad,
        DevMode::Pad,
        DevMode::PadAlt,
        DevMode::Keyboard,
        DevMode::Pad,
        DevMode::Pad,
    ]);
    let layout = resolve(&config);
    let states = ControllerStates::new();
    for logical in 0..6u8 {
        let bytes: Vec<u8> = (0..8).map(|i| (logical << 4) | i).collect();
        states
            .port_or_idle(usize::from(logical))
            .store_bytes(0, &bytes);
    }

    let mut dispatcher = SaturnDispatcher::new(&layout, &states, SimBus::new(), NoKeyboard);
    dispatcher.bus_mut().enable_echo(PortId::P1);
    dispatcher
        .bus_mut()
        .raise_interrupt(Bank::High, line_mask(PortId::P1, SignalLine::Handshake));

    let outcome = dispatcher.on_interrupt();

    let received = dispatcher.bus().received_bytes(PortId::P1);
    assert_eq!(
        outcome,
        Dispatch::Framed {
            port: PortId::P1,
            len: received.len()
        }
    );
    assert_eq!(received[0], 0x41);
    assert_eq!(received[1] >> 4, 6);

    let analog = &received[8..15];
    assert_eq!(analog.len(), 7);
    assert_eq!(analog[0], 0x16);
    assert_eq!(&analog[1..], &[0x20, 0x21, 0x22, 0x23, 0x24, 0x25]);

    let keyboard = &received[15..20];
    assert_eq!(keyboard, &[0x34, 0x30, 0x31, 0x06, 0x00]);
    assert_eq!(received.last(), Some(&0x01));
    assert_eq!(received.len(), 27);
}

#[test]
fn saturn_multitap_keyboard_slot_pulls_its_own_scancode() {
    let config = AdapterConfig::new(System::Saturn, MultitapMode::Slot1).with_modes(&[
        DevMode::Pad,
        DevMode::Keyboard,
        DevMode::Pad,
        DevMode::Pad,
        DevMode::Pad,
        DevMode::Pad,
    ]);
    let layout = resolve(&config);
    let states = ControllerStates::new();
    for logical in 0..6u8 {
        states
            .port_or_idle(usize::from(logical))
            .store_bytes(0, &[logical << 4, (logical << 4) | 1]);
    }
    let mut keyboard = QueuedScancodes::default();
    keyboard.push(1, [0x1C, 0x80]);
    keyboard.push(2, [0x55, 0x55]);

    let mut dispatcher = SaturnDispatcher::new(&layout, &states, SimBus::new(), keyboard);
    dispatcher.bus_mut().enable_echo(PortId::P1);
    let th = line_mask(PortId::P1, SignalLine::Handshake);

    dispatcher.bus_mut().raise_interrupt(Bank::High, th);
    let Dispatch::Framed { len, .. } = dispatcher.on_interrupt() else {
        panic!("frame acknowledged");
    };
    dispatcher.bus_mut().raise_interrupt(Bank::High, th);
    let second = dispatcher.on_interrupt();

    let received = dispatcher.bus().received_bytes(PortId::P1);
    assert_eq!(&received[..5], &[0x41, 0x60, 0x02, 0x00, 0x01]);
    assert_eq!(&received[5..10], &[0x34, 0x10, 0x11, 0x1C, 0x80]);
    assert_eq!(&received[10..13], &[0x02, 0x20, 0x21]);
    assert_eq!(second, Dispatch::Framed { port: PortId::P1, len });
    assert_eq!(
        &received[len + 5..len + 10],
        &[0x34, 0x10, 0x11, 0x06, 0x00],
        "queue of logical port 1 drained, the slot falls back to no key"
    );
}

#[test]
fn scenario_c_ea_sub_port_two_with_th_high_drives_second_half() {
    let config = AdapterConfig::new(System::Genesis, MultitapMode::Alternate);
    let states = ControllerStates::new();
    states
        .port_or_idle(2)
        .store_bytes(0, &[0x10, 0x11, 0x12, 0x13, 0xA4, 0xB5, 0xC6, 0xD7]);
    let mut bus = SimBus::new();
    bus.set_input_levels(
        line_mask(PortId::P2, SignalLine::ReplyA),
        line_mask(PortId::P1, SignalLine::Handshake),
    );

    let up = init(&config, &states, bus, CountingStall::default(), NoKeyboard);
    let Engine::EaPolling(mut engine) = up.engine else {
        panic!("alternate mode on Genesis starts the EA task");
    };

    let selection = engine.drive_current();

    assert_eq!(selection.sub_port(), Some(2));
    let select = LineAddr::of_pin(EA_SELECT_PIN).mask();
    assert_eq!(
        engine.bus().output(Bank::Low),
        u32::from_le_bytes([0xA4, 0xB5, 0xC6, 0xD7]) | select
    );
}

#[test]
fn scenario_d_handoff_restarts_the_first_port() {
    let config = AdapterConfig::new(System::Genesis, MultitapMode::Disabled)
        .with_modes(&[DevMode::PadAlt, DevMode::Pad]);
    let layout = resolve(&config);
    let states = ControllerStates::new();
    let p2_th = line_mask(PortId::P2, SignalLine::Handshake);
    let p1_th = line_mask(PortId::P1, SignalLine::Handshake);

    let mut bus = SimBus::new();
    bus.script_high(&[
        (th_both_high(), HOLD),
        (th_low(PortId::P1), HOLD),
        (th_both_high(), HOLD),
        (th_low(PortId::P1), HOLD),
        // Port 2 falls while port 1 waits for its Cycle1High toggle.
        (0, HOLD),
        (p2_th, HOLD),
        (0, HOLD),
        // Port 1 rises again after port 2 finished.
        (p1_th, HOLD),
    ]);
    let log = TraceLog::default();
    let mut engine = GenesisEngine::new(&layout, &states, bus, CountingStall::default());
    engine.set_trace_sink(Box::new(log.clone()));

    assert_eq!(
        engine.poll_once(),
        Activation::Completed { port: PortId::P2 }
    );
    assert_eq!(engine.machine(PortId::P1), MachineState::WaitEdge);
    assert_eq!(engine.diagnostics().handoffs, 1);

    assert_eq!(
        engine.poll_once(),
        Activation::Aborted {
            port: PortId::P1,
            cause: IoFault::PollTimeout
        }
    );

    let phases: Vec<_> = latches(&log)
        .into_iter()
        .map(|(port, phase, ..)| (port, phase))
        .collect();
    assert_eq!(
        phases,
        vec![
            (PortId::P1, Phase::Cycle0Low),
            (PortId::P1, Phase::Cycle0High),
            (PortId::P1, Phase::Cycle1Low),
            (PortId::P2, Phase::Cycle0Low),
            (PortId::P2, Phase::Cycle0High),
            (PortId::P2, Phase::Cycle1Low),
            (PortId::P1, Phase::Cycle0High),
        ]
    );
    assert!(log.events().contains(&TraceEvent::Handoff {
        from: PortId::P1,
        to: PortId::P2
    }));
}

#[test]
fn genesis_multitap_sends_tap_frame_then_returns_to_wait() {
    let config = AdapterConfig::new(System::Genesis, MultitapMode::Slot1).with_modes(&[
        DevMode::Pad,
        DevMode::PadAlt,
        DevMode::Pad,
        DevMode::Pad,
    ]);
    let layout = resolve(&config);
    assert_eq!(layout.port(PortId::P1).device, DeviceType::GenesisMultitap);
    let states = ControllerStates::new();
    for logical in 0..4u8 {
        states
            .port_or_idle(usize::from(logical))
            .store_bytes(24, &[0x80 | logical, 0x70]);
    }
    for word in 0..6 {
        states.port_or_idle(0).store_word(word, u32::MAX);
    }

    let mut bus = SimBus::new();
    bus.enable_echo(PortId::P1);
    bus.script_high(&[(th_both_high(), HOLD), (th_low(PortId::P1), HOLD)]);
    let log = TraceLog::default();
    let mut engine = GenesisEngine::new(&layout, &states, bus, CountingStall::default());
    engine.set_trace_sink(Box::new(log.clone()));

    assert_eq!(
        engine.poll_once(),
        Activation::Completed { port: PortId::P1 }
    );

    assert_eq!(
        engine.bus().received_bytes(PortId::P1),
        vec![0x00, 0x01, 0x00, 0x80, 0x81, 0x78, 0x28, 0x3F]
    );
    let tap = LineAddr::of_pin(sega_io::signal::TAP_SELECT_PIN);
    assert_ne!(engine.bus().output(tap.bank) & tap.mask(), 0);
    assert_eq!(engine.stall().stalls(), 1);
    assert_eq!(engine.stall().releases(), 1);
    assert_eq!(engine.diagnostics().frames_sent, 1);
    assert_eq!(engine.machine(PortId::P1), MachineState::WaitEdge);
}
