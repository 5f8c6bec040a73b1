//! One-time electrical configuration of every controller line.

use super::access::{drive_nibble, write};
use super::map::{LineAddr, SignalLine, EA_SELECT_PIN, PIN_MAP, TAP_SELECT_PIN};
use crate::saturn::ID0_THREE_WIRE_HANDSHAKE;
use crate::{DeviceType, GpioBus, PinMode, PortId, PortLayout, System};

/// Applies pin modes and resting levels for a resolved layout.
///
/// Must run before either engine starts; lines are never reconfigured while
/// emulation is active.
pub fn configure_lines<B: GpioBus + ?Sized>(bus: &mut B, layout: &PortLayout) {
    if layout.system() == System::Genesis {
        let ea = layout.port(PortId::P1).device == DeviceType::EaMultitap;
        bus.configure_pin(TAP_SELECT_PIN, PinMode::Output);
        bus.configure_pin(EA_SELECT_PIN, PinMode::Output);
        write_pin(bus, TAP_SELECT_PIN, false);
        write_pin(bus, EA_SELECT_PIN, ea);
    }

    for port in PortId::ALL {
        let device = layout.port(port).device;
        let th_mode = if device.uses_handshake() {
            PinMode::InputPullUpFallingEdge
        } else {
            PinMode::InputPullUp
        };
        bus.configure_pin(pin(port, SignalLine::Handshake), th_mode);
    }

    for port in PortId::ALL {
        let device = layout.port(port).device;
        let pad = matches!(
            device,
            DeviceType::Genesis3Button | DeviceType::Genesis6Button
        );
        let ea_master = port == PortId::P1 && device == DeviceType::EaMultitap;
        if pad || ea_master {
            bus.configure_pin(pin(port, SignalLine::ReplyA), PinMode::Output);
        } else {
            bus.configure_pin(pin(port, SignalLine::ReplyA), PinMode::InputPullUp);
        }
        if pad {
            write(bus, port, SignalLine::ReplyA, true);
        }
    }

    for port in PortId::ALL {
        let device = layout.port(port).device;
        for line in [
            SignalLine::ReplyB,
            SignalLine::Right,
            SignalLine::Left,
            SignalLine::Down,
            SignalLine::Up,
        ] {
            if line == SignalLine::ReplyB
                && port == PortId::P2
                && device == DeviceType::EaMultitap
            {
                bus.configure_pin(pin(port, line), PinMode::InputPullUp);
            } else {
                bus.configure_pin(pin(port, line), PinMode::Output);
                write(bus, port, line, true);
            }
        }
    }

    for port in PortId::ALL {
        if layout.port(port).device.uses_handshake() {
            drive_nibble(bus, port, ID0_THREE_WIRE_HANDSHAKE >> 4);
        }
    }
}

const fn pin(port: PortId, line: SignalLine) -> u8 {
    PIN_MAP[port.index()][line.index()]
}

fn write_pin<B: GpioBus + ?Sized>(bus: &mut B, pin: u8, value: bool) {
    let addr = LineAddr::of_pin(pin);
    if value {
        bus.set_output_bits(addr.bank, addr.mask());
    } else {
        bus.clear_output_bits(addr.bank, addr.mask());
    }
}
