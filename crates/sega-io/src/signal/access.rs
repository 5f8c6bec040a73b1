//! Single-register line access helpers.

use super::map::{line_addr, SignalLine};
use crate::{Bank, GpioBus, PortId};

/// Reads the level of one line.
#[inline]
pub fn read<B: GpioBus + ?Sized>(bus: &mut B, port: PortId, line: SignalLine) -> bool {
    let addr = line_addr(port, line);
    bus.input(addr.bank) & addr.mask() != 0
}

/// Drives one line high or low with a single set/clear access.
#[inline]
pub fn write<B: GpioBus + ?Sized>(bus: &mut B, port: PortId, line: SignalLine, value: bool) {
    let addr = line_addr(port, line);
    if value {
        bus.set_output_bits(addr.bank, addr.mask());
    } else {
        bus.clear_output_bits(addr.bank, addr.mask());
    }
}

/// Drives the low nibble of `nibble` on R/L/D/U (bit 3 on R, bit 0 on U).
pub fn drive_nibble<B: GpioBus + ?Sized>(bus: &mut B, port: PortId, nibble: u8) {
    for (line, shift) in SignalLine::NIBBLE.into_iter().zip([3u8, 2, 1, 0]) {
        write(bus, port, line, (nibble >> shift) & 1 != 0);
    }
}

/// Returns `true` when `line` is set in a raw register snapshot of `bank`.
#[must_use]
pub const fn is_set_in(snapshot: u32, bank: Bank, port: PortId, line: SignalLine) -> bool {
    let addr = line_addr(port, line);
    addr.bank.index() == bank.index() && snapshot & addr.mask() != 0
}
