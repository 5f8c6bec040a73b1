//! Nibble-level three-wire handshake transmitter.
//!
//! Each byte goes out as two nibbles on R/L/D/U. The console acknowledges the
//! high nibble by pulling TR low and the low nibble by releasing it; TL marks
//! which half is on the lines. Every wait is bounded and aborts as soon as
//! the console releases TH.

use super::ID0_THREE_WIRE_HANDSHAKE;
use crate::signal::{drive_nibble, read, write, SignalLine};
use crate::timing::{spin_limit, WaitKind};
use crate::{GpioBus, IoFault, PortId};

/// Sends `frame` wrapped in the ID0 nibbles and leaves the port idle.
///
/// The low ID0 nibble is driven before the first byte. Afterwards, including
/// after an abort, the high ID0 nibble is driven and TL is released high.
///
/// # Errors
///
/// Propagates the abort reason from [`transmit`].
pub fn send_frame<B: GpioBus + ?Sized>(
    bus: &mut B,
    port: PortId,
    frame: &[u8],
) -> Result<(), IoFault> {
    drive_nibble(bus, port, ID0_THREE_WIRE_HANDSHAKE & 0xF);
    let result = transmit(bus, port, frame);
    drive_nibble(bus, port, ID0_THREE_WIRE_HANDSHAKE >> 4);
    write(bus, port, SignalLine::ReplyB, true);
    result
}

/// Clocks `bytes` out over the handshake, high nibble first.
///
/// # Errors
///
/// Returns [`IoFault::HandshakeDeselected`] when TH goes high mid-frame and
/// [`IoFault::HandshakeTimeout`] when TR does not change within the
/// handshake spin limit. Bytes already acknowledged stay sent.
pub fn transmit<B: GpioBus + ?Sized>(
    bus: &mut B,
    port: PortId,
    bytes: &[u8],
) -> Result<(), IoFault> {
    for byte in bytes {
        wait_reply(bus, port, false)?;
        drive_nibble(bus, port, byte >> 4);
        write(bus, port, SignalLine::ReplyB, false);

        wait_reply(bus, port, true)?;
        drive_nibble(bus, port, byte & 0xF);
        write(bus, port, SignalLine::ReplyB, true);
    }
    Ok(())
}

fn wait_reply<B: GpioBus + ?Sized>(
    bus: &mut B,
    port: PortId,
    level: bool,
) -> Result<(), IoFault> {
    let limit = spin_limit(WaitKind::HandshakeAck);
    let mut spins = 0;
    while read(bus, port, SignalLine::ReplyA) != level {
        if read(bus, port, SignalLine::Handshake) {
            return Err(IoFault::HandshakeDeselected);
        }
        if spins >= limit {
            return Err(IoFault::HandshakeTimeout);
        }
        spins += 1;
    }
    Ok(())
}
