//! Saturn three-wire handshake framing and interrupt-driven dispatch.

/// Interrupt-context dispatcher for TH falling edges.
pub mod dispatch;
/// Fixed-capacity frame assembly.
pub mod frame;
/// Nibble-level handshake transmitter.
pub mod link;

pub use dispatch::{select_port, Dispatch, SaturnDispatcher};
pub use frame::{SaturnFrame, FRAME_CAPACITY};
pub use link::{send_frame, transmit};

/// ID0 code of a three-wire handshake peripheral.
pub const ID0_THREE_WIRE_HANDSHAKE: u8 = 0x11;

/// ID2 code of a digital pad.
pub const ID2_PAD: u8 = 0x0;
/// ID2 code of a 3D analog pad.
pub const ID2_ANALOG_PAD: u8 = 0x1;
/// ID2 code of a keyboard.
pub const ID2_KEYBOARD: u8 = 0x3;
/// ID2 code of a 6-player multitap.
pub const ID2_MULTITAP: u8 = 0x4;
/// ID2 code of an empty slot.
pub const ID2_NON_CONNECTION: u8 = 0xF;

/// Final byte of every frame: the high nibble of ID0.
pub const FRAME_TRAILER: u8 = ID0_THREE_WIRE_HANDSHAKE >> 4;
