//! Fixed pin map and compile-time (bank, bit) addressing for every line.

use crate::{Bank, PortId, PORT_COUNT};

/// Number of signal lines per controller port.
pub const LINE_COUNT: usize = 7;

/// Controller-port signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignalLine {
    /// TH, toggled by the console to request the next cycle or frame.
    Handshake = 0,
    /// TR, handshake acknowledge from the console.
    ReplyA = 1,
    /// TL, nibble toggle driven by the peripheral.
    ReplyB = 2,
    /// Right / data bit 3.
    Right = 3,
    /// Left / data bit 2.
    Left = 4,
    /// Down / data bit 1.
    Down = 5,
    /// Up / data bit 0.
    Up = 6,
}

impl SignalLine {
    /// Every line in pin-table order.
    pub const ALL: [Self; LINE_COUNT] = [
        Self::Handshake,
        Self::ReplyA,
        Self::ReplyB,
        Self::Right,
        Self::Left,
        Self::Down,
        Self::Up,
    ];

    /// Lines carrying a data nibble, most significant bit first.
    pub const NIBBLE: [Self; 4] = [Self::Right, Self::Left, Self::Down, Self::Up];

    /// Lines a peripheral may drive (everything except TH).
    pub const OUTPUTS: [Self; 6] = [
        Self::ReplyA,
        Self::ReplyB,
        Self::Right,
        Self::Left,
        Self::Down,
        Self::Up,
    ];

    /// Returns the pin-table column for this line.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Physical pin numbers, indexed by `[port][line]`.
pub const PIN_MAP: [[u8; LINE_COUNT]; PORT_COUNT] = [
    [35, 27, 26, 23, 18, 5, 3],
    [36, 16, 33, 25, 22, 21, 19],
];

/// Output pin enabling the EA 4-way wiring on the adapter board.
pub const EA_SELECT_PIN: u8 = 1;

/// Output pin asserted while a Genesis multitap frame is on the wire.
pub const TAP_SELECT_PIN: u8 = 32;

/// Register address of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineAddr {
    /// Register bank holding the pin.
    pub bank: Bank,
    /// Bit index inside the bank.
    pub bit: u8,
}

impl LineAddr {
    /// Resolves a physical pin number to its bank and bit.
    #[must_use]
    pub const fn of_pin(pin: u8) -> Self {
        if pin < 32 {
            Self {
                bank: Bank::Low,
                bit: pin,
            }
        } else {
            Self {
                bank: Bank::High,
                bit: pin % 32,
            }
        }
    }

    /// Returns the single-bit register mask for this line.
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.bit
    }
}

const fn build_line_table() -> [[LineAddr; LINE_COUNT]; PORT_COUNT] {
    let mut table = [[LineAddr::of_pin(0); LINE_COUNT]; PORT_COUNT];
    let mut port = 0;
    while port < PORT_COUNT {
        let mut line = 0;
        while line < LINE_COUNT {
            table[port][line] = LineAddr::of_pin(PIN_MAP[port][line]);
            line += 1;
        }
        port += 1;
    }
    table
}

/// Register addresses, indexed by `[port][line]`.
pub const LINE_TABLE: [[LineAddr; LINE_COUNT]; PORT_COUNT] = build_line_table();

/// Looks up the register address of a port's line.
#[must_use]
#[inline]
pub const fn line_addr(port: PortId, line: SignalLine) -> LineAddr {
    LINE_TABLE[port.index()][line.index()]
}

const fn build_output_masks() -> [[u32; 2]; PORT_COUNT] {
    let mut masks = [[0; 2]; PORT_COUNT];
    let mut port = 0;
    while port < PORT_COUNT {
        let mut i = 0;
        while i < SignalLine::OUTPUTS.len() {
            let addr = LINE_TABLE[port][SignalLine::OUTPUTS[i].index()];
            masks[port][addr.bank.index()] |= addr.mask();
            i += 1;
        }
        port += 1;
    }
    masks
}

/// Bits of every peripheral-driven line, indexed by `[port][bank]`.
pub const OUTPUT_MASKS: [[u32; 2]; PORT_COUNT] = build_output_masks();

/// Returns the bits a port drives in `bank`.
#[must_use]
pub const fn output_mask(port: PortId, bank: Bank) -> u32 {
    OUTPUT_MASKS[port.index()][bank.index()]
}

/// Returns the mask of a single line, regardless of bank.
#[must_use]
pub const fn line_mask(port: PortId, line: SignalLine) -> u32 {
    line_addr(port, line).mask()
}
