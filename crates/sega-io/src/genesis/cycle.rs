//! Genesis cycle phases and latch-word selection.
//!
//! Each logical port buffer carries six precomputed register words: word 0
//! is the TH-high latch, word 1 the TH-low latch and word 2 the extended
//! X/Y/Z/Mode latch for the low bank; words 3..=5 are the same for the high
//! bank.

use crate::signal::{line_addr, SignalLine};
use crate::{Bank, DeviceType, OutputBuffer, PortId};

/// Buffer word of the TH-high latch (low bank).
pub const WORD_TH_HIGH: usize = 0;
/// Buffer word of the TH-low latch (low bank).
pub const WORD_TH_LOW: usize = 1;
/// Buffer word of the extended-button latch (low bank).
pub const WORD_EXTENDED: usize = 2;
/// Offset from a low-bank word to its high-bank counterpart.
pub const HIGH_BANK_WORD_OFFSET: usize = 3;

/// One latch step of a Genesis activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Phase {
    /// First TH-low latch: up, down, A, start.
    Cycle0Low,
    /// First TH-high latch: directions, B, C.
    Cycle0High,
    /// Second TH-low latch.
    Cycle1Low,
    /// Second TH-high latch.
    Cycle1High,
    /// Six-button identification: up and down forced low.
    Cycle2Low,
    /// Extended buttons X, Y, Z, Mode.
    Cycle2High,
    /// Six-button trailer: directions forced high.
    Cycle3Low,
    /// Final TH-high latch.
    Cycle3High,
}

impl Phase {
    /// Phase driven first when an activation starts with TH at `th_high`.
    #[must_use]
    pub const fn entry(th_high: bool) -> Self {
        if th_high {
            Self::Cycle0High
        } else {
            Self::Cycle0Low
        }
    }

    /// Phase latched on the following TH toggle, or `None` when the
    /// activation is complete.
    #[must_use]
    pub const fn next(self, profile: CycleProfile) -> Option<Self> {
        match (self, profile) {
            (Self::Cycle0Low, _) => Some(Self::Cycle0High),
            (Self::Cycle0High, _) => Some(Self::Cycle1Low),
            (Self::Cycle1Low, CycleProfile::SixButton) => Some(Self::Cycle1High),
            (Self::Cycle1Low, CycleProfile::ThreeButton | CycleProfile::Multitap) => None,
            (Self::Cycle1High, _) => Some(Self::Cycle2Low),
            (Self::Cycle2Low, _) => Some(Self::Cycle2High),
            (Self::Cycle2High, _) => Some(Self::Cycle3Low),
            (Self::Cycle3Low, _) => Some(Self::Cycle3High),
            (Self::Cycle3High, _) => None,
        }
    }

    /// Low-bank and high-bank register values latched for `port` in this
    /// phase, read fresh from `buffer`.
    #[must_use]
    pub fn latch(self, port: PortId, buffer: &OutputBuffer) -> (u32, u32) {
        let words = |low: usize| {
            (
                buffer.word(low),
                buffer.word(low + HIGH_BANK_WORD_OFFSET),
            )
        };
        match self {
            Self::Cycle0Low | Self::Cycle1Low => words(WORD_TH_LOW),
            Self::Cycle0High | Self::Cycle1High | Self::Cycle3High => words(WORD_TH_HIGH),
            Self::Cycle2Low => {
                let (low, high) = words(WORD_TH_LOW);
                (low & !vertical_mask(port), high)
            }
            Self::Cycle2High => words(WORD_EXTENDED),
            Self::Cycle3Low => {
                let (low, high) = words(WORD_TH_LOW);
                (low | direction_mask(port), high)
            }
        }
    }
}

/// Cycle sequence length selected by the device on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleProfile {
    /// One low/high pair plus the closing low latch.
    ThreeButton,
    /// Four low/high pairs.
    SixButton,
    /// Team Player hub: bulk frame on the first low latch.
    Multitap,
}

impl CycleProfile {
    /// Profile driven for `device`, or `None` for devices that ignore TH.
    #[must_use]
    pub const fn of(device: DeviceType) -> Option<Self> {
        match device {
            DeviceType::Genesis3Button => Some(Self::ThreeButton),
            DeviceType::Genesis6Button => Some(Self::SixButton),
            DeviceType::GenesisMultitap => Some(Self::Multitap),
            DeviceType::None
            | DeviceType::GenesisMouse
            | DeviceType::SaturnDigital
            | DeviceType::SaturnDigitalHandshake
            | DeviceType::SaturnAnalog
            | DeviceType::SaturnMultitap
            | DeviceType::SaturnKeyboard
            | DeviceType::EaMultitap => None,
        }
    }
}

const fn low_bank_mask(port: PortId, lines: &[SignalLine]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < lines.len() {
        let addr = line_addr(port, lines[i]);
        if matches!(addr.bank, Bank::Low) {
            mask |= addr.mask();
        }
        i += 1;
    }
    mask
}

/// Low-bank bits of D and U for `port`.
#[must_use]
pub const fn vertical_mask(port: PortId) -> u32 {
    low_bank_mask(port, &[SignalLine::Down, SignalLine::Up])
}

/// Low-bank bits of R, L, D and U for `port`.
#[must_use]
pub const fn direction_mask(port: PortId) -> u32 {
    low_bank_mask(port, &SignalLine::NIBBLE)
}
