//! Team Player frame packing.
//!
//! `[0x00, id0 << 4 | id1, id2 << 4 | id3, data...]` where data is a nibble
//! stream: a 3-button slot contributes both nibbles of state byte 24, a
//! 6-button slot additionally the high nibble of byte 25. A trailing half
//! byte is padded with `0xF`.

use crate::{ControllerStates, DeviceType, GENESIS_MULTITAP_SLOTS};

/// State byte holding the packed 3-button nibbles.
pub const TAP_BYTE_PRIMARY: usize = 24;
/// State byte whose high nibble holds the extended buttons.
pub const TAP_BYTE_EXTENDED: usize = 25;

const HEADER_BYTES: usize = 3;

/// Largest Team Player frame: four 6-button slots.
pub const TAP_FRAME_CAPACITY: usize = HEADER_BYTES + GENESIS_MULTITAP_SLOTS * 3 / 2;

/// Assembled Team Player frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapFrame {
    bytes: [u8; TAP_FRAME_CAPACITY],
    nibbles: usize,
}

impl TapFrame {
    /// Packs the frame for a hub's sub-slots, reading state from logical
    /// port `first` onwards.
    #[must_use]
    pub fn build(slots: &[DeviceType], first: usize, states: &ControllerStates) -> Self {
        let mut frame = Self {
            bytes: [0; TAP_FRAME_CAPACITY],
            nibbles: 0,
        };
        let id = |slot: usize| {
            slots
                .get(slot)
                .copied()
                .map_or(DeviceType::None.genesis_id(), DeviceType::genesis_id)
        };
        for nibble in [0, 0, id(0), id(1), id(2), id(3)] {
            frame.push_nibble(nibble);
        }

        for (logical, device) in (first..).zip(slots.iter().take(GENESIS_MULTITAP_SLOTS)) {
            let state = states.port_or_idle(logical);
            let primary = state.byte(TAP_BYTE_PRIMARY);
            match device {
                DeviceType::Genesis3Button => {
                    frame.push_nibble(primary >> 4);
                    frame.push_nibble(primary & 0xF);
                }
                DeviceType::Genesis6Button => {
                    frame.push_nibble(primary >> 4);
                    frame.push_nibble(primary & 0xF);
                    frame.push_nibble(state.byte(TAP_BYTE_EXTENDED) >> 4);
                }
                DeviceType::None
                | DeviceType::GenesisMultitap
                | DeviceType::GenesisMouse
                | DeviceType::SaturnDigital
                | DeviceType::SaturnDigitalHandshake
                | DeviceType::SaturnAnalog
                | DeviceType::SaturnMultitap
                | DeviceType::SaturnKeyboard
                | DeviceType::EaMultitap => {}
            }
        }

        if frame.nibbles % 2 == 1 {
            frame.push_nibble(0xF);
        }
        frame
    }

    /// Frame bytes in wire order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.nibbles / 2]
    }

    fn push_nibble(&mut self, nibble: u8) {
        let index = self.nibbles / 2;
        let Some(byte) = self.bytes.get_mut(index) else {
            return;
        };
        if self.nibbles % 2 == 0 {
            *byte = (nibble & 0xF) << 4;
        } else {
            *byte |= nibble & 0xF;
        }
        self.nibbles += 1;
    }
}
