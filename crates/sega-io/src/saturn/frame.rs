//! Fixed-capacity Saturn frame assembly.
//!
//! A leaf frame is `[id2 << 4 | n, payload[n], trailer]`. The multitap frame
//! wraps every sub-slot's header and payload between `[0x41, slots << 4]` and
//! a single trailer. Controller state is read at build time, never cached.

use super::{
    FRAME_TRAILER, ID2_ANALOG_PAD, ID2_KEYBOARD, ID2_MULTITAP, ID2_NON_CONNECTION, ID2_PAD,
};
use crate::keyboard::scancode_or_sentinel;
use crate::{ControllerStates, DeviceType, IoFault, Port, ScancodeSource, SATURN_MULTITAP_SLOTS};

const DIGITAL_PAYLOAD: usize = 2;
const ANALOG_PAYLOAD: usize = 6;
const KEYBOARD_STATE_PAYLOAD: usize = 2;

/// Largest frame on the wire: a multitap carrying six analog pads.
pub const FRAME_CAPACITY: usize = 2 + SATURN_MULTITAP_SLOTS * (1 + ANALOG_PAYLOAD) + 1;

/// Per-port scratch buffer holding one assembled frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaturnFrame {
    bytes: [u8; FRAME_CAPACITY],
    len: usize,
}

impl Default for SaturnFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturnFrame {
    /// Creates an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; FRAME_CAPACITY],
            len: 0,
        }
    }

    /// Bytes assembled so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of bytes assembled.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing has been assembled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Discards the assembled bytes.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Assembles the frame for the device configured on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`IoFault::UnhandledDeviceType`] when the port's device does
    /// not speak the handshake protocol; the frame is left empty.
    pub fn build<K: ScancodeSource + ?Sized>(
        &mut self,
        port: &Port,
        states: &ControllerStates,
        keyboard: &mut K,
    ) -> Result<(), IoFault> {
        self.clear();
        let first = usize::from(port.offset);
        match port.device {
            DeviceType::SaturnDigitalHandshake
            | DeviceType::SaturnAnalog
            | DeviceType::SaturnKeyboard => {
                self.push_slot(port.device, first, states, keyboard);
            }
            DeviceType::SaturnMultitap => {
                let slots = port.slots();
                self.push((ID2_MULTITAP << 4) | 1);
                self.push(u8::try_from(slots.len()).unwrap_or(0) << 4);
                for (logical, device) in (first..).zip(slots) {
                    self.push_slot(*device, logical, states, keyboard);
                }
            }
            DeviceType::None
            | DeviceType::Genesis3Button
            | DeviceType::Genesis6Button
            | DeviceType::GenesisMultitap
            | DeviceType::GenesisMouse
            | DeviceType::SaturnDigital
            | DeviceType::EaMultitap => return Err(IoFault::UnhandledDeviceType),
        }
        self.push(FRAME_TRAILER);
        Ok(())
    }

    fn push(&mut self, byte: u8) {
        if let Some(slot) = self.bytes.get_mut(self.len) {
            *slot = byte;
            self.len += 1;
        }
    }

    fn push_state(&mut self, states: &ControllerStates, logical: usize, count: usize) {
        let mut payload = [0; ANALOG_PAYLOAD];
        let len = count.min(ANALOG_PAYLOAD);
        states.port_or_idle(logical).read_bytes(0, &mut payload[..len]);
        for &byte in &payload[..len] {
            self.push(byte);
        }
    }

    fn push_slot<K: ScancodeSource + ?Sized>(
        &mut self,
        device: DeviceType,
        logical: usize,
        states: &ControllerStates,
        keyboard: &mut K,
    ) {
        match device {
            DeviceType::SaturnDigital | DeviceType::SaturnDigitalHandshake => {
                self.push((ID2_PAD << 4) | 2);
                self.push_state(states, logical, DIGITAL_PAYLOAD);
            }
            DeviceType::SaturnAnalog => {
                self.push((ID2_ANALOG_PAD << 4) | 6);
                self.push_state(states, logical, ANALOG_PAYLOAD);
            }
            DeviceType::SaturnKeyboard => {
                self.push((ID2_KEYBOARD << 4) | 4);
                self.push_state(states, logical, KEYBOARD_STATE_PAYLOAD);
                let code =
                    scancode_or_sentinel(keyboard, u8::try_from(logical).unwrap_or(u8::MAX));
                self.push(code[0]);
                self.push(code[1]);
            }
            DeviceType::None
            | DeviceType::Genesis3Button
            | DeviceType::Genesis6Button
            | DeviceType::GenesisMultitap
            | DeviceType::GenesisMouse
            | DeviceType::SaturnMultitap
            | DeviceType::EaMultitap => self.push(ID2_NON_CONNECTION << 4),
        }
    }
}
