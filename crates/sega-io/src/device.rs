//! Physical port identities and the closed set of emulated device types.

/// Number of physical controller ports.
pub const PORT_COUNT: usize = 2;

/// Sub-slots behind a Saturn 6-player multitap.
pub const SATURN_MULTITAP_SLOTS: usize = 6;

/// Sub-slots behind a Genesis 4-way multitap.
pub const GENESIS_MULTITAP_SLOTS: usize = 4;

/// One of the two physical controller ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum PortId {
    /// Controller port 1.
    P1 = 0,
    /// Controller port 2.
    P2 = 1,
}

impl PortId {
    /// Both ports in physical order.
    pub const ALL: [Self; PORT_COUNT] = [Self::P1, Self::P2];

    /// Returns the array index for this port (`0..=1`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the opposite port.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }

    /// Decodes a zero-based port index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::P1),
            1 => Some(Self::P2),
            _ => None,
        }
    }
}

/// Device emulated on a physical port or on a multitap sub-slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum DeviceType {
    /// Nothing connected; the port or slot is inert.
    #[default]
    None = 0,
    /// Genesis 3-button pad.
    Genesis3Button,
    /// Genesis 6-button pad.
    Genesis6Button,
    /// Sega Team Player style Genesis multitap.
    GenesisMultitap,
    /// Genesis mouse.
    GenesisMouse,
    /// Saturn digital pad on the parallel (TH/TR select) protocol.
    SaturnDigital,
    /// Saturn digital pad reported over the three-wire handshake.
    SaturnDigitalHandshake,
    /// Saturn 3D analog pad.
    SaturnAnalog,
    /// Saturn 6-player multitap.
    SaturnMultitap,
    /// Saturn keyboard.
    SaturnKeyboard,
    /// EA 4-way play adapter (uses both ports).
    EaMultitap,
}

impl DeviceType {
    /// Returns `true` for hub devices that fan out to sub-slots.
    #[must_use]
    pub const fn is_multitap(self) -> bool {
        matches!(
            self,
            Self::GenesisMultitap | Self::SaturnMultitap | Self::EaMultitap
        )
    }

    /// Returns `true` when the device talks the Saturn three-wire handshake
    /// and therefore needs a TH falling-edge interrupt.
    #[must_use]
    pub const fn uses_handshake(self) -> bool {
        matches!(
            self,
            Self::SaturnDigitalHandshake
                | Self::SaturnAnalog
                | Self::SaturnMultitap
                | Self::SaturnKeyboard
        )
    }

    /// Returns `true` when the device is served by the Genesis polling task.
    #[must_use]
    pub const fn needs_polling_task(self) -> bool {
        matches!(
            self,
            Self::Genesis3Button | Self::Genesis6Button | Self::GenesisMultitap | Self::EaMultitap
        )
    }

    /// Identity nibble advertised for this device in a Genesis multitap
    /// header.
    #[must_use]
    pub const fn genesis_id(self) -> u8 {
        match self {
            Self::Genesis3Button => 0x0,
            Self::Genesis6Button => 0x1,
            Self::GenesisMouse => 0x2,
            Self::None
            | Self::GenesisMultitap
            | Self::SaturnDigital
            | Self::SaturnDigitalHandshake
            | Self::SaturnAnalog
            | Self::SaturnMultitap
            | Self::SaturnKeyboard
            | Self::EaMultitap => 0xF,
        }
    }
}
