//! Adapter configuration consumed once at bring-up.

/// Number of logical controller slots the adapter layer exposes.
pub const WIRED_MAX_DEV: usize = 12;

/// Console family wired to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum System {
    /// Sega Genesis / Mega Drive.
    #[default]
    Genesis,
    /// Sega Saturn.
    Saturn,
}

/// Global multitap selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u32)]
pub enum MultitapMode {
    /// One device per physical port.
    #[default]
    Disabled = 0,
    /// Hub on port 1.
    Slot1 = 1,
    /// Hub on port 2.
    Slot2 = 2,
    /// Hubs on both ports.
    Dual = 3,
    /// EA 4-way wiring across both ports (Genesis only).
    Alternate = 4,
}

impl MultitapMode {
    /// Decodes a persisted multitap selector. Unknown values fall back to
    /// [`MultitapMode::Disabled`].
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        match raw {
            1 => Self::Slot1,
            2 => Self::Slot2,
            3 => Self::Dual,
            4 => Self::Alternate,
            _ => Self::Disabled,
        }
    }
}

/// Per-logical-port device mode selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum DevMode {
    /// Standard pad.
    Pad = 0,
    /// Alternate pad (6-button on Genesis, analog on Saturn).
    PadAlt = 1,
    /// Keyboard.
    Keyboard = 2,
    /// Mouse.
    Mouse = 3,
}

impl DevMode {
    /// Decodes a raw device-mode byte.
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Pad),
            1 => Some(Self::PadAlt),
            2 => Some(Self::Keyboard),
            3 => Some(Self::Mouse),
            _ => None,
        }
    }

    /// Returns the raw byte stored for this mode.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Configuration snapshot handed to the resolver.
///
/// Device modes are kept as raw bytes so that an unrecognized value reaches
/// the resolver intact and degrades only its own slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AdapterConfig {
    /// Console wired to the adapter.
    pub system: System,
    /// Global multitap selection.
    #[cfg_attr(feature = "serde", serde(default))]
    pub multitap: MultitapMode,
    /// Raw device mode per logical port, consumed in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dev_modes: [u8; WIRED_MAX_DEV],
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new(System::Genesis, MultitapMode::Disabled)
    }
}

impl AdapterConfig {
    /// Creates a configuration with every logical port set to [`DevMode::Pad`].
    #[must_use]
    pub const fn new(system: System, multitap: MultitapMode) -> Self {
        Self {
            system,
            multitap,
            dev_modes: [DevMode::Pad as u8; WIRED_MAX_DEV],
        }
    }

    /// Returns a copy with `modes` assigned to logical ports `0..modes.len()`.
    #[must_use]
    pub fn with_modes(mut self, modes: &[DevMode]) -> Self {
        for (slot, mode) in self.dev_modes.iter_mut().zip(modes) {
            *slot = mode.as_u8();
        }
        self
    }

    /// Returns a copy with a raw mode byte stored for one logical port.
    /// Out-of-range indices are ignored.
    #[must_use]
    pub fn with_raw_mode(mut self, logical_port: usize, raw: u8) -> Self {
        if let Some(slot) = self.dev_modes.get_mut(logical_port) {
            *slot = raw;
        }
        self
    }

    /// Returns the decoded mode for a logical port, if recognized.
    #[must_use]
    pub fn dev_mode(&self, logical_port: usize) -> Option<DevMode> {
        self.dev_modes
            .get(logical_port)
            .and_then(|raw| DevMode::from_u8(*raw))
    }
}
