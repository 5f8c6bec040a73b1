use thiserror::Error;

/// Fault classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Configuration value could not be mapped to a device.
    Configuration,
    /// Peer stopped answering mid-frame or mid-cycle.
    Timeout,
    /// Interrupt fired without a matching port.
    Spurious,
    /// Engine reached a device type it has no handler for.
    Logic,
}

/// Stable fault taxonomy for the bus engines.
///
/// None of these faults stop the engine: configuration faults leave a slot
/// inert, timeouts abandon the current transaction and the next bus
/// activation starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum IoFault {
    /// Device-mode byte does not name any known mode.
    #[error("unrecognized device mode")]
    UnrecognizedDeviceMode = 0x01,
    /// Device mode is known but the selected console has no such peripheral.
    #[error("device mode not supported by this console")]
    UnsupportedDeviceMode = 0x02,
    /// Console did not toggle TR within the handshake spin limit.
    #[error("handshake acknowledge timed out")]
    HandshakeTimeout = 0x03,
    /// Console released TH while a handshake frame was still in flight.
    #[error("console deselected port mid-frame")]
    HandshakeDeselected = 0x04,
    /// TH did not change within the Genesis cycle spin limit.
    #[error("genesis cycle poll timed out")]
    PollTimeout = 0x05,
    /// GPIO interrupt fired with no port status bit set.
    #[error("spurious gpio interrupt")]
    SpuriousInterrupt = 0x06,
    /// Dispatcher reached a device type it cannot frame.
    #[error("no handler for configured device type")]
    UnhandledDeviceType = 0x07,
}

impl IoFault {
    /// Converts a fault to its stable low-byte code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable low-byte code back into a fault.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::UnrecognizedDeviceMode),
            0x02 => Some(Self::UnsupportedDeviceMode),
            0x03 => Some(Self::HandshakeTimeout),
            0x04 => Some(Self::HandshakeDeselected),
            0x05 => Some(Self::PollTimeout),
            0x06 => Some(Self::SpuriousInterrupt),
            0x07 => Some(Self::UnhandledDeviceType),
            _ => None,
        }
    }

    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UnrecognizedDeviceMode | Self::UnsupportedDeviceMode => {
                FaultClass::Configuration
            }
            Self::HandshakeTimeout | Self::HandshakeDeselected | Self::PollTimeout => {
                FaultClass::Timeout
            }
            Self::SpuriousInterrupt => FaultClass::Spurious,
            Self::UnhandledDeviceType => FaultClass::Logic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, IoFault};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x07 {
            let fault = IoFault::from_u8(code).expect("defined taxonomy code");
            assert_eq!(fault.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(IoFault::from_u8(0x00).is_none());
        assert!(IoFault::from_u8(0x08).is_none());
        assert!(IoFault::from_u8(0xFF).is_none());
    }

    #[test]
    fn class_mapping_matches_error_taxonomy() {
        assert_eq!(
            IoFault::UnrecognizedDeviceMode.class(),
            FaultClass::Configuration
        );
        assert_eq!(
            IoFault::UnsupportedDeviceMode.class(),
            FaultClass::Configuration
        );
        assert_eq!(IoFault::HandshakeTimeout.class(), FaultClass::Timeout);
        assert_eq!(IoFault::HandshakeDeselected.class(), FaultClass::Timeout);
        assert_eq!(IoFault::PollTimeout.class(), FaultClass::Timeout);
        assert_eq!(IoFault::SpuriousInterrupt.class(), FaultClass::Spurious);
        assert_eq!(IoFault::UnhandledDeviceType.class(), FaultClass::Logic);
    }

    #[test]
    fn display_messages_are_lowercase_phrases() {
        assert_eq!(
            IoFault::HandshakeTimeout.to_string(),
            "handshake acknowledge timed out"
        );
        assert_eq!(
            IoFault::UnhandledDeviceType.to_string(),
            "no handler for configured device type"
        );
    }
}
