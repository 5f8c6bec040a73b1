//! Port/device resolution from the adapter configuration.
//!
//! Runs once at bring-up and produces an immutable [`PortLayout`] that both
//! engines borrow. Device modes are consumed in logical-port order: one per
//! plain port, one per hub sub-slot. A mode that cannot be mapped leaves its
//! slot [`DeviceType::None`] and is recorded; resolution itself never fails.

use std::ops::Range;

use crate::{
    AdapterConfig, DevMode, DeviceType, IoFault, MultitapMode, PortId, ScancodeSource, System,
    GENESIS_MULTITAP_SLOTS, PORT_COUNT, SATURN_MULTITAP_SLOTS, WIRED_MAX_DEV,
};

/// Resolved configuration of one physical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    /// Physical port.
    pub id: PortId,
    /// Device emulated on the port itself.
    pub device: DeviceType,
    /// First logical port served by this physical port.
    pub offset: u8,
    slots: [DeviceType; SATURN_MULTITAP_SLOTS],
    slot_count: u8,
}

impl Port {
    const fn empty(id: PortId) -> Self {
        Self {
            id,
            device: DeviceType::None,
            offset: 0,
            slots: [DeviceType::None; SATURN_MULTITAP_SLOTS],
            slot_count: 0,
        }
    }

    /// Sub-slot devices behind a hub, in physical slot order. Empty for
    /// non-hub ports.
    #[must_use]
    pub fn slots(&self) -> &[DeviceType] {
        &self.slots[..usize::from(self.slot_count)]
    }

    /// Logical ports whose controller state this port reads.
    #[must_use]
    pub fn logical_range(&self) -> Range<usize> {
        let start = usize::from(self.offset);
        let width = match self.device {
            DeviceType::EaMultitap if self.id == PortId::P1 => GENESIS_MULTITAP_SLOTS,
            DeviceType::EaMultitap => 0,
            DeviceType::GenesisMultitap | DeviceType::SaturnMultitap => {
                usize::from(self.slot_count)
            }
            DeviceType::None
            | DeviceType::Genesis3Button
            | DeviceType::Genesis6Button
            | DeviceType::GenesisMouse
            | DeviceType::SaturnDigital
            | DeviceType::SaturnDigitalHandshake
            | DeviceType::SaturnAnalog
            | DeviceType::SaturnKeyboard => 1,
        };
        start..start + width
    }
}

/// Immutable result of resolving an [`AdapterConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortLayout {
    system: System,
    multitap: MultitapMode,
    ports: [Port; PORT_COUNT],
    rejected: [Option<IoFault>; WIRED_MAX_DEV],
}

impl PortLayout {
    /// Console the layout was resolved for.
    #[must_use]
    pub const fn system(&self) -> System {
        self.system
    }

    /// Multitap selection the layout was resolved from.
    #[must_use]
    pub const fn multitap(&self) -> MultitapMode {
        self.multitap
    }

    /// Returns the resolved configuration of one physical port.
    #[must_use]
    pub const fn port(&self, id: PortId) -> &Port {
        &self.ports[id.index()]
    }

    /// Both resolved ports in physical order.
    #[must_use]
    pub const fn ports(&self) -> &[Port; PORT_COUNT] {
        &self.ports
    }

    /// Logical ports whose device mode could not be mapped, with the reason.
    pub fn rejected_modes(&self) -> impl Iterator<Item = (usize, IoFault)> + '_ {
        self.rejected
            .iter()
            .enumerate()
            .filter_map(|(logical, fault)| fault.map(|fault| (logical, fault)))
    }

    /// Number of logical ports left inert by a bad device mode.
    #[must_use]
    pub fn misconfigured(&self) -> usize {
        self.rejected.iter().flatten().count()
    }

    /// Logical ports carrying a keyboard, in ascending order.
    pub fn keyboard_ports(&self) -> impl Iterator<Item = u8> + '_ {
        self.ports.iter().flat_map(|port| {
            let leaf = (port.device == DeviceType::SaturnKeyboard).then_some(port.offset);
            let hub = port
                .slots()
                .iter()
                .zip(port.offset..)
                .filter(|(device, _)| **device == DeviceType::SaturnKeyboard)
                .map(|(_, logical)| logical);
            leaf.into_iter().chain(hub)
        })
    }

    /// Announces every keyboard logical port to the scancode source.
    pub fn register_keyboards<K: ScancodeSource + ?Sized>(&self, keyboard: &mut K) {
        for logical in self.keyboard_ports() {
            keyboard.register(logical);
        }
    }

    /// Returns `true` when any port is served by the Genesis polling task.
    #[must_use]
    pub fn needs_polling_task(&self) -> bool {
        self.ports.iter().any(|port| port.device.needs_polling_task())
    }

    /// Returns `true` when any port talks the Saturn handshake.
    #[must_use]
    pub fn needs_edge_interrupt(&self) -> bool {
        self.ports.iter().any(|port| port.device.uses_handshake())
    }
}

/// Resolves `config` into an immutable port layout.
///
/// Unmappable device modes are logged at warn level and recorded in
/// [`PortLayout::rejected_modes`].
#[must_use]
pub fn resolve(config: &AdapterConfig) -> PortLayout {
    let mut layout = PortLayout {
        system: config.system,
        multitap: config.multitap,
        ports: [Port::empty(PortId::P1), Port::empty(PortId::P2)],
        rejected: [None; WIRED_MAX_DEV],
    };

    let (hub_device, hub_slots) = match config.system {
        System::Saturn => (DeviceType::SaturnMultitap, SATURN_MULTITAP_SLOTS),
        System::Genesis => (DeviceType::GenesisMultitap, GENESIS_MULTITAP_SLOTS),
    };

    let hubs = match (config.system, config.multitap) {
        (System::Genesis, MultitapMode::Alternate) => {
            for port in &mut layout.ports {
                port.device = DeviceType::EaMultitap;
            }
            return layout;
        }
        (_, MultitapMode::Slot1) => [true, false],
        (_, MultitapMode::Slot2) => [false, true],
        (_, MultitapMode::Dual) => [true, true],
        (_, MultitapMode::Disabled | MultitapMode::Alternate) => [false, false],
    };

    let mut cursor = 0;
    for (index, is_hub) in hubs.into_iter().enumerate() {
        let offset = cursor;
        let port = &mut layout.ports[index];
        port.offset = u8::try_from(offset).unwrap_or(u8::MAX);
        if is_hub {
            port.device = hub_device;
            port.slot_count = u8::try_from(hub_slots).unwrap_or(u8::MAX);
            for slot in port.slots.iter_mut().take(hub_slots) {
                *slot = map_slot(config, cursor, &mut layout.rejected);
                cursor += 1;
            }
        } else {
            port.device = map_slot(config, cursor, &mut layout.rejected);
            cursor += 1;
        }
    }

    layout
}

fn map_slot(
    config: &AdapterConfig,
    logical: usize,
    rejected: &mut [Option<IoFault>; WIRED_MAX_DEV],
) -> DeviceType {
    match device_for_mode(config.system, config.dev_mode(logical)) {
        Ok(device) => device,
        Err(fault) => {
            log::warn!(
                "logical port {logical}: {fault} (raw mode {:#04x}), slot left inert",
                config.dev_modes.get(logical).copied().unwrap_or(0xFF)
            );
            if let Some(entry) = rejected.get_mut(logical) {
                *entry = Some(fault);
            }
            DeviceType::None
        }
    }
}

/// Maps one decoded device mode to the device emulated for `system`.
///
/// # Errors
///
/// Returns [`IoFault::UnrecognizedDeviceMode`] for an undecodable mode and
/// [`IoFault::UnsupportedDeviceMode`] for a mode the console has no
/// peripheral for (keyboard on Genesis).
pub const fn device_for_mode(
    system: System,
    mode: Option<DevMode>,
) -> Result<DeviceType, IoFault> {
    let Some(mode) = mode else {
        return Err(IoFault::UnrecognizedDeviceMode);
    };
    match (system, mode) {
        (System::Saturn, DevMode::Pad) => Ok(DeviceType::SaturnDigitalHandshake),
        (System::Saturn, DevMode::PadAlt) => Ok(DeviceType::SaturnAnalog),
        (System::Saturn, DevMode::Keyboard) => Ok(DeviceType::SaturnKeyboard),
        (System::Saturn | System::Genesis, DevMode::Mouse) => Ok(DeviceType::GenesisMouse),
        (System::Genesis, DevMode::Pad) => Ok(DeviceType::Genesis3Button),
        (System::Genesis, DevMode::PadAlt) => Ok(DeviceType::Genesis6Button),
        (System::Genesis, DevMode::Keyboard) => Err(IoFault::UnsupportedDeviceMode),
    }
}
