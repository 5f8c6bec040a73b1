//! One-shot adapter bring-up.
//!
//! Resolves the configuration, announces keyboards, configures every line and
//! hands back the engine the host must start: a pinned polling task for
//! Genesis, an interrupt handler for Saturn, or nothing.

use crate::genesis::{EaEngine, GenesisEngine};
use crate::saturn::SaturnDispatcher;
use crate::signal::configure_lines;
use crate::{
    resolve, AdapterConfig, ControllerStates, CoreStall, DeviceType, Diagnostics, GpioBus,
    PortId, PortLayout, ScancodeSource, System,
};

/// Core the Genesis polling task is pinned to.
pub const POLLING_CORE: u8 = 1;

/// What the host has to run after bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// Never-yielding Genesis cycle task.
    GenesisPolling {
        /// Core the task must be pinned to.
        core: u8,
    },
    /// Never-yielding EA 4-way task.
    EaPolling {
        /// Core the task must be pinned to.
        core: u8,
    },
    /// Saturn handshake served from the GPIO interrupt.
    SaturnInterrupt,
    /// No port needs servicing.
    Inactive,
}

impl Activity {
    /// Picks the activity a resolved layout needs.
    #[must_use]
    pub fn for_layout(layout: &PortLayout) -> Self {
        match layout.system() {
            System::Genesis if layout.port(PortId::P1).device == DeviceType::EaMultitap => {
                Self::EaPolling { core: POLLING_CORE }
            }
            System::Genesis if layout.needs_polling_task() => {
                Self::GenesisPolling { core: POLLING_CORE }
            }
            System::Saturn if layout.needs_edge_interrupt() => Self::SaturnInterrupt,
            System::Genesis | System::Saturn => Self::Inactive,
        }
    }
}

/// Engine ready to be driven by the host.
pub enum Engine<'a, B, S, K> {
    /// Call [`GenesisEngine::run`] from the pinned task.
    GenesisPolling(GenesisEngine<'a, B, S>),
    /// Call [`EaEngine::run`] from the pinned task.
    EaPolling(EaEngine<'a, B>),
    /// Call [`SaturnDispatcher::on_interrupt`] from the GPIO interrupt.
    SaturnInterrupt(SaturnDispatcher<'a, B, K>),
    /// Nothing to run.
    Inactive,
}

/// Everything produced by [`init`].
pub struct BringUp<'a, B, S, K> {
    /// Resolved port layout.
    pub layout: PortLayout,
    /// Activity the host must start.
    pub activity: Activity,
    /// Engine implementing that activity.
    pub engine: Engine<'a, B, S, K>,
    /// Configuration faults found while resolving.
    pub diagnostics: Diagnostics,
}

/// Brings the adapter up for `config`.
///
/// Never fails: unmappable device modes leave their slot inert and are
/// counted in [`BringUp::diagnostics`].
#[must_use]
pub fn init<'a, B, S, K>(
    config: &AdapterConfig,
    states: &'a ControllerStates,
    mut bus: B,
    stall: S,
    mut keyboard: K,
) -> BringUp<'a, B, S, K>
where
    B: GpioBus,
    S: CoreStall,
    K: ScancodeSource,
{
    let layout = resolve(config);
    let mut diagnostics = Diagnostics::new();
    for (_, fault) in layout.rejected_modes() {
        diagnostics.record_fault(fault, None);
    }

    layout.register_keyboards(&mut keyboard);
    configure_lines(&mut bus, &layout);

    let activity = Activity::for_layout(&layout);
    log::info!(
        "{:?} adapter up: port 1 {:?}, port 2 {:?}, {activity:?}",
        layout.system(),
        layout.port(PortId::P1).device,
        layout.port(PortId::P2).device,
    );
    if layout.misconfigured() > 0 {
        log::warn!(
            "{} logical port(s) left inert by bad device modes",
            layout.misconfigured()
        );
    }

    let engine = match activity {
        Activity::GenesisPolling { .. } => {
            Engine::GenesisPolling(GenesisEngine::new(&layout, states, bus, stall))
        }
        Activity::EaPolling { .. } => Engine::EaPolling(EaEngine::new(states, bus)),
        Activity::SaturnInterrupt => {
            Engine::SaturnInterrupt(SaturnDispatcher::new(&layout, states, bus, keyboard))
        }
        Activity::Inactive => Engine::Inactive,
    };

    BringUp {
        layout,
        activity,
        engine,
        diagnostics,
    }
}
