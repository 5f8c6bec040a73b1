//! Genesis polled cycle protocol, Team Player multitap and EA 4-way adapter.

/// Cycle phases and latch-word selection.
pub mod cycle;
/// EA 4-way combinational selector.
pub mod ea;
/// Arbitration loop and per-port cycle machines.
pub mod engine;
/// Team Player frame packing.
pub mod multitap;

pub use cycle::{
    direction_mask, vertical_mask, CycleProfile, Phase, HIGH_BANK_WORD_OFFSET, WORD_EXTENDED,
    WORD_TH_HIGH, WORD_TH_LOW,
};
pub use ea::{EaEngine, EaSelection};
pub use engine::{Activation, GenesisEngine, MachineState};
pub use multitap::{TapFrame, TAP_BYTE_EXTENDED, TAP_BYTE_PRIMARY, TAP_FRAME_CAPACITY};
