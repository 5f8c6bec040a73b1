//! Bus engine for a wired Genesis/Mega Drive and Saturn controller adapter.
//!
//! The crate impersonates controllers on the console's parallel port lines:
//! Saturn peripherals answer a TH falling edge with a handshake-clocked
//! frame, Genesis pads follow TH toggles with precomputed latch words, and a
//! multitap fans one physical port out to several logical controllers.

/// Hardware-facing seams: GPIO bus, core stall and trace hooks.
pub mod api;
pub use api::{Bank, CoreStall, GpioBus, NoStall, PinMode, TraceEvent, TraceSink};

/// Adapter bring-up and activity selection.
pub mod bringup;
pub use bringup::{init, Activity, BringUp, Engine, POLLING_CORE};

/// Adapter configuration snapshot.
pub mod config;
pub use config::{AdapterConfig, DevMode, MultitapMode, System, WIRED_MAX_DEV};

/// Physical ports and emulated device types.
pub mod device;
pub use device::{DeviceType, PortId, GENESIS_MULTITAP_SLOTS, PORT_COUNT, SATURN_MULTITAP_SLOTS};

/// Non-blocking diagnostic counters.
pub mod diag;
pub use diag::Diagnostics;

/// Fault taxonomy shared by both engines.
pub mod fault;
pub use fault::{FaultClass, IoFault};

/// Genesis polled cycle engine, Team Player and EA 4-way.
pub mod genesis;
pub use genesis::{Activation, EaEngine, GenesisEngine, Phase};

/// Keyboard scancode seam.
pub mod keyboard;
pub use keyboard::{scancode_or_sentinel, NoKeyboard, ScancodeSource, NO_KEY_SENTINEL};

/// Configuration to port layout resolution.
pub mod resolver;
pub use resolver::{device_for_mode, resolve, Port, PortLayout};

/// Saturn handshake framing and interrupt dispatch.
pub mod saturn;
pub use saturn::{Dispatch, SaturnDispatcher, SaturnFrame};

/// Line addressing and configuration.
pub mod signal;

/// Simulated bus, stall, keyboard and trace seams for host use.
pub mod sim;

/// Scoped cross-core exclusion.
pub mod stall;
pub use stall::StallRegion;

/// Controller-state buffers written by the adapter layer.
pub mod state;
pub use state::{ControllerStates, OutputBuffer, OUTPUT_BUFFER_BYTES};

/// Spin limits for every bounded wait.
pub mod timing;
pub use timing::{spin_limit, WaitKind};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
