//! Non-blocking diagnostic counters shared by both engines.

use crate::{FaultClass, IoFault, PortId};

/// Saturating counters describing engine health since bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostics {
    /// The last fault recorded, if any.
    pub last_fault: Option<IoFault>,
    /// Port the last fault was raised on, when it was port-specific.
    pub last_fault_port: Option<PortId>,
    /// Saturating counter for configuration-class faults.
    pub fault_count_configuration: u16,
    /// Saturating counter for timeout-class faults.
    pub fault_count_timeout: u16,
    /// Saturating counter for spurious-interrupt faults.
    pub fault_count_spurious: u16,
    /// Saturating counter for logic-defect faults.
    pub fault_count_logic: u16,
    /// Saturating counter for fully acknowledged handshake frames.
    pub frames_sent: u32,
    /// Saturating counter for Genesis activations that ran to completion.
    pub activations: u32,
    /// Saturating counter for cross-port handoffs during a Genesis wait.
    pub handoffs: u32,
}

impl Diagnostics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault, updating the last-fault fields and its class counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fault(&mut self, fault: IoFault, port: Option<PortId>) {
        self.last_fault = Some(fault);
        self.last_fault_port = port;
        let counter = match fault.class() {
            FaultClass::Configuration => &mut self.fault_count_configuration,
            FaultClass::Timeout => &mut self.fault_count_timeout,
            FaultClass::Spurious => &mut self.fault_count_spurious,
            FaultClass::Logic => &mut self.fault_count_logic,
        };
        *counter = counter.saturating_add(1);
    }

    /// Returns the counter for one fault class.
    #[must_use]
    pub const fn fault_count(&self, class: FaultClass) -> u16 {
        match class {
            FaultClass::Configuration => self.fault_count_configuration,
            FaultClass::Timeout => self.fault_count_timeout,
            FaultClass::Spurious => self.fault_count_spurious,
            FaultClass::Logic => self.fault_count_logic,
        }
    }

    /// Records a fully acknowledged handshake frame.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_frame(&mut self) {
        self.frames_sent = self.frames_sent.saturating_add(1);
    }

    /// Records a completed Genesis activation.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_activation(&mut self) {
        self.activations = self.activations.saturating_add(1);
    }

    /// Records a cross-port handoff.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_handoff(&mut self) {
        self.handoffs = self.handoffs.saturating_add(1);
    }
}
