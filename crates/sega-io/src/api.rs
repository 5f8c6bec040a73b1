//! Hardware-facing contracts the engines are written against.
//!
//! A firmware build implements [`GpioBus`] and [`CoreStall`] directly on the
//! SoC registers; host builds use the simulated bus in [`crate::sim`].

use crate::{DeviceType, IoFault, Phase, PortId};

/// One of the two 32-bit GPIO register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bank {
    /// Pins `0..=31`.
    Low = 0,
    /// Pins `32..=63`, addressed as `pin - 32`.
    High = 1,
}

impl Bank {
    /// Returns the array index for this bank (`0..=1`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Electrical configuration applied to a pin once at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Input with pull-up, no interrupt.
    InputPullUp,
    /// Input with pull-up, interrupt on falling edge.
    InputPullUpFallingEdge,
    /// Push-pull output.
    Output,
}

/// Register-level GPIO contract used on every latency-critical path.
///
/// Each method maps to a single register access on hardware.
pub trait GpioBus {
    /// Reads the input level register of `bank`.
    fn input(&mut self, bank: Bank) -> u32;

    /// Reads back the output register of `bank`.
    fn output(&self, bank: Bank) -> u32;

    /// Overwrites the whole output register of `bank`.
    fn write_output(&mut self, bank: Bank, value: u32);

    /// Drives every bit in `mask` high (write-one-to-set).
    fn set_output_bits(&mut self, bank: Bank, mask: u32);

    /// Drives every bit in `mask` low (write-one-to-clear).
    fn clear_output_bits(&mut self, bank: Bank, mask: u32);

    /// Reads the pending interrupt status of `bank`.
    fn interrupt_status(&mut self, bank: Bank) -> u32;

    /// Acknowledges the interrupt bits in `mask`.
    fn clear_interrupt_status(&mut self, bank: Bank, mask: u32);

    /// Applies the electrical configuration of a single pin.
    fn configure_pin(&mut self, pin: u8, mode: PinMode);
}

impl<B: GpioBus + ?Sized> GpioBus for &mut B {
    fn input(&mut self, bank: Bank) -> u32 {
        (**self).input(bank)
    }

    fn output(&self, bank: Bank) -> u32 {
        (**self).output(bank)
    }

    fn write_output(&mut self, bank: Bank, value: u32) {
        (**self).write_output(bank, value);
    }

    fn set_output_bits(&mut self, bank: Bank, mask: u32) {
        (**self).set_output_bits(bank, mask);
    }

    fn clear_output_bits(&mut self, bank: Bank, mask: u32) {
        (**self).clear_output_bits(bank, mask);
    }

    fn interrupt_status(&mut self, bank: Bank) -> u32 {
        (**self).interrupt_status(bank)
    }

    fn clear_interrupt_status(&mut self, bank: Bank, mask: u32) {
        (**self).clear_interrupt_status(bank, mask);
    }

    fn configure_pin(&mut self, pin: u8, mode: PinMode) {
        (**self).configure_pin(pin, mode);
    }
}

/// Cross-core exclusion primitive.
///
/// On dual-core parts this stalls the other CPU; platforms without such a
/// primitive take a high-priority preemptive lock for the same window.
pub trait CoreStall {
    /// Starts stalling the other processing core.
    fn stall_other_core(&mut self);

    /// Lets the other processing core run again.
    fn release_other_core(&mut self);
}

/// [`CoreStall`] for single-core hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStall;

impl CoreStall for NoStall {
    fn stall_other_core(&mut self) {}

    fn release_other_core(&mut self) {}
}

/// Deterministic wire-level events emitted when a trace sink is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A Genesis latch was committed to the output registers.
    LatchDriven {
        /// Port whose lines were driven.
        port: PortId,
        /// Cycle phase that was latched.
        phase: Phase,
        /// Low-bank output register value written.
        low: u32,
        /// High-bank output register value written.
        high: u32,
    },
    /// Control moved to the other port while waiting for an edge.
    Handoff {
        /// Port whose sequence was abandoned.
        from: PortId,
        /// Port that is serviced next.
        to: PortId,
    },
    /// A handshake frame was fully acknowledged.
    FrameSent {
        /// Port the frame was sent on.
        port: PortId,
        /// Number of bytes in the frame.
        len: u8,
    },
    /// A transaction was abandoned.
    Aborted {
        /// Port the transaction ran on.
        port: PortId,
        /// Reason for abandoning it.
        cause: IoFault,
    },
    /// An interrupt fired without a matching port.
    SpuriousInterrupt,
    /// Dispatcher reached a device type it has no frame for.
    Defect {
        /// Port that raised the edge.
        port: PortId,
        /// Device configured on that port.
        device: DeviceType,
    },
    /// EA 4-way selection changed the driven word.
    EaSelect {
        /// Sub-port index, or `None` while port 2 TH is high.
        sub_port: Option<u8>,
        /// Low-bank output register value written.
        word: u32,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in bus order.
    fn on_event(&mut self, event: TraceEvent);
}

#[cfg(test)]
mod tests {
    use super::{Bank, CoreStall, NoStall};

    #[test]
    fn bank_indices_are_dense() {
        assert_eq!(Bank::Low.index(), 0);
        assert_eq!(Bank::High.index(), 1);
    }

    #[test]
    fn no_stall_is_inert() {
        let mut stall = NoStall;
        stall.stall_other_core();
        stall.release_other_core();
    }
}
