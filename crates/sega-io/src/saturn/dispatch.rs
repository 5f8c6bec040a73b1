//! Interrupt-context dispatcher for Saturn TH falling edges.
//!
//! The whole frame is sent before [`SaturnDispatcher::on_interrupt`]
//! returns; the console's next handshake cycle arrives faster than any
//! deferred handler could run.

use super::{send_frame, SaturnFrame};
use crate::signal::{line_mask, read, SignalLine};
use crate::{
    Bank, ControllerStates, DeviceType, Diagnostics, GpioBus, IoFault, Port, PortId,
    PortLayout, ScancodeSource, TraceEvent, TraceSink, PORT_COUNT,
};

/// Result of servicing one GPIO interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// A frame was fully acknowledged.
    Framed {
        /// Port the frame was sent on.
        port: PortId,
        /// Frame length in bytes.
        len: usize,
    },
    /// The console stopped answering mid-frame.
    Aborted {
        /// Port the frame was sent on.
        port: PortId,
        /// Reason for abandoning the frame.
        cause: IoFault,
    },
    /// No port status bit was set.
    Spurious,
    /// TH was already high again when the port was inspected.
    Ignored {
        /// Port that raised the edge.
        port: PortId,
    },
    /// The configured device has no handshake frame.
    Defect {
        /// Port that raised the edge.
        port: PortId,
        /// Device configured on that port.
        device: DeviceType,
    },
}

/// Picks the port behind an interrupt from raw status snapshots.
///
/// TH bits in the high bank win over TR bits in the low bank; port 1 wins
/// over port 2.
#[must_use]
pub const fn select_port(low_status: u32, high_status: u32) -> Option<PortId> {
    if high_status & line_mask(PortId::P1, SignalLine::Handshake) != 0 {
        Some(PortId::P1)
    } else if high_status & line_mask(PortId::P2, SignalLine::Handshake) != 0 {
        Some(PortId::P2)
    } else if low_status & line_mask(PortId::P1, SignalLine::ReplyA) != 0 {
        Some(PortId::P1)
    } else if low_status & line_mask(PortId::P2, SignalLine::ReplyA) != 0 {
        Some(PortId::P2)
    } else {
        None
    }
}

/// Low-bank and high-bank status bits that report an edge on `port`.
const fn edge_status_masks(port: PortId) -> (u32, u32) {
    (
        line_mask(port, SignalLine::ReplyA),
        line_mask(port, SignalLine::Handshake),
    )
}

/// Saturn edge dispatcher: one instance per adapter, invoked from the GPIO
/// interrupt handler.
pub struct SaturnDispatcher<'a, B, K> {
    ports: [Port; PORT_COUNT],
    states: &'a ControllerStates,
    bus: B,
    keyboard: K,
    scratch: [SaturnFrame; PORT_COUNT],
    diag: Diagnostics,
    trace: Option<Box<dyn TraceSink + Send>>,
}

impl<'a, B: GpioBus, K: ScancodeSource> SaturnDispatcher<'a, B, K> {
    /// Creates a dispatcher for a resolved layout.
    #[must_use]
    pub fn new(layout: &PortLayout, states: &'a ControllerStates, bus: B, keyboard: K) -> Self {
        Self {
            ports: *layout.ports(),
            states,
            bus,
            keyboard,
            scratch: [SaturnFrame::new(), SaturnFrame::new()],
            diag: Diagnostics::new(),
            trace: None,
        }
    }

    /// Installs a trace sink receiving every wire-level event.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.trace = Some(sink);
    }

    /// Counters accumulated since construction.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Shared access to the bus.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Shared access to the scancode source.
    #[must_use]
    pub const fn keyboard(&self) -> &K {
        &self.keyboard
    }

    /// Last frame assembled for `port`.
    #[must_use]
    pub fn last_frame(&self, port: PortId) -> &[u8] {
        self.scratch[port.index()].as_bytes()
    }

    /// Services one GPIO interrupt.
    ///
    /// Every status bit seen is acknowledged before returning, except a
    /// pending edge of the port that was not serviced: that one stays
    /// latched so the interrupt fires again for it.
    pub fn on_interrupt(&mut self) -> Dispatch {
        let mut low = self.bus.interrupt_status(Bank::Low);
        let mut high = self.bus.interrupt_status(Bank::High);

        let outcome = match select_port(low, high) {
            Some(port) => {
                let (other_low, other_high) = edge_status_masks(port.other());
                low &= !other_low;
                high &= !other_high;
                self.service(port)
            }
            None => {
                self.diag.record_fault(IoFault::SpuriousInterrupt, None);
                self.emit(TraceEvent::SpuriousInterrupt);
                Dispatch::Spurious
            }
        };

        if high != 0 {
            self.bus.clear_interrupt_status(Bank::High, high);
        }
        if low != 0 {
            self.bus.clear_interrupt_status(Bank::Low, low);
        }
        outcome
    }

    fn service(&mut self, port: PortId) -> Dispatch {
        if read(&mut self.bus, port, SignalLine::Handshake) {
            return Dispatch::Ignored { port };
        }

        let config = &self.ports[port.index()];
        let frame = &mut self.scratch[port.index()];
        if let Err(fault) = frame.build(config, self.states, &mut self.keyboard) {
            let device = config.device;
            log::error!("port {port:?}: {fault} ({device:?}), nothing sent");
            self.diag.record_fault(fault, Some(port));
            self.emit(TraceEvent::Defect { port, device });
            return Dispatch::Defect { port, device };
        }

        let len = frame.len();
        match send_frame(&mut self.bus, port, frame.as_bytes()) {
            Ok(()) => {
                self.diag.record_frame();
                self.emit(TraceEvent::FrameSent {
                    port,
                    len: u8::try_from(len).unwrap_or(u8::MAX),
                });
                Dispatch::Framed { port, len }
            }
            Err(cause) => {
                self.diag.record_fault(cause, Some(port));
                self.emit(TraceEvent::Aborted { port, cause });
                Dispatch::Aborted { port, cause }
            }
        }
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }
}
