//! Genesis polling engine: per-port cycle machines driven by one
//! arbitration loop.
//!
//! The loop watches the TH change bits of every port that follows TH. The
//! first port seen is serviced; while it waits for its next toggle, a toggle
//! on the other port hands control over and the first port drops back to
//! [`MachineState::WaitEdge`]. Every wait is bounded; a timeout abandons the
//! activation and resets both machines. The other core is stalled only
//! around each latch commit, never across a wait.

use super::cycle::{CycleProfile, Phase};
use super::multitap::TapFrame;
use crate::saturn::transmit;
use crate::signal::{line_mask, output_mask, read, LineAddr, SignalLine, TAP_SELECT_PIN};
use crate::timing::{spin_limit, WaitKind};
use crate::{
    Bank, ControllerStates, CoreStall, Diagnostics, GpioBus, IoFault, Port, PortId, PortLayout,
    StallRegion, TraceEvent, TraceSink, PORT_COUNT,
};

/// Per-port cycle machine state between toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MachineState {
    /// No activation in progress; the next toggle starts at an entry phase.
    #[default]
    WaitEdge,
    /// Mid-activation; the next toggle latches this phase.
    Armed(Phase),
}

/// Result of one call to [`GenesisEngine::poll_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum Activation {
    /// No TH toggle arrived within the idle spin limit.
    Idle,
    /// An activation ran to its last latch.
    Completed {
        /// Port serviced last.
        port: PortId,
    },
    /// An activation was abandoned.
    Aborted {
        /// Port being serviced when the activation ended.
        port: PortId,
        /// Reason for abandoning it.
        cause: IoFault,
    },
}

/// Genesis polling engine bound to one bus and stall primitive.
pub struct GenesisEngine<'a, B, S> {
    ports: [Port; PORT_COUNT],
    profiles: [Option<CycleProfile>; PORT_COUNT],
    watch: u32,
    states: &'a ControllerStates,
    bus: B,
    stall: S,
    region: StallRegion,
    machines: [MachineState; PORT_COUNT],
    held: [[u32; 2]; PORT_COUNT],
    diag: Diagnostics,
    trace: Option<Box<dyn TraceSink + Send>>,
}

impl<'a, B: GpioBus, S: CoreStall> GenesisEngine<'a, B, S> {
    /// Creates an engine for a resolved layout. Ports whose device does not
    /// follow TH are never serviced.
    #[must_use]
    pub fn new(layout: &PortLayout, states: &'a ControllerStates, bus: B, stall: S) -> Self {
        let ports = *layout.ports();
        let profiles = [
            CycleProfile::of(ports[0].device),
            CycleProfile::of(ports[1].device),
        ];
        let watch = PortId::ALL
            .into_iter()
            .filter(|port| profiles[port.index()].is_some())
            .fold(0, |mask, port| mask | th_mask(port));
        let held = [
            [
                bus.output(Bank::Low) | !output_mask(PortId::P1, Bank::Low),
                bus.output(Bank::High) | !output_mask(PortId::P1, Bank::High),
            ],
            [
                bus.output(Bank::Low) | !output_mask(PortId::P2, Bank::Low),
                bus.output(Bank::High) | !output_mask(PortId::P2, Bank::High),
            ],
        ];
        Self {
            ports,
            profiles,
            watch,
            states,
            bus,
            stall,
            region: StallRegion::new(),
            machines: [MachineState::WaitEdge; PORT_COUNT],
            held,
            diag: Diagnostics::new(),
            trace: None,
        }
    }

    /// Installs a trace sink receiving every latch, handoff and abort.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.trace = Some(sink);
    }

    /// Counters accumulated since construction.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Current machine state of `port`.
    #[must_use]
    pub const fn machine(&self, port: PortId) -> MachineState {
        self.machines[port.index()]
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

    /// Shared access to the stall primitive.
    #[must_use]
    pub const fn stall(&self) -> &S {
        &self.stall
    }

    /// Services every activation forever. Never yields.
    pub fn run(&mut self) -> ! {
        loop {
            let _ = self.poll_once();
        }
    }

    /// Waits (bounded) for one TH toggle and services the activation it
    /// starts.
    pub fn poll_once(&mut self) -> Activation {
        let Some((change, level)) = self.wait_toggle(WaitKind::IdleEdge) else {
            return Activation::Idle;
        };
        let first = if change & th_mask(PortId::P1) != 0 {
            PortId::P1
        } else {
            PortId::P2
        };
        let outcome = self.run_activation(first, level);
        self.machines = [MachineState::WaitEdge; PORT_COUNT];
        outcome
    }

    fn run_activation(&mut self, first: PortId, level: u32) -> Activation {
        let mut port = first;
        let mut phase = Phase::entry(level & th_mask(port) != 0);
        loop {
            let Some(profile) = self.profiles[port.index()] else {
                return Activation::Idle;
            };
            self.drive_phase(port, phase);
            if profile == CycleProfile::Multitap && phase == Phase::Cycle0Low {
                return self.send_tap_frame(port);
            }
            let Some(next) = phase.next(profile) else {
                self.diag.record_activation();
                return Activation::Completed { port };
            };
            self.machines[port.index()] = MachineState::Armed(next);

            let Some((change, level)) = self.wait_toggle(WaitKind::GenesisCycle) else {
                return self.abort(port, IoFault::PollTimeout);
            };
            let other = port.other();
            if change & th_mask(other) != 0 {
                self.machines[port.index()] = MachineState::WaitEdge;
                self.diag.record_handoff();
                self.emit(TraceEvent::Handoff {
                    from: port,
                    to: other,
                });
                port = other;
                phase = Phase::entry(level & th_mask(other) != 0);
            } else {
                phase = next;
            }
        }
    }

    fn send_tap_frame(&mut self, port: PortId) -> Activation {
        let tap = LineAddr::of_pin(TAP_SELECT_PIN);
        self.bus.set_output_bits(tap.bank, tap.mask());

        let config = &self.ports[port.index()];
        let frame = TapFrame::build(config.slots(), usize::from(config.offset), self.states);
        let result = transmit(&mut self.bus, port, frame.as_bytes());
        if read(&mut self.bus, port, SignalLine::Handshake) {
            self.drive_phase(port, Phase::Cycle0High);
        }

        match result {
            Ok(()) => {
                self.diag.record_frame();
                self.diag.record_activation();
                self.emit(TraceEvent::FrameSent {
                    port,
                    len: u8::try_from(frame.as_bytes().len()).unwrap_or(u8::MAX),
                });
                Activation::Completed { port }
            }
            Err(cause) => self.abort(port, cause),
        }
    }

    fn drive_phase(&mut self, port: PortId, phase: Phase) {
        let logical = usize::from(self.ports[port.index()].offset);
        let (low, high) = phase.latch(port, self.states.port_or_idle(logical));
        let other = self.held[port.other().index()];
        let low = low & other[Bank::Low.index()];
        let high = high & other[Bank::High.index()];
        self.region.enter(&mut self.stall);
        self.bus.write_output(Bank::Low, low);
        self.bus.write_output(Bank::High, high);
        self.region.leave(&mut self.stall);
        self.held[port.index()] = [
            low | !output_mask(port, Bank::Low),
            high | !output_mask(port, Bank::High),
        ];
        self.emit(TraceEvent::LatchDriven {
            port,
            phase,
            low,
            high,
        });
    }

    fn wait_toggle(&mut self, kind: WaitKind) -> Option<(u32, u32)> {
        let limit = spin_limit(kind);
        let mut previous = self.bus.input(Bank::High);
        for _ in 0..limit {
            let current = self.bus.input(Bank::High);
            let change = (current ^ previous) & self.watch;
            if change != 0 {
                return Some((change, current));
            }
            previous = current;
        }
        None
    }

    fn abort(&mut self, port: PortId, cause: IoFault) -> Activation {
        self.diag.record_fault(cause, Some(port));
        self.emit(TraceEvent::Aborted { port, cause });
        Activation::Aborted { port, cause }
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }
}

const fn th_mask(port: PortId) -> u32 {
    line_mask(port, SignalLine::Handshake)
}
