//! Host-side stand-ins for the hardware seams.
//!
//! [`SimBus`] models both GPIO banks with scriptable input levels and an
//! optional Saturn "echo console" per port that answers every TL toggle on
//! TR and captures the transmitted bytes. The other types record what the
//! engines asked of the stall, keyboard and trace seams.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::signal::{line_addr, line_mask, SignalLine};
use crate::{
    Bank, CoreStall, GpioBus, PinMode, PortId, ScancodeSource, TraceEvent, TraceSink, PORT_COUNT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    low: u32,
    high: u32,
    reads: u32,
}

/// Simulated two-bank GPIO controller.
///
/// Outputs start all high and inputs all low. Scripted steps replace both
/// input registers for a fixed number of input reads each; the last step's
/// levels persist once the script is drained.
#[derive(Debug, Clone)]
pub struct SimBus {
    inputs: [u32; 2],
    outputs: [u32; 2],
    status: [u32; 2],
    script: VecDeque<Step>,
    reads: u64,
    echo: [bool; PORT_COUNT],
    pending_high: [Option<u8>; PORT_COUNT],
    received: [Vec<u8>; PORT_COUNT],
    pins: BTreeMap<u8, PinMode>,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    /// Creates a bus with every output high and every input low.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inputs: [0; 2],
            outputs: [u32::MAX; 2],
            status: [0; 2],
            script: VecDeque::new(),
            reads: 0,
            echo: [false; PORT_COUNT],
            pending_high: [None; PORT_COUNT],
            received: [Vec::new(), Vec::new()],
            pins: BTreeMap::new(),
        }
    }

    /// Sets both input registers immediately.
    pub fn set_input_levels(&mut self, low: u32, high: u32) {
        self.inputs = [low, high];
    }

    /// Queues input levels held for `reads` input register reads.
    pub fn push_levels(&mut self, low: u32, high: u32, reads: u32) {
        self.script.push_back(Step { low, high, reads });
    }

    /// Queues high-bank levels, each held for the given number of reads. The
    /// low bank keeps its current level.
    pub fn script_high(&mut self, steps: &[(u32, u32)]) {
        let low = self
            .script
            .back()
            .map_or(self.inputs[Bank::Low.index()], |step| step.low);
        for &(high, reads) in steps {
            self.push_levels(low, high, reads);
        }
    }

    /// Number of scripted steps not yet consumed.
    #[must_use]
    pub fn pending_steps(&self) -> usize {
        self.script.len()
    }

    /// Makes the simulated console acknowledge every TL toggle on `port`.
    pub fn enable_echo(&mut self, port: PortId) {
        self.echo[port.index()] = true;
    }

    /// Bytes captured from the handshake on `port`.
    #[must_use]
    pub fn received_bytes(&self, port: PortId) -> Vec<u8> {
        self.received[port.index()].clone()
    }

    /// Nibble currently driven on R/L/D/U of `port`, R as bit 3.
    #[must_use]
    pub fn nibble(&self, port: PortId) -> u8 {
        SignalLine::NIBBLE.iter().fold(0, |acc, &line| {
            let addr = line_addr(port, line);
            let bit = u8::from(self.outputs[addr.bank.index()] & addr.mask() != 0);
            (acc << 1) | bit
        })
    }

    /// Total input register reads so far.
    #[must_use]
    pub const fn input_reads(&self) -> u64 {
        self.reads
    }

    /// Latches interrupt status bits as if edges had been seen.
    pub fn raise_interrupt(&mut self, bank: Bank, mask: u32) {
        self.status[bank.index()] |= mask;
    }

    /// Mode last applied to `pin`, if any.
    #[must_use]
    pub fn pin_mode(&self, pin: u8) -> Option<PinMode> {
        self.pins.get(&pin).copied()
    }

    fn capture_tl_edge(&mut self, bank: Bank, mask: u32, high: bool) {
        for port in PortId::ALL {
            let tl = line_addr(port, SignalLine::ReplyB);
            if tl.bank != bank || mask & tl.mask() == 0 {
                continue;
            }
            let was_high = self.outputs[bank.index()] & tl.mask() != 0;
            if was_high == high {
                continue;
            }
            let nibble = self.nibble(port);
            let index = port.index();
            if high {
                if let Some(upper) = self.pending_high[index].take() {
                    self.received[index].push((upper << 4) | nibble);
                }
            } else {
                self.pending_high[index] = Some(nibble);
            }
        }
    }

    fn echo_levels(&self, bank: Bank, mut level: u32) -> u32 {
        for port in PortId::ALL {
            if !self.echo[port.index()] {
                continue;
            }
            let tr = line_addr(port, SignalLine::ReplyA);
            if tr.bank != bank {
                continue;
            }
            let tl = line_addr(port, SignalLine::ReplyB);
            if self.outputs[tl.bank.index()] & tl.mask() == 0 {
                level |= tr.mask();
            } else {
                level &= !tr.mask();
            }
        }
        level
    }
}

impl GpioBus for SimBus {
    fn input(&mut self, bank: Bank) -> u32 {
        self.reads += 1;
        if let Some(step) = self.script.front_mut() {
            self.inputs = [step.low, step.high];
            step.reads = step.reads.saturating_sub(1);
            if step.reads == 0 {
                self.script.pop_front();
            }
        }
        self.echo_levels(bank, self.inputs[bank.index()])
    }

    fn output(&self, bank: Bank) -> u32 {
        self.outputs[bank.index()]
    }

    fn write_output(&mut self, bank: Bank, value: u32) {
        self.outputs[bank.index()] = value;
    }

    fn set_output_bits(&mut self, bank: Bank, mask: u32) {
        self.capture_tl_edge(bank, mask, true);
        self.outputs[bank.index()] |= mask;
    }

    fn clear_output_bits(&mut self, bank: Bank, mask: u32) {
        self.capture_tl_edge(bank, mask, false);
        self.outputs[bank.index()] &= !mask;
    }

    fn interrupt_status(&mut self, bank: Bank) -> u32 {
        self.status[bank.index()]
    }

    fn clear_interrupt_status(&mut self, bank: Bank, mask: u32) {
        self.status[bank.index()] &= !mask;
    }

    fn configure_pin(&mut self, pin: u8, mode: PinMode) {
        self.pins.insert(pin, mode);
    }
}

/// High-bank TH levels with `port` held low and the other port idle high.
#[must_use]
pub const fn th_low(port: PortId) -> u32 {
    th_both_high() & !line_mask(port, SignalLine::Handshake)
}

/// High-bank TH levels with both ports idle high.
#[must_use]
pub const fn th_both_high() -> u32 {
    line_mask(PortId::P1, SignalLine::Handshake) | line_mask(PortId::P2, SignalLine::Handshake)
}

/// [`CoreStall`] that counts stall and release requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingStall {
    stalls: u32,
    releases: u32,
}

impl CountingStall {
    /// Stall requests seen.
    #[must_use]
    pub const fn stalls(&self) -> u32 {
        self.stalls
    }

    /// Release requests seen.
    #[must_use]
    pub const fn releases(&self) -> u32 {
        self.releases
    }
}

impl CoreStall for CountingStall {
    fn stall_other_core(&mut self) {
        self.stalls = self.stalls.saturating_add(1);
    }

    fn release_other_core(&mut self) {
        self.releases = self.releases.saturating_add(1);
    }
}

/// [`ScancodeSource`] backed by per-port FIFO queues.
#[derive(Debug, Clone, Default)]
pub struct QueuedScancodes {
    queues: BTreeMap<u8, VecDeque<[u8; 2]>>,
    registered: Vec<u8>,
}

impl QueuedScancodes {
    /// Queues a scancode pair for `logical_port`.
    pub fn push(&mut self, logical_port: u8, scancode: [u8; 2]) {
        self.queues.entry(logical_port).or_default().push_back(scancode);
    }

    /// Logical ports announced through [`ScancodeSource::register`].
    #[must_use]
    pub fn registered(&self) -> &[u8] {
        &self.registered
    }
}

impl ScancodeSource for QueuedScancodes {
    fn register(&mut self, logical_port: u8) {
        self.registered.push(logical_port);
    }

    fn next_scancode(&mut self, logical_port: u8) -> Option<[u8; 2]> {
        self.queues.get_mut(&logical_port)?.pop_front()
    }
}

/// Shared, clonable [`TraceSink`] that keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl TraceLog {
    /// Copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TraceSink for TraceLog {
    fn on_event(&mut self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
