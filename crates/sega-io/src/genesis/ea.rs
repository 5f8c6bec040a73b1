//! EA 4-way play adapter.
//!
//! Purely combinational: the console picks a sub-port with port 2 TR/TL and
//! a half with port 1 TH, and the low bank is rewritten on every change of
//! those lines. Port 2 TH high deselects every sub-port.

use super::cycle::{WORD_EXTENDED, WORD_TH_HIGH, WORD_TH_LOW};
use crate::signal::{is_set_in, line_mask, LineAddr, SignalLine, EA_SELECT_PIN};
use crate::timing::{spin_limit, WaitKind};
use crate::{Bank, ControllerStates, GpioBus, PortId, TraceEvent, TraceSink};

/// Line levels decoded into the word the adapter must drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaSelection {
    /// Port 2 TH high: no sub-port selected.
    Idle,
    /// A sub-port is selected.
    SubPort {
        /// Sub-port index, `(P2 TR << 1) | P2 TL`.
        index: u8,
        /// Port 1 TH level.
        th_high: bool,
    },
}

impl EaSelection {
    /// Decodes the selection from both input register snapshots.
    #[must_use]
    pub fn from_levels(low: u32, high: u32) -> Self {
        if is_set_in(high, Bank::High, PortId::P2, SignalLine::Handshake) {
            return Self::Idle;
        }
        let tr = is_set_in(low, Bank::Low, PortId::P2, SignalLine::ReplyA);
        let tl = is_set_in(high, Bank::High, PortId::P2, SignalLine::ReplyB);
        Self::SubPort {
            index: (u8::from(tr) << 1) | u8::from(tl),
            th_high: is_set_in(high, Bank::High, PortId::P1, SignalLine::Handshake),
        }
    }

    /// Logical port whose buffer supplies the word.
    #[must_use]
    pub fn logical_port(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::SubPort { index, .. } => usize::from(index),
        }
    }

    /// Buffer word driven for this selection.
    #[must_use]
    pub const fn word(self) -> usize {
        match self {
            Self::Idle => WORD_EXTENDED,
            Self::SubPort { th_high: true, .. } => WORD_TH_LOW,
            Self::SubPort { th_high: false, .. } => WORD_TH_HIGH,
        }
    }

    /// Sub-port index, `None` while idle.
    #[must_use]
    pub const fn sub_port(self) -> Option<u8> {
        match self {
            Self::Idle => None,
            Self::SubPort { index, .. } => Some(index),
        }
    }
}

const fn watch_mask(bank: Bank) -> u32 {
    match bank {
        Bank::Low => line_mask(PortId::P2, SignalLine::ReplyA),
        Bank::High => {
            line_mask(PortId::P2, SignalLine::Handshake)
                | line_mask(PortId::P2, SignalLine::ReplyB)
                | line_mask(PortId::P1, SignalLine::Handshake)
        }
    }
}

/// Polling engine for the EA 4-way adapter.
pub struct EaEngine<'a, B> {
    states: &'a ControllerStates,
    bus: B,
    levels: [u32; 2],
    trace: Option<Box<dyn TraceSink + Send>>,
}

impl<'a, B: GpioBus> EaEngine<'a, B> {
    /// Creates an engine reading sub-port state from `states`.
    #[must_use]
    pub fn new(states: &'a ControllerStates, bus: B) -> Self {
        Self {
            states,
            bus,
            levels: [0; 2],
            trace: None,
        }
    }

    /// Installs a trace sink receiving every driven word.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.trace = Some(sink);
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

    /// Reads the select lines and drives the matching word now.
    pub fn drive_current(&mut self) -> EaSelection {
        self.levels = [self.bus.input(Bank::Low), self.bus.input(Bank::High)];
        let selection = EaSelection::from_levels(self.levels[0], self.levels[1]);
        let word = self
            .states
            .port_or_idle(selection.logical_port())
            .word(selection.word())
            | LineAddr::of_pin(EA_SELECT_PIN).mask();
        self.bus.write_output(Bank::Low, word);
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(TraceEvent::EaSelect {
                sub_port: selection.sub_port(),
                word,
            });
        }
        selection
    }

    /// Waits (bounded) for a select line to change and redrives. Returns
    /// `None` when nothing changed within the spin limit.
    pub fn poll_once(&mut self) -> Option<EaSelection> {
        for _ in 0..spin_limit(WaitKind::EaSelect) {
            let low = self.bus.input(Bank::Low);
            let high = self.bus.input(Bank::High);
            let changed = ((low ^ self.levels[0]) & watch_mask(Bank::Low))
                | ((high ^ self.levels[1]) & watch_mask(Bank::High));
            if changed != 0 {
                return Some(self.drive_current());
            }
        }
        None
    }

    /// Drives the current selection, then follows every change forever.
    pub fn run(&mut self) -> ! {
        let _ = self.drive_current();
        loop {
            let _ = self.poll_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EaEngine, EaSelection};
    use crate::genesis::{WORD_EXTENDED, WORD_TH_HIGH, WORD_TH_LOW};
    use crate::signal::{line_mask, LineAddr, SignalLine, EA_SELECT_PIN};
    use crate::sim::{SimBus, TraceLog};
    use crate::{Bank, ControllerStates, GpioBus, PortId, TraceEvent};

    fn levels(p2_th: bool, tr: bool, tl: bool, p1_th: bool) -> (u32, u32) {
        let mut low = 0;
        let mut high = 0;
        if tr {
            low |= line_mask(PortId::P2, SignalLine::ReplyA);
        }
        if p2_th {
            high |= line_mask(PortId::P2, SignalLine::Handshake);
        }
        if tl {
            high |= line_mask(PortId::P2, SignalLine::ReplyB);
        }
        if p1_th {
            high |= line_mask(PortId::P1, SignalLine::Handshake);
        }
        (low, high)
    }

    #[test]
    fn port_two_th_high_selects_idle_word() {
        let (low, high) = levels(true, true, true, true);
        let selection = EaSelection::from_levels(low, high);
        assert_eq!(selection, EaSelection::Idle);
        assert_eq!(selection.logical_port(), 0);
        assert_eq!(selection.word(), WORD_EXTENDED);
    }

    #[test]
    fn tr_and_tl_form_the_sub_port_index() {
        let table = [
            (false, false, 0),
            (false, true, 1),
            (true, false, 2),
            (true, true, 3),
        ];
        for (tr, tl, index) in table {
            let (low, high) = levels(false, tr, tl, false);
            let selection = EaSelection::from_levels(low, high);
            assert_eq!(selection.sub_port(), Some(index));
            assert_eq!(selection.word(), WORD_TH_HIGH);
        }
        let (low, high) = levels(false, false, false, true);
        assert_eq!(EaSelection::from_levels(low, high).word(), WORD_TH_LOW);
    }

    #[test]
    fn drive_current_writes_sub_port_word_with_select_pin() {
        let states = ControllerStates::new();
        states.port_or_idle(2).store_word(WORD_TH_LOW, 0x0012_3400);
        let mut bus = SimBus::new();
        let (low, high) = levels(false, true, false, true);
        bus.set_input_levels(low, high);
        let mut engine = EaEngine::new(&states, bus);

        let selection = engine.drive_current();

        assert_eq!(selection.sub_port(), Some(2));
        let select = LineAddr::of_pin(EA_SELECT_PIN).mask();
        assert_eq!(engine.bus().output(Bank::Low), 0x0012_3400 | select);
    }

    #[test]
    fn unchanged_lines_leave_the_poll_idle() {
        let states = ControllerStates::new();
        let mut engine = EaEngine::new(&states, SimBus::new());
        let _ = engine.drive_current();
        assert_eq!(engine.poll_once(), None);
    }

    #[test]
    fn idle_selection_drives_extended_word_of_first_port() {
        let states = ControllerStates::new();
        states.port_or_idle(0).store_word(WORD_EXTENDED, 0x00AB_0000);
        states.port_or_idle(1).store_word(WORD_EXTENDED, 0x00CD_0000);
        let mut bus = SimBus::new();
        let (low, high) = levels(true, false, true, false);
        bus.set_input_levels(low, high);
        let log = TraceLog::default();
        let mut engine = EaEngine::new(&states, bus);
        engine.set_trace_sink(Box::new(log.clone()));

        assert_eq!(engine.drive_current(), EaSelection::Idle);

        let word = 0x00AB_0000 | LineAddr::of_pin(EA_SELECT_PIN).mask();
        assert_eq!(engine.bus().output(Bank::Low), word);
        assert_eq!(
            log.events(),
            vec![TraceEvent::EaSelect {
                sub_port: None,
                word
            }]
        );
    }

    #[test]
    fn select_change_redrives_new_sub_port() {
        let states = ControllerStates::new();
        states.port_or_idle(0).store_word(WORD_TH_HIGH, 0x0000_1100);
        states.port_or_idle(3).store_word(WORD_TH_LOW, 0x0033_0000);
        let log = TraceLog::default();
        let mut engine = EaEngine::new(&states, SimBus::new());
        engine.set_trace_sink(Box::new(log.clone()));
        let select = LineAddr::of_pin(EA_SELECT_PIN).mask();

        assert_eq!(engine.drive_current().sub_port(), Some(0));
        assert_eq!(engine.bus().output(Bank::Low), 0x0000_1100 | select);

        let (low, high) = levels(false, true, true, true);
        engine.bus_mut().set_input_levels(low, high);

        assert_eq!(
            engine.poll_once(),
            Some(EaSelection::SubPort {
                index: 3,
                th_high: true
            })
        );
        assert_eq!(engine.bus().output(Bank::Low), 0x0033_0000 | select);
        assert_eq!(log.events().len(), 2);
        assert_eq!(engine.poll_once(), None);
    }
}
