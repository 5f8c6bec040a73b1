//! Host-side console simulator for the sega-io bus engine.
//!
//! Loads an adapter configuration and optional controller state from JSON,
//! brings the engine up against a simulated bus and plays one console
//! request against it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use sega_io::signal::{line_mask, SignalLine};
use sega_io::sim::{th_both_high, th_low, CountingStall, QueuedScancodes, SimBus, TraceLog};
use sega_io::{
    init, resolve, Activity, AdapterConfig, Bank, ControllerStates, DeviceType, Diagnostics,
    Engine, GpioBus, IoFault, PortId, PortLayout, TraceEvent, WIRED_MAX_DEV,
};
#[cfg(test)]
use tempfile as _;

/// Input reads each scripted TH level is held for.
const EDGE_HOLD_READS: u32 = 4;

#[derive(Debug, Parser)]
#[command(name = "sega-io-sim", version, about = "Play console requests against the sega-io engine")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print every wire-level trace event.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the port layout resolved from a configuration.
    Resolve {
        /// Adapter configuration (JSON).
        config: PathBuf,
    },
    /// Pull TH low on a Saturn port and capture the frame sent back.
    Saturn {
        /// Adapter configuration (JSON).
        config: PathBuf,
        /// Controller state and queued scancodes (JSON).
        #[arg(long)]
        state: Option<PathBuf>,
        /// Physical port raising the edge.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        port: u8,
    },
    /// Toggle TH on a Genesis port and list every latch driven.
    Genesis {
        /// Adapter configuration (JSON).
        config: PathBuf,
        /// Controller state (JSON).
        #[arg(long)]
        state: Option<PathBuf>,
        /// Physical port whose TH is toggled.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        port: u8,
        /// Number of TH toggles, starting with a falling edge.
        #[arg(long, default_value_t = 3)]
        edges: u32,
    },
}

/// Controller state fixture.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StateFile {
    #[serde(default)]
    ports: Vec<PortState>,
    #[serde(default)]
    scancodes: Vec<Scancode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PortState {
    logical: usize,
    #[serde(default)]
    bytes: Vec<u8>,
    #[serde(default)]
    words: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scancode {
    logical: u8,
    code: [u8; 2],
}

#[derive(Debug, Serialize)]
struct PortReport {
    port: PortId,
    device: DeviceType,
    offset: u8,
    slots: Vec<DeviceType>,
    logical_start: usize,
    logical_end: usize,
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    activity: String,
    ports: Vec<PortReport>,
    rejected: Vec<(usize, IoFault)>,
}

impl LayoutReport {
    fn new(layout: &PortLayout) -> Self {
        let ports = layout
            .ports()
            .iter()
            .map(|port| {
                let range = port.logical_range();
                PortReport {
                    port: port.id,
                    device: port.device,
                    offset: port.offset,
                    slots: port.slots().to_vec(),
                    logical_start: range.start,
                    logical_end: range.end,
                }
            })
            .collect();
        Self {
            activity: format!("{:?}", Activity::for_layout(layout)),
            ports,
            rejected: layout.rejected_modes().collect(),
        }
    }
}

fn load_config(path: &Path) -> Result<AdapterConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_state(path: Option<&Path>) -> Result<StateFile> {
    let Some(path) = path else {
        return Ok(StateFile::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn apply_state(
    file: &StateFile,
    states: &ControllerStates,
    keyboard: &mut QueuedScancodes,
) -> Result<()> {
    for entry in &file.ports {
        let Some(buffer) = states.port(entry.logical) else {
            bail!(
                "logical port {} out of range (max {})",
                entry.logical,
                WIRED_MAX_DEV - 1
            );
        };
        buffer.store_bytes(0, &entry.bytes);
        for (index, word) in entry.words.iter().enumerate() {
            buffer.store_word(index, *word);
        }
    }
    for scancode in &file.scancodes {
        keyboard.push(scancode.logical, scancode.code);
    }
    Ok(())
}

fn port_id(port: u8) -> Result<PortId> {
    PortId::from_index(usize::from(port.saturating_sub(1)))
        .with_context(|| format!("no physical port {port}"))
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_diagnostics(diagnostics: &Diagnostics) -> Result<()> {
    println!("diagnostics: {}", serde_json::to_string(diagnostics)?);
    Ok(())
}

fn print_trace(enabled: bool, log: &TraceLog) {
    if !enabled {
        return;
    }
    for event in log.events() {
        println!("trace: {event:?}");
    }
}

fn run_resolve(config: &Path) -> Result<()> {
    let layout = resolve(&load_config(config)?);
    println!("{}", serde_json::to_string_pretty(&LayoutReport::new(&layout))?);
    Ok(())
}

fn run_saturn(cli_trace: bool, config: &Path, state: Option<&Path>, port: u8) -> Result<()> {
    let config = load_config(config)?;
    let port = port_id(port)?;
    let states = ControllerStates::new();
    let mut keyboard = QueuedScancodes::default();
    apply_state(&load_state(state)?, &states, &mut keyboard)?;

    let mut bus = SimBus::new();
    bus.enable_echo(port);
    let up = init(&config, &states, bus, CountingStall::default(), keyboard);
    let Engine::SaturnInterrupt(mut dispatcher) = up.engine else {
        bail!("configuration starts {:?}, not the Saturn interrupt", up.activity);
    };
    let log = TraceLog::default();
    dispatcher.set_trace_sink(Box::new(log.clone()));

    dispatcher
        .bus_mut()
        .raise_interrupt(Bank::High, line_mask(port, SignalLine::Handshake));
    let outcome = dispatcher.on_interrupt();
    log::debug!("dispatch on {port:?}: {outcome:?}");

    println!("dispatch: {outcome:?}");
    println!("frame: {}", hex(&dispatcher.bus().received_bytes(port)));
    print_trace(cli_trace, &log);
    print_diagnostics(dispatcher.diagnostics())
}

fn run_genesis(
    cli_trace: bool,
    config: &Path,
    state: Option<&Path>,
    port: u8,
    edges: u32,
) -> Result<()> {
    let config = load_config(config)?;
    let port = port_id(port)?;
    let states = ControllerStates::new();
    let mut keyboard = QueuedScancodes::default();
    apply_state(&load_state(state)?, &states, &mut keyboard)?;

    let mut bus = SimBus::new();
    bus.script_high(&[(th_both_high(), EDGE_HOLD_READS)]);
    for edge in 0..edges {
        let level = if edge % 2 == 0 {
            th_low(port)
        } else {
            th_both_high()
        };
        bus.script_high(&[(level, EDGE_HOLD_READS)]);
    }

    let up = init(&config, &states, bus, CountingStall::default(), keyboard);
    let log = TraceLog::default();
    match up.engine {
        Engine::GenesisPolling(mut engine) => {
            engine.set_trace_sink(Box::new(log.clone()));
            while engine.bus().pending_steps() > 0 {
                let activation = engine.poll_once();
                println!("activation: {activation:?}");
            }
            for event in log.events() {
                if let TraceEvent::LatchDriven {
                    port,
                    phase,
                    low,
                    high,
                } = event
                {
                    println!("{port:?} {phase:?} low={low:#010X} high={high:#010X}");
                }
            }
            let tap = engine.bus().received_bytes(port);
            if !tap.is_empty() {
                println!("frame: {}", hex(&tap));
            }
            print_trace(cli_trace, &log);
            print_diagnostics(engine.diagnostics())
        }
        Engine::EaPolling(mut engine) => {
            engine.set_trace_sink(Box::new(log.clone()));
            let selection = engine.drive_current();
            println!(
                "ea: {selection:?} low={:#010X}",
                engine.bus().output(Bank::Low)
            );
            print_trace(cli_trace, &log);
            Ok(())
        }
        Engine::SaturnInterrupt(_) | Engine::Inactive => {
            bail!("configuration starts {:?}, not a Genesis task", up.activity)
        }
    }
}

const fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(level_filter(cli.verbose))
        .parse_default_env()
        .init();

    match cli.command {
        Command::Resolve { config } => run_resolve(&config),
        Command::Saturn {
            config,
            state,
            port,
        } => run_saturn(cli.trace, &config, state.as_deref(), port),
        Command::Genesis {
            config,
            state,
            port,
            edges,
        } => run_genesis(cli.trace, &config, state.as_deref(), port, edges),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_state, hex, level_filter, port_id, Cli, Command, StateFile};
    use clap::Parser;
    use log::LevelFilter;
    use sega_io::sim::QueuedScancodes;
    use sega_io::{ControllerStates, PortId, ScancodeSource};

    #[test]
    fn parses_genesis_subcommand_with_globals() {
        let cli = Cli::try_parse_from([
            "sega-io-sim",
            "-vv",
            "genesis",
            "config.json",
            "--port",
            "2",
            "--edges",
            "8",
            "--trace",
        ])
        .expect("valid arguments");

        assert_eq!(cli.verbose, 2);
        assert!(cli.trace);
        let Command::Genesis { port, edges, .. } = cli.command else {
            panic!("expected genesis");
        };
        assert_eq!((port, edges), (2, 8));
    }

    #[test]
    fn rejects_port_three() {
        assert!(Cli::try_parse_from(["sega-io-sim", "saturn", "c.json", "--port", "3"]).is_err());
    }

    #[test]
    fn state_file_fills_buffers_and_queues_scancodes() {
        let file: StateFile = serde_json::from_str(
            r#"{"ports":[{"logical":2,"bytes":[1,2],"words":[7]}],
                "scancodes":[{"logical":2,"code":[28,128]}]}"#,
        )
        .expect("valid state");
        let states = ControllerStates::new();
        let mut keyboard = QueuedScancodes::default();

        apply_state(&file, &states, &mut keyboard).expect("in range");

        assert_eq!(states.port_or_idle(2).word(0), 7);
        assert_eq!(keyboard.next_scancode(2), Some([28, 128]));
    }

    #[test]
    fn out_of_range_logical_port_is_an_error() {
        let file: StateFile =
            serde_json::from_str(r#"{"ports":[{"logical":12}]}"#).expect("valid state");
        let states = ControllerStates::new();
        assert!(apply_state(&file, &states, &mut QueuedScancodes::default()).is_err());
    }

    #[test]
    fn helpers_format_and_map() {
        assert_eq!(hex(&[0x02, 0xFE]), "02 FE");
        assert_eq!(port_id(2).expect("port 2"), PortId::P2);
        assert_eq!(level_filter(0), LevelFilter::Warn);
        assert_eq!(level_filter(9), LevelFilter::Trace);
    }
}
