#![no_main]

use libfuzzer_sys::fuzz_target;
use sega_io::genesis::TapFrame;
use sega_io::sim::SimBus;
use sega_io::{
    resolve, AdapterConfig, Bank, ControllerStates, GpioBus, MultitapMode, NoKeyboard, PortId,
    SaturnDispatcher, SaturnFrame, System, WIRED_MAX_DEV,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 + WIRED_MAX_DEV {
        return;
    }

    let system = if data[0] & 1 == 0 {
        System::Genesis
    } else {
        System::Saturn
    };
    let mut config = AdapterConfig::new(system, MultitapMode::from_u32(u32::from(data[1])));
    config
        .dev_modes
        .copy_from_slice(&data[2..2 + WIRED_MAX_DEV]);
    let layout = resolve(&config);
    assert_eq!(layout, resolve(&config));

    let states = ControllerStates::new();
    let payload = &data[2 + WIRED_MAX_DEV..];
    for (logical, chunk) in payload.chunks(32).take(WIRED_MAX_DEV).enumerate() {
        states.port_or_idle(logical).store_bytes(0, chunk);
    }

    for port in layout.ports() {
        let mut frame = SaturnFrame::new();
        let _ = frame.build(port, &states, &mut NoKeyboard);
        let _ = TapFrame::build(port.slots(), usize::from(port.offset), &states);
    }

    let mut dispatcher = SaturnDispatcher::new(&layout, &states, SimBus::new(), NoKeyboard);
    dispatcher.bus_mut().enable_echo(PortId::P1);
    dispatcher.bus_mut().enable_echo(PortId::P2);
    dispatcher
        .bus_mut()
        .raise_interrupt(Bank::High, u32::from(data[0]) << 3);
    let _ = dispatcher.on_interrupt();
    if dispatcher.bus_mut().interrupt_status(Bank::High) != 0 {
        let _ = dispatcher.on_interrupt();
    }
    assert_eq!(dispatcher.bus_mut().interrupt_status(Bank::High), 0);
});
