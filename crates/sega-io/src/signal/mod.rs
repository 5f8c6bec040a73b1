//! Controller-line addressing, access and one-time configuration.

/// Single-register line access helpers.
pub mod access;
/// Fixed pin map and compile-time (bank, bit) addressing.
pub mod map;
/// One-time electrical configuration of every controller line.
pub mod setup;

pub use access::{drive_nibble, is_set_in, read, write};
pub use map::{
    line_addr, line_mask, output_mask, LineAddr, SignalLine, EA_SELECT_PIN, LINE_COUNT,
    LINE_TABLE, OUTPUT_MASKS, PIN_MAP, TAP_SELECT_PIN,
};
pub use setup::configure_lines;
