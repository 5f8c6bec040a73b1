//! Keyboard scancode source consumed by Saturn keyboard slots.

/// Two-byte payload sent when no scancode is queued for a keyboard.
pub const NO_KEY_SENTINEL: [u8; 2] = [0x06, 0x00];

/// Adapter-side queue of translated keyboard scancodes.
///
/// Called from interrupt context, so implementations must not block.
pub trait ScancodeSource {
    /// Announces that `logical_port` carries a keyboard.
    fn register(&mut self, logical_port: u8);

    /// Pops the next pending scancode pair for `logical_port`, if any.
    fn next_scancode(&mut self, logical_port: u8) -> Option<[u8; 2]>;
}

/// [`ScancodeSource`] with no keyboards attached; every query is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeyboard;

impl ScancodeSource for NoKeyboard {
    fn register(&mut self, _logical_port: u8) {}

    fn next_scancode(&mut self, _logical_port: u8) -> Option<[u8; 2]> {
        None
    }
}

/// Returns the queued scancode for `logical_port`, or [`NO_KEY_SENTINEL`].
pub fn scancode_or_sentinel<K: ScancodeSource + ?Sized>(
    keyboard: &mut K,
    logical_port: u8,
) -> [u8; 2] {
    keyboard.next_scancode(logical_port).unwrap_or(NO_KEY_SENTINEL)
}
