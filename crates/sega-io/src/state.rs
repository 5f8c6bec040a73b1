//! Externally written controller-state buffers.
//!
//! The adapter layer is the only writer and the bus engines are the only
//! readers. Buffers are stored as relaxed 32-bit atomics so concurrent access
//! is defined; a read may observe a half-updated state, which the consoles
//! tolerate.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::WIRED_MAX_DEV;

/// Size in bytes of one logical port's output buffer.
pub const OUTPUT_BUFFER_BYTES: usize = 32;

const OUTPUT_BUFFER_WORDS: usize = OUTPUT_BUFFER_BYTES / 4;

/// Fixed-layout output buffer for one logical port.
///
/// Bytes are little-endian within each 32-bit word, matching how the
/// adapter lays out GPIO latch words.
#[derive(Debug)]
pub struct OutputBuffer {
    words: [AtomicU32; OUTPUT_BUFFER_WORDS],
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Creates a zeroed buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [const { AtomicU32::new(0) }; OUTPUT_BUFFER_WORDS],
        }
    }

    /// Reads 32-bit word `index`. Out-of-range indices read as zero.
    #[must_use]
    pub fn word(&self, index: usize) -> u32 {
        self.words
            .get(index)
            .map_or(0, |word| word.load(Ordering::Relaxed))
    }

    /// Reads byte `index`. Out-of-range indices read as zero.
    #[must_use]
    pub fn byte(&self, index: usize) -> u8 {
        self.word(index / 4).to_le_bytes()[index % 4]
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`.
    pub fn read_bytes(&self, offset: usize, out: &mut [u8]) {
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.byte(offset + i);
        }
    }

    /// Overwrites 32-bit word `index`. Out-of-range indices are ignored.
    pub fn store_word(&self, index: usize, value: u32) {
        if let Some(word) = self.words.get(index) {
            word.store(value, Ordering::Relaxed);
        }
    }

    /// Overwrites bytes starting at `offset`; bytes past the end are dropped.
    pub fn store_bytes(&self, offset: usize, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            let index = offset + i;
            let Some(word) = self.words.get(index / 4) else {
                return;
            };
            let shift = (index % 4) * 8;
            let mask = 0xFF_u32 << shift;
            let value = u32::from(*byte) << shift;
            let _ = word.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some((current & !mask) | value)
            });
        }
    }
}

/// Output buffers for every logical port.
#[derive(Debug, Default)]
pub struct ControllerStates {
    ports: [OutputBuffer; WIRED_MAX_DEV],
}

impl ControllerStates {
    /// Creates zeroed buffers for all logical ports.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ports: [const { OutputBuffer::new() }; WIRED_MAX_DEV],
        }
    }

    /// Returns the buffer of `logical_port`, if it exists.
    #[must_use]
    pub fn port(&self, logical_port: usize) -> Option<&OutputBuffer> {
        self.ports.get(logical_port)
    }

    /// Returns the buffer of `logical_port`, falling back to an all-zero
    /// buffer for out-of-range indices.
    #[must_use]
    pub fn port_or_idle(&self, logical_port: usize) -> &OutputBuffer {
        static IDLE: OutputBuffer = OutputBuffer::new();
        self.ports.get(logical_port).unwrap_or(&IDLE)
    }
}
