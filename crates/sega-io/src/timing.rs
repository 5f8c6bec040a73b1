/// Bounded wait points on the bus paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitKind {
    /// Saturn handshake wait for a TR level change.
    HandshakeAck,
    /// Genesis wait for the next TH toggle inside an activation.
    GenesisCycle,
    /// Genesis wait for the first TH toggle of an activation.
    IdleEdge,
    /// EA 4-way wait for any select-line change.
    EaSelect,
}

/// Spin limit of every wait point.
#[must_use]
pub const fn spin_limit(kind: WaitKind) -> u32 {
    match kind {
        WaitKind::HandshakeAck => 4096,
        WaitKind::GenesisCycle => 512,
        WaitKind::IdleEdge | WaitKind::EaSelect => 65_536,
    }
}
