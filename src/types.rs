//! Core identifier and flag types.
//!
//! The core addresses everything by small copyable identifiers: slots by
//! [`Minor`], processes by [`Endpoint`], memory windows by [`GrantId`],
//! in-flight requests by [`RequestId`]. Relationships between sockets
//! (peer, backlog, child) are stored as minors and resolved through the
//! table on every traversal; no slot ever owns a reference to another.

use core::fmt;

/// Index of a slot in the socket table, doubling as the device minor
/// number the dispatch harness routes requests by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Minor(u32);

impl Minor {
    /// Creates a minor from a raw slot index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the minor as a table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Minor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a process endpoint, assigned by the dispatch harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(u32);

impl Endpoint {
    /// The "no endpoint" sentinel used by pretend calls.
    pub const NONE: Self = Self(u32::MAX);

    /// Creates an endpoint from its raw identity.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identity.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to a caller-granted memory window for bulk transfer.
///
/// The core never dereferences a grant itself; all access goes through
/// the safe-copy half of [`DriverEnv`](crate::env::DriverEnv).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantId(u32);

impl GrantId {
    /// The invalid-grant sentinel used by pretend calls.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a grant handle from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw grant value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Correlation key for suspension, cancellation and deferred replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw request id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The communication style of a socket.
///
/// A fresh slot has no type; the control collaborator assigns one when
/// the socket is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockType {
    /// Connection-oriented byte stream.
    Stream,
    /// Connection-oriented, one record in flight at a time.
    Seqpacket,
    /// Connectionless datagrams, resolved per send by bound address.
    Dgram,
}

impl SockType {
    /// Returns true for the connection-oriented types.
    #[must_use]
    pub const fn is_connection_oriented(self) -> bool {
        matches!(self, Self::Stream | Self::Seqpacket)
    }
}

/// Bitset of the socket halves that have not been shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u8);

impl Mode {
    /// The read half is open.
    pub const R: Self = Self(0b01);
    /// The write half is open.
    pub const W: Self = Self(0b10);
    /// Both halves open; the state of a fresh socket.
    pub const RW: Self = Self(0b11);

    /// Returns the empty mode (both halves shut down).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Clears the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// Per-request flags carried by read, write and ioctl entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpFlags(u32);

impl OpFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Fail with [`Again`](crate::Error::Again) (or
    /// [`InProgress`](crate::Error::InProgress) for connect) instead of
    /// parking.
    pub const NONBLOCK: Self = Self(0b1);

    /// Returns true if the request must not block.
    #[must_use]
    pub const fn nonblocking(self) -> bool {
        self.0 & Self::NONBLOCK.0 != 0
    }
}
