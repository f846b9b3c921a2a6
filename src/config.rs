//! Build-time constants for the socket core.
//!
//! All sizes are fixed at build time; the table is allocated once at
//! startup and ring buffers are allocated per socket on open.

/// Number of slots in the socket table, including the reserved slot 0.
///
/// Slot 0 belongs to the device node itself; open never hands it out.
pub const NR_SOCKS: usize = 256;

/// Capacity in bytes of each per-socket ring buffer.
///
/// Datagram and seqpacket payloads must fit in one ring; larger writes
/// fail with [`Error::MessageSize`](crate::Error::MessageSize).
pub const BUF_CAP: usize = 32768;

/// Maximum number of pending connections a listening socket can hold.
pub const SOMAXCONN: usize = 64;

/// Number of path bytes that participate in datagram address matching.
pub const PATH_MAX: usize = 104;

/// Maximum number of passed file descriptors staged on one socket.
pub const OPEN_MAX: usize = 255;
