//! Typed driver errors.
//!
//! Every error the core can hand back to the dispatch harness is a
//! variant here. Errors are explicit and typed; there are no
//! stringly-typed failures. Copy-primitive failures from the
//! [`DriverEnv`](crate::env::DriverEnv) collaborator are values of this
//! same type and are propagated verbatim.
//!
//! Invariant breaches inside the core (a reader parked on a full ring, a
//! writer parked on an empty ring, an ioctl that blocks without
//! suspending) are not errors: they are bugs, and they panic.

use thiserror::Error;

/// Errors returned by the socket core.
///
/// The variants mirror the POSIX conditions a UNIX-domain-socket layer is
/// expected to surface; the dispatch harness maps them onto its own wire
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// The minor number is outside the socket table.
    #[error("no such device")]
    NoSuchDevice,
    /// The slot exists but is not in use.
    #[error("invalid argument")]
    InvalidArgument,
    /// No free slot was available on open.
    #[error("socket table is full")]
    NoFile,
    /// Ring buffer allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// The half was shut down, or the write targets a closed reader.
    #[error("broken pipe")]
    BrokenPipe,
    /// A stream or seqpacket operation on a disconnected socket.
    #[error("not connected")]
    NotConnected,
    /// The peer was reset; delivered exactly once, then cleared.
    #[error("connection reset by peer")]
    ConnectionReset,
    /// A datagram or seqpacket payload larger than the ring capacity.
    #[error("message too long")]
    MessageSize,
    /// A datagram addressed to a name no socket is bound to.
    #[error("no such address")]
    NoEntry,
    /// A non-blocking connect was parked and then cancelled.
    #[error("operation in progress")]
    InProgress,
    /// A non-blocking read or write would have blocked.
    #[error("resource temporarily unavailable")]
    Again,
    /// A parked request was cancelled explicitly.
    #[error("interrupted")]
    Interrupted,
}

/// A specialized `Result` for socket-core operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_posix_flavoured() {
        assert_eq!(Error::BrokenPipe.to_string(), "broken pipe");
        assert_eq!(
            Error::ConnectionReset.to_string(),
            "connection reset by peer"
        );
        assert_eq!(Error::Again.to_string(), "resource temporarily unavailable");
    }

    #[test]
    fn errors_are_comparable() {
        let e = Error::NotConnected;
        assert_eq!(e, Error::NotConnected);
        assert_ne!(e, Error::BrokenPipe);
    }
}
