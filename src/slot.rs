//! Per-socket slot state.
//!
//! Everything the core knows about one socket lives in its slot: type
//! and shutdown mode, the ring buffer, the peer/backlog/child linkage
//! (stored as minors, resolved through the table), address bookkeeping
//! for datagrams, the deferred one-shot error, staged passed
//! descriptors, the suspension record and the select watch.
//!
//! A free slot holds no `Socket` at all; the table stores `Option` so a
//! released slot drops every field, the ring included.

use crate::addr::UnixAddr;
use crate::config::SOMAXCONN;
use crate::error::Error;
use crate::ring::RingBuffer;
use crate::select::SelectOps;
use crate::suspend::{ParkedRequest, SuspendKind};
use crate::types::{Endpoint, Minor, Mode, SockType};

/// The state of one in-use socket.
#[derive(Debug)]
pub(crate) struct Socket {
    /// The endpoint that owns the socket; re-recorded on every ioctl.
    pub owner: Endpoint,
    /// Communication style; unset until the control collaborator assigns
    /// one.
    pub sock_type: Option<SockType>,
    /// Halves not yet shut down.
    pub mode: Mode,
    /// The receive ring; the peer fills it, the owner drains it.
    pub ring: RingBuffer,
    /// Connected or connecting peer.
    ///
    /// For a connected pair the link is symmetric. For a connecting
    /// client it points at the listener while the listener still points
    /// nowhere. Always `None` for datagram sockets.
    pub peer: Option<Minor>,
    /// True while the slot is in the listen state.
    pub listening: bool,
    /// Connectors waiting for accept; only the first `backlog_size`
    /// entries are eligible.
    pub backlog: [Option<Minor>; SOMAXCONN],
    /// Effective backlog length, set at listen time and capped at
    /// `SOMAXCONN`.
    pub backlog_size: usize,
    /// Slot pre-reserved by a parked accept for the next connector.
    pub child: Option<Minor>,
    /// Bound name.
    pub addr: Option<UnixAddr>,
    /// Source of the last delivered datagram, surfaced to recvfrom.
    pub source: Option<UnixAddr>,
    /// Destination for the next datagram send.
    pub target: Option<UnixAddr>,
    /// Deferred error delivered once by the next read or write.
    pub err: Option<Error>,
    /// File descriptors staged for the next send; released through the
    /// collaborator if still here at close.
    pub ancillary: Vec<i32>,
    /// Outstanding suspension, if any.
    pub suspended: Option<SuspendKind>,
    /// Replay parameters of the parked request.
    pub parked: ParkedRequest,
    /// Endpoint watching this slot via select.
    pub sel_endpt: Endpoint,
    /// Select operations still unsatisfied and watched.
    pub sel_ops: SelectOps,
}

impl Socket {
    /// Creates a fresh socket with default parameters around an
    /// allocated ring.
    pub(crate) fn new(owner: Endpoint, ring: RingBuffer) -> Self {
        Self {
            owner,
            sock_type: None,
            mode: Mode::RW,
            ring,
            peer: None,
            listening: false,
            backlog: [None; SOMAXCONN],
            backlog_size: SOMAXCONN,
            child: None,
            addr: None,
            source: None,
            target: None,
            err: None,
            ancillary: Vec::new(),
            suspended: None,
            parked: ParkedRequest::IDLE,
            sel_endpt: Endpoint::NONE,
            sel_ops: SelectOps::empty(),
        }
    }

    /// Returns the backlog entries currently eligible for accept.
    pub(crate) fn backlog_slots(&self) -> &[Option<Minor>] {
        &self.backlog[..self.backlog_size]
    }

    /// Returns true if any connector is waiting in the backlog.
    pub(crate) fn has_pending_connection(&self) -> bool {
        self.backlog_slots().iter().any(Option::is_some)
    }
}
