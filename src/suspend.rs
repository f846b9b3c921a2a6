//! Request suspension records.
//!
//! A request that cannot complete parks: the slot records what kind of
//! operation is pending and the parameters needed to replay it, and the
//! entry point returns control to the dispatcher without replying. No
//! stack is captured — replay is a plain call to the data path with the
//! parked arguments, driven from whichever peer event made progress
//! possible.
//!
//! At most one suspension is outstanding per slot. The kind carries no
//! payload; the replay parameters live in the slot's fixed
//! [`ParkedRequest`] record.

use crate::types::{Endpoint, GrantId, RequestId};

/// The kind of operation a slot is suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuspendKind {
    /// A read found its ring empty with a live peer.
    Read,
    /// A write found the target ring full, or a seqpacket still queued.
    Write,
    /// A connect is waiting for the listener side; set by the control
    /// collaborator before its ioctl reports would-block.
    Connect,
    /// An accept is waiting for a connector; set by the control
    /// collaborator before its ioctl reports would-block.
    Accept,
}

/// Parameters of a parked request, kept for replay and cancellation
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkedRequest {
    /// The caller to reply to on completion.
    pub endpt: Endpoint,
    /// The caller's transfer grant.
    pub grant: GrantId,
    /// The requested transfer size (zero for control operations).
    pub size: usize,
    /// Correlation id matched by cancel.
    pub id: RequestId,
}

impl ParkedRequest {
    /// The empty record held by slots with no suspension outstanding.
    pub const IDLE: Self = Self {
        endpt: Endpoint::NONE,
        grant: GrantId::INVALID,
        size: 0,
        id: RequestId::new(0),
    };
}
