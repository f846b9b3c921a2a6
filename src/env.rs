//! The collaborator seam.
//!
//! The core is strictly single-threaded and never performs I/O of its
//! own. Everything that crosses the driver boundary — bulk byte transfer
//! through caller grants, deferred task replies, select notifications,
//! passed-descriptor cleanup and process termination — goes through one
//! trait the dispatch harness implements. Tests substitute the in-memory
//! [`TestEnv`](crate::test_utils::TestEnv).

use crate::error::Result;
use crate::select::SelectOps;
use crate::types::{Endpoint, GrantId, Minor, RequestId};

/// Services the dispatch harness provides to the core.
///
/// Bulk transfer is the safe-copy primitive: the core never touches
/// caller memory directly, it names an endpoint, a grant and an offset
/// and lets the harness move the bytes. Copy failures are returned
/// verbatim to the caller of the entry point that triggered them.
pub trait DriverEnv {
    /// Copies `src` into the caller's grant window at `offset`.
    fn copy_to_grant(
        &mut self,
        endpt: Endpoint,
        grant: GrantId,
        offset: usize,
        src: &[u8],
    ) -> Result<()>;

    /// Fills `dst` from the caller's grant window at `offset`.
    fn copy_from_grant(
        &mut self,
        endpt: Endpoint,
        grant: GrantId,
        offset: usize,
        dst: &mut [u8],
    ) -> Result<()>;

    /// Delivers the deferred completion of a previously parked request.
    fn task_reply(&mut self, endpt: Endpoint, id: RequestId, result: Result<usize>);

    /// Notifies a select watcher that `ops` became satisfiable on `minor`.
    fn select_reply(&mut self, endpt: Endpoint, minor: Minor, ops: SelectOps);

    /// Releases file descriptors that were staged on a socket now closing.
    fn release_fds(&mut self, minor: Minor, fds: &[i32]);

    /// Ends the driver process; called when the last socket closes during
    /// shutdown.
    fn terminate(&mut self);
}
