//! The socket core.
//!
//! [`SocketCore`] owns the socket table and the termination countdown.
//! It is single-threaded by contract: the dispatch harness hands it one
//! request at a time, and every suspension is a record in a slot, never
//! a captured stack. The entry points live in [`dispatch`](crate::dispatch),
//! the byte-moving state machine in [`datapath`](crate::datapath), and
//! the hook surface for the control collaborator in
//! [`control`](crate::control).

use crate::addr::UnixAddr;
use crate::env::DriverEnv;
use crate::error::Result;
use crate::select::SelectOps;
use crate::suspend::SuspendKind;
use crate::table::SocketTable;
use crate::types::{Endpoint, Minor, Mode, SockType};

/// The process-wide state of the UNIX-domain-socket driver.
#[derive(Debug)]
pub struct SocketCore {
    pub(crate) table: SocketTable,
    /// Sockets left to close before termination; zero while no shutdown
    /// is in progress.
    pub(crate) exit_left: u32,
}

impl SocketCore {
    /// Creates a core with every slot free.
    ///
    /// The harness calls this exactly once at startup; tests build a
    /// fresh core per case.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: SocketTable::new(),
            exit_left: 0,
        }
    }

    /// Begins driver shutdown, typically on SIGTERM.
    ///
    /// Counts the open sockets into the exit countdown; each close
    /// decrements it, and the last one triggers the environment's
    /// terminate hook. With no socket open, termination is immediate.
    /// Signals other than the termination request are the harness's
    /// business and never reach the core.
    pub fn request_exit(&mut self, env: &mut dyn DriverEnv) {
        let open = self.table.open_count() as u32;
        tracing::debug!(open, "exit requested");
        if open == 0 {
            env.terminate();
        } else {
            self.exit_left = open;
        }
    }

    // --- Introspection -------------------------------------------------
    //
    // Read-only views used by the control collaborator and by tests.
    // Each validates the minor the same way the entry points do.

    /// Returns true if `minor` names an open socket.
    #[must_use]
    pub fn is_open(&self, minor: Minor) -> bool {
        self.table.is_in_use(minor)
    }

    /// Returns the number of open sockets.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.table.open_count()
    }

    /// Returns the socket's communication style, if assigned.
    pub fn sock_type(&self, minor: Minor) -> Result<Option<SockType>> {
        Ok(self.table.get(minor)?.sock_type)
    }

    /// Returns the halves not yet shut down.
    pub fn mode_of(&self, minor: Minor) -> Result<Mode> {
        Ok(self.table.get(minor)?.mode)
    }

    /// Returns the owning endpoint.
    pub fn owner_of(&self, minor: Minor) -> Result<Endpoint> {
        Ok(self.table.get(minor)?.owner)
    }

    /// Returns the connected or connecting peer.
    pub fn peer_of(&self, minor: Minor) -> Result<Option<Minor>> {
        Ok(self.table.get(minor)?.peer)
    }

    /// Returns the bound name, if any.
    pub fn addr_of(&self, minor: Minor) -> Result<Option<&UnixAddr>> {
        Ok(self.table.get(minor)?.addr.as_ref())
    }

    /// Returns the source of the last delivered datagram.
    pub fn source_of(&self, minor: Minor) -> Result<Option<&UnixAddr>> {
        Ok(self.table.get(minor)?.source.as_ref())
    }

    /// Returns true if the slot is in the listen state.
    pub fn is_listening(&self, minor: Minor) -> Result<bool> {
        Ok(self.table.get(minor)?.listening)
    }

    /// Returns the connectors waiting in the backlog, in queue order.
    pub fn backlog_of(&self, minor: Minor) -> Result<Vec<Minor>> {
        Ok(self
            .table
            .get(minor)?
            .backlog_slots()
            .iter()
            .filter_map(|s| *s)
            .collect())
    }

    /// Returns the slot pre-reserved by a parked accept.
    pub fn child_of(&self, minor: Minor) -> Result<Option<Minor>> {
        Ok(self.table.get(minor)?.child)
    }

    /// Returns the outstanding suspension kind, if any.
    pub fn suspension(&self, minor: Minor) -> Result<Option<SuspendKind>> {
        Ok(self.table.get(minor)?.suspended)
    }

    /// Returns the number of bytes buffered in the socket's ring.
    pub fn buffered(&self, minor: Minor) -> Result<usize> {
        Ok(self.table.get(minor)?.ring.len())
    }

    /// Returns the select operations still watched on the slot.
    pub fn watched_ops(&self, minor: Minor) -> Result<SelectOps> {
        Ok(self.table.get(minor)?.sel_ops)
    }
}

impl Default for SocketCore {
    fn default() -> Self {
        Self::new()
    }
}
