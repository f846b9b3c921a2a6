//! Character-device entry points and the suspension protocol.
//!
//! The dispatch harness routes each request to one of the seven entries
//! here: open, close, read, write, ioctl, cancel, select. An entry
//! either completes synchronously — [`Response::Reply`] — or parks the
//! request in the slot and answers [`Response::DontReply`]; the deferred
//! completion is delivered later through the environment's task-reply
//! hook, from whichever peer event (or cancel) resolves it.
//!
//! Non-blocking requests reuse the same shape: park, then immediately
//! self-cancel and convert the reply. This keeps a single code path for
//! suspension and resume.

use crate::control::ControlHandler;
use crate::datapath::Io;
use crate::driver::SocketCore;
use crate::env::DriverEnv;
use crate::error::{Error, Result};
use crate::select::SelectOps;
use crate::suspend::{ParkedRequest, SuspendKind};
use crate::types::{Endpoint, GrantId, Minor, OpFlags, RequestId};

/// What an entry point tells the dispatch harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Reply to the caller now with this result.
    Reply(Result<usize>),
    /// Do not reply yet; the request is parked (or, for cancel, there is
    /// nothing to reply to).
    DontReply,
}

impl SocketCore {
    /// Opens a fresh socket for `user_endpt`.
    ///
    /// Returns the new minor; the harness treats it as a cloned device
    /// and routes the caller's subsequent requests to it. Fails with
    /// [`Error::NoFile`] when the table is exhausted and
    /// [`Error::OutOfMemory`] when the ring cannot be allocated.
    pub fn open(&mut self, user_endpt: Endpoint) -> Result<Minor> {
        let minor = self.table.allocate(user_endpt)?;
        tracing::trace!(%minor, endpt = user_endpt.raw(), "open");
        Ok(minor)
    }

    /// Closes a socket, detaching it from the connection graph.
    ///
    /// A connected peer is reset (it will observe
    /// [`ConnectionReset`](Error::ConnectionReset) exactly once). A
    /// pending connector is scrubbed from its listener's backlog. A
    /// closing listener resets every connector still queued. Staged
    /// descriptors are released through the environment, the ring is
    /// freed, and the slot returns to the free state.
    pub fn close(&mut self, env: &mut dyn DriverEnv, minor: Minor) -> Result<()> {
        tracing::trace!(%minor, "close");
        let peer = self.table.get(minor)?.peer;

        match peer {
            Some(peer) if self.table.get(peer)?.peer.is_none() => {
                // Still connecting: remove ourselves from the listener's
                // backlog.
                let listener = self.table.get_mut(peer)?;
                assert!(
                    listener.listening,
                    "connector attached to a non-listening slot"
                );
                if let Some(entry) = listener
                    .backlog
                    .iter_mut()
                    .find(|entry| **entry == Some(minor))
                {
                    *entry = None;
                }
            }
            Some(peer) => {
                self.reset(env, peer);
            }
            None if self.table.get(minor)?.listening => {
                let pending: Vec<Minor> = self.backlog_of(minor)?;
                for connector in pending {
                    self.reset(env, connector);
                }
            }
            None => {}
        }

        let staged = std::mem::take(&mut self.table.get_mut(minor)?.ancillary);
        if !staged.is_empty() {
            env.release_fds(minor, &staged);
        }

        self.table.release(minor);

        if self.exit_left > 0 {
            self.exit_left -= 1;
            if self.exit_left == 0 {
                env.terminate();
            }
        }
        Ok(())
    }

    /// Reads up to `size` bytes for the caller, parking when the ring is
    /// empty with a live peer.
    pub fn read(
        &mut self,
        env: &mut dyn DriverEnv,
        minor: Minor,
        endpt: Endpoint,
        grant: GrantId,
        size: usize,
        flags: OpFlags,
        id: RequestId,
    ) -> Response {
        tracing::trace!(%minor, size, "read");
        if let Err(e) = self.table.get(minor) {
            return Response::Reply(Err(e));
        }

        match self.perform_read(env, minor, endpt, grant, size, false) {
            Ok(Io::Done(n)) => Response::Reply(Ok(n)),
            Err(e) => Response::Reply(Err(e)),
            Ok(Io::WouldBlock) => {
                self.park(minor, SuspendKind::Read, endpt, grant, size, id);
                if flags.nonblocking() {
                    let _ = self.cancel(minor, endpt, id);
                    Response::Reply(Err(Error::Again))
                } else {
                    Response::DontReply
                }
            }
        }
    }

    /// Writes up to `size` bytes from the caller, parking when the
    /// recipient's ring is full or a seqpacket is still queued.
    pub fn write(
        &mut self,
        env: &mut dyn DriverEnv,
        minor: Minor,
        endpt: Endpoint,
        grant: GrantId,
        size: usize,
        flags: OpFlags,
        id: RequestId,
    ) -> Response {
        tracing::trace!(%minor, size, "write");
        if let Err(e) = self.table.get(minor) {
            return Response::Reply(Err(e));
        }

        match self.perform_write(env, minor, endpt, grant, size, false) {
            Ok(Io::Done(n)) => Response::Reply(Ok(n)),
            Err(e) => Response::Reply(Err(e)),
            Ok(Io::WouldBlock) => {
                self.park(minor, SuspendKind::Write, endpt, grant, size, id);
                if flags.nonblocking() {
                    let _ = self.cancel(minor, endpt, id);
                    Response::Reply(Err(Error::Again))
                } else {
                    Response::DontReply
                }
            }
        }
    }

    /// Forwards a control request to the handler, mediating suspension
    /// on its behalf.
    ///
    /// The owner endpoint is re-recorded on every control request. If
    /// the handler reports would-block it must already have pre-set the
    /// suspension kind; a parked connect converted by `NONBLOCK` replies
    /// [`InProgress`](Error::InProgress) (the connection itself keeps
    /// going), anything else [`Again`](Error::Again).
    #[allow(clippy::too_many_arguments)]
    pub fn ioctl(
        &mut self,
        env: &mut dyn DriverEnv,
        ctl: &mut dyn ControlHandler,
        minor: Minor,
        request: u64,
        endpt: Endpoint,
        grant: GrantId,
        flags: OpFlags,
        user_endpt: Endpoint,
        id: RequestId,
    ) -> Response {
        tracing::trace!(%minor, request, "ioctl");
        match self.table.get_mut(minor) {
            Ok(sock) => sock.owner = user_endpt,
            Err(e) => return Response::Reply(Err(e)),
        }

        match ctl.ioctl(self, env, minor, request, endpt, grant) {
            Ok(Io::Done(n)) => Response::Reply(Ok(n)),
            Err(e) => Response::Reply(Err(e)),
            Ok(Io::WouldBlock) => {
                let sock = self.table.get_mut(minor).expect("validated above");
                let Some(kind) = sock.suspended else {
                    panic!("control handler reported would-block without suspending");
                };
                sock.parked = ParkedRequest {
                    endpt,
                    grant,
                    size: 0,
                    id,
                };

                if flags.nonblocking() {
                    let _ = self.cancel(minor, endpt, id);
                    let converted = if kind == SuspendKind::Connect {
                        Error::InProgress
                    } else {
                        Error::Again
                    };
                    Response::Reply(Err(converted))
                } else {
                    Response::DontReply
                }
            }
        }
    }

    /// Cancels an in-flight parked request.
    ///
    /// The endpoint and request id must match the parked record;
    /// mismatches are a benign race with natural completion and are
    /// ignored. A matched cancel replies
    /// [`Interrupted`](Error::Interrupted) to the original request. A
    /// cancelled accept gives back its reserved child slot; a cancelled
    /// connect keeps going asynchronously — only the call unblocks.
    pub fn cancel(&mut self, minor: Minor, endpt: Endpoint, id: RequestId) -> Response {
        tracing::trace!(%minor, "cancel");
        let Ok(sock) = self.table.get(minor) else {
            tracing::warn!(%minor, "cancel request for a closed minor");
            return Response::DontReply;
        };

        let Some(kind) = sock.suspended else {
            return Response::DontReply;
        };
        if sock.parked.endpt != endpt || sock.parked.id != id {
            // The request already completed and this cancel lost the
            // race.
            return Response::DontReply;
        }

        match kind {
            SuspendKind::Accept => {
                // A partial accept only reserved us as somebody's child;
                // give the reservation back.
                for (_, sock) in self.table.iter_in_use_mut() {
                    if sock.child == Some(minor) {
                        sock.child = None;
                    }
                }
            }
            SuspendKind::Connect | SuspendKind::Read | SuspendKind::Write => {}
        }

        self.table
            .get_mut(minor)
            .expect("validated above")
            .suspended = None;
        Response::Reply(Err(Error::Interrupted))
    }

    /// Computes which of the requested operations are satisfiable now.
    ///
    /// Readiness is probed with pretend one-byte transfers: a readable
    /// socket has data, a pending connection (listeners), EOF or a
    /// deferred error; a writable one would move at least one byte or
    /// fail immediately. With [`SelectOps::NOTIFY`] set, the
    /// unsatisfied remainder is watched and reported later by the data
    /// path or by reset, each notification clearing the bits it
    /// delivers.
    pub fn select(
        &mut self,
        env: &mut dyn DriverEnv,
        minor: Minor,
        ops: SelectOps,
        endpt: Endpoint,
    ) -> Result<SelectOps> {
        tracing::trace!(%minor, ?ops, "select");
        self.table.get(minor)?;

        let wanted = ops.requested();
        let mut ready = SelectOps::empty();

        if wanted.contains(SelectOps::READ) {
            let probe = self.perform_read(env, minor, Endpoint::NONE, GrantId::INVALID, 1, true);
            let listening = self.table.get(minor)?.listening;
            match probe {
                Ok(Io::Done(n)) if n > 0 => ready |= SelectOps::READ,
                _ if listening => {
                    if self.table.get(minor)?.has_pending_connection() {
                        ready |= SelectOps::READ;
                    }
                }
                Ok(Io::WouldBlock) => {}
                // EOF or a pending error: the real read delivers it.
                Ok(Io::Done(_)) | Err(_) => ready |= SelectOps::READ,
            }
        }

        if wanted.contains(SelectOps::WRITE) {
            match self.perform_write(env, minor, Endpoint::NONE, GrantId::INVALID, 1, true) {
                Ok(Io::WouldBlock) | Ok(Io::Done(0)) => {}
                Ok(Io::Done(_)) | Err(_) => ready |= SelectOps::WRITE,
            }
        }

        let remaining = wanted.difference(ready);
        if ops.notify() && !remaining.is_empty() {
            let sock = self.table.get_mut(minor)?;
            sock.sel_endpt = endpt;
            sock.sel_ops |= remaining;
        }

        Ok(ready)
    }

    /// Replays the parked request on `minor` after a peer event.
    ///
    /// A replayed read or write that still cannot progress stays parked.
    /// Parked connect and accept requests were already wired by the
    /// control side; their reply is the slot's deferred error, taken so
    /// it is delivered once, or success. Completion goes out through the
    /// environment's task-reply hook and clears the suspension.
    ///
    /// # Panics
    ///
    /// Panics if the slot has no suspension outstanding.
    pub(crate) fn unsuspend(&mut self, env: &mut dyn DriverEnv, minor: Minor) {
        let sock = self.table.get(minor).expect("unsuspend on a free slot");
        let kind = sock.suspended.expect("unsuspend without a suspension");
        let parked = sock.parked;

        let result: Result<usize> = match kind {
            SuspendKind::Read => {
                match self.perform_read(env, minor, parked.endpt, parked.grant, parked.size, false)
                {
                    Ok(Io::WouldBlock) => return,
                    Ok(Io::Done(n)) => Ok(n),
                    Err(e) => Err(e),
                }
            }
            SuspendKind::Write => {
                match self.perform_write(env, minor, parked.endpt, parked.grant, parked.size, false)
                {
                    Ok(Io::WouldBlock) => return,
                    Ok(Io::Done(n)) => Ok(n),
                    Err(e) => Err(e),
                }
            }
            SuspendKind::Connect | SuspendKind::Accept => {
                // The control side already wired the pair; just unblock.
                match self.table.get_mut(minor).expect("validated above").err.take() {
                    Some(e) => Err(e),
                    None => Ok(0),
                }
            }
        };

        tracing::debug!(%minor, ?kind, ?result, "reviving parked request");
        env.task_reply(parked.endpt, parked.id, result);
        self.table
            .get_mut(minor)
            .expect("validated above")
            .suspended = None;
    }

    /// Tears down one side of a connection.
    ///
    /// The slot loses its peer, is armed to deliver
    /// [`ConnectionReset`](Error::ConnectionReset) exactly once, has any
    /// parked request revived (the replay surfaces the reset), and a
    /// pending select watch is flushed with the recorded mask.
    pub(crate) fn reset(&mut self, env: &mut dyn DriverEnv, minor: Minor) {
        tracing::debug!(%minor, "reset");
        let sock = self.table.get_mut(minor).expect("reset on a free slot");
        sock.peer = None;
        sock.err = Some(Error::ConnectionReset);

        if sock.suspended.is_some() {
            self.unsuspend(env, minor);
        }

        let sock = self.table.get_mut(minor).expect("validated above");
        if !sock.sel_ops.is_empty() {
            let watcher = sock.sel_endpt;
            let ops = sock.sel_ops;
            sock.sel_ops = SelectOps::empty();
            env.select_reply(watcher, minor, ops);
        }
    }

    fn park(
        &mut self,
        minor: Minor,
        kind: SuspendKind,
        endpt: Endpoint,
        grant: GrantId,
        size: usize,
        id: RequestId,
    ) {
        let sock = self.table.get_mut(minor).expect("parking a free slot");
        debug_assert!(sock.suspended.is_none(), "slot already suspended");
        sock.suspended = Some(kind);
        sock.parked = ParkedRequest {
            endpt,
            grant,
            size,
            id,
        };
    }
}
