//! The read/write data path.
//!
//! `perform_read` and `perform_write` are the state machine that ties a
//! socket to its peer: they enforce the per-type semantics, move bytes
//! between rings and caller grants, and wake whatever the transfer
//! unblocked — a parked peer request, a select watcher, or both. Wakeups
//! fire from inside the same call that made the condition true, so a
//! writer always sees its reader revived before it returns.
//!
//! Both functions take a `pretend` flag: report what would happen, touch
//! nothing, copy nothing. Select readiness is computed with pretend
//! probes of one byte.

use crate::config::BUF_CAP;
use crate::driver::SocketCore;
use crate::env::DriverEnv;
use crate::error::{Error, Result};
use crate::select::SelectOps;
use crate::suspend::SuspendKind;
use crate::types::{Endpoint, GrantId, Minor, Mode, SockType};

/// Outcome of a data-path or control operation that completed without
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Io {
    /// The operation finished, transferring this many bytes.
    Done(usize),
    /// The operation cannot make progress yet; the caller decides
    /// whether to park the request or convert to a non-blocking error.
    WouldBlock,
}

impl SocketCore {
    /// Reads up to `n` bytes from the socket's ring into the caller's
    /// grant.
    ///
    /// With `pretend` set, reports the outcome without consuming the
    /// deferred error, moving bytes or waking anyone.
    ///
    /// After a reset has delivered its one-shot
    /// [`ConnectionReset`](Error::ConnectionReset), a disconnected
    /// stream or seqpacket read yields
    /// [`NotConnected`](Error::NotConnected), not EOF.
    pub(crate) fn perform_read(
        &mut self,
        env: &mut dyn DriverEnv,
        minor: Minor,
        endpt: Endpoint,
        grant: GrantId,
        n: usize,
        pretend: bool,
    ) -> Result<Io> {
        if n == 0 {
            return Ok(Io::Done(0));
        }

        let (mode, buffered, peer, sock_type, err) = {
            let sock = self.table.get(minor)?;
            (
                sock.mode,
                sock.ring.len(),
                sock.peer,
                sock.sock_type,
                sock.err,
            )
        };

        if !mode.contains(Mode::R) {
            return Err(Error::BrokenPipe);
        }

        if buffered == 0 {
            if peer.is_none() {
                // Connectionless sockets just wait for a datagram; the
                // connection-oriented ones report their state.
                if sock_type.is_some_and(SockType::is_connection_oriented) {
                    if err == Some(Error::ConnectionReset) {
                        if !pretend {
                            self.table.get_mut(minor)?.err = None;
                        }
                        return Err(Error::ConnectionReset);
                    }
                    return Err(Error::NotConnected);
                }
            }

            if let Some(peer) = peer {
                // EOF on a pipe whose writer has shut down.
                if !self.table.get(peer)?.mode.contains(Mode::W) {
                    return Ok(Io::Done(0));
                }
            }

            if pretend {
                return Ok(Io::WouldBlock);
            }

            if let Some(peer) = peer {
                assert!(
                    self.table.get(peer)?.suspended != Some(SuspendKind::Write),
                    "writer parked on an empty ring"
                );
            }

            tracing::debug!(%minor, "suspending read request");
            return Ok(Io::WouldBlock);
        }

        let n = n.min(buffered);
        if pretend {
            return Ok(Io::Done(n));
        }

        let n = self
            .table
            .get_mut(minor)?
            .ring
            .drain_to_grant(env, endpt, grant, n)?;

        if let Some(peer) = peer {
            // The drain may have unblocked a parked writer...
            if self.table.get(peer)?.suspended == Some(SuspendKind::Write) {
                self.unsuspend(env, peer);
            }

            // ...and may have satisfied a select watch on the peer.
            let room = !self.table.get(minor)?.ring.is_full();
            let peer_sock = self.table.get_mut(peer)?;
            if room && peer_sock.sel_ops.contains(SelectOps::WRITE) {
                let watcher = peer_sock.sel_endpt;
                peer_sock.sel_ops.remove(SelectOps::WRITE);
                env.select_reply(watcher, peer, SelectOps::WRITE);
            }
        }

        Ok(Io::Done(n))
    }

    /// Writes up to `n` bytes from the caller's grant into the
    /// recipient's ring.
    ///
    /// The recipient is the connected peer for stream and seqpacket
    /// sockets, or the first datagram socket bound to the send target
    /// (table order, first match wins) otherwise.
    ///
    /// Datagram boundary rule: one datagram per destination. If the
    /// recipient already holds an unread datagram, the new one is
    /// silently discarded and the write still reports full success —
    /// there is no queueing and no error. Callers that need delivery
    /// confirmation must get it from the receiver.
    pub(crate) fn perform_write(
        &mut self,
        env: &mut dyn DriverEnv,
        minor: Minor,
        endpt: Endpoint,
        grant: GrantId,
        n: usize,
        pretend: bool,
    ) -> Result<Io> {
        if n == 0 {
            return Ok(Io::Done(0));
        }

        let (mode, sock_type, err, peer, own_addr, send_target) = {
            let sock = self.table.get(minor)?;
            (
                sock.mode,
                sock.sock_type,
                sock.err,
                sock.peer,
                sock.addr.clone(),
                sock.target.clone(),
            )
        };

        if !mode.contains(Mode::W) {
            return Err(Error::BrokenPipe);
        }

        // Datagrams and seqpackets are atomic: the payload must fit in
        // one ring.
        if n > BUF_CAP && sock_type != Some(SockType::Stream) {
            return Err(Error::MessageSize);
        }

        let target = if sock_type.is_some_and(SockType::is_connection_oriented) {
            match peer {
                None => {
                    if err == Some(Error::ConnectionReset) {
                        if !pretend {
                            self.table.get_mut(minor)?.err = None;
                        }
                        return Err(Error::ConnectionReset);
                    }
                    return Err(Error::NotConnected);
                }
                Some(peer) => {
                    // Half-linked means the connect has not been accepted
                    // yet; writes wait for the control side to finish.
                    if self.table.get(peer)?.peer.is_none() {
                        return Ok(Io::WouldBlock);
                    }
                    peer
                }
            }
        } else {
            let Some(wanted) = send_target else {
                return Err(Error::NoEntry);
            };
            self.table
                .iter_in_use()
                .find(|(_, sock)| {
                    sock.sock_type == Some(SockType::Dgram)
                        && sock.addr.as_ref().is_some_and(|a| a.matches(&wanted))
                })
                .map(|(m, _)| m)
                .ok_or(Error::NoEntry)?
        };

        if !self.table.get(target)?.mode.contains(Mode::R) {
            return Err(Error::BrokenPipe);
        }

        let queued = self.table.get(target)?.ring.len();

        // Datagram boundary rule: one datagram per destination; the
        // overflowing one is dropped, not blocked on.
        if sock_type == Some(SockType::Dgram) && queued > 0 {
            tracing::debug!(%minor, %target, "datagram destination busy, discarding");
            return Ok(Io::Done(n));
        }

        if queued == BUF_CAP || (sock_type == Some(SockType::Seqpacket) && queued > 0) {
            if pretend {
                return Ok(Io::WouldBlock);
            }

            assert!(
                self.table.get(target)?.suspended != Some(SuspendKind::Read),
                "reader parked on a full ring"
            );

            tracing::debug!(%minor, %target, "suspending write request");
            return Ok(Io::WouldBlock);
        }

        let n = n.min(BUF_CAP - queued);
        if pretend {
            return Ok(Io::Done(n));
        }

        let n = self
            .table
            .get_mut(target)?
            .ring
            .fill_from_grant(env, endpt, grant, n)?;

        // Stamp the sender's bound name so the receiver's recvfrom sees
        // where the datagram came from.
        if sock_type == Some(SockType::Dgram) {
            self.table.get_mut(target)?.source = own_addr;
        }

        if self.table.get(target)?.suspended == Some(SuspendKind::Read) {
            self.unsuspend(env, target);
        }

        let target_sock = self.table.get_mut(target)?;
        if !target_sock.ring.is_empty() && target_sock.sel_ops.contains(SelectOps::READ) {
            let watcher = target_sock.sel_endpt;
            target_sock.sel_ops.remove(SelectOps::READ);
            env.select_reply(watcher, target, SelectOps::READ);
        }

        Ok(Io::Done(n))
    }
}
