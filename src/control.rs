//! The control-plane seam.
//!
//! The core does not interpret control requests: bind, connect, listen,
//! accept, shutdown, socket options and ancillary payloads are decoded
//! by an external collaborator behind [`ControlHandler`]. What the core
//! provides is the hook surface that collaborator builds on — typed
//! mutators for the pieces of slot state the control plane owns, plus
//! the suspension and wakeup mediation it cannot do itself.
//!
//! Every hook validates the minor the same way the entry points do and
//! returns [`InvalidArgument`](Error::InvalidArgument) /
//! [`NoSuchDevice`](Error::NoSuchDevice) accordingly.

use crate::addr::UnixAddr;
use crate::config::{OPEN_MAX, SOMAXCONN};
use crate::datapath::Io;
use crate::driver::SocketCore;
use crate::env::DriverEnv;
use crate::error::{Error, Result};
use crate::suspend::SuspendKind;
use crate::types::{Endpoint, GrantId, Minor, Mode, SockType};

/// Handler for control requests the core does not interpret.
///
/// The core forwards every ioctl to this collaborator, which decodes
/// address binding, name lookup, peer wiring, shutdown and the rest of
/// the control plane using the hook surface on [`SocketCore`]. When a
/// control operation must wait for a counterpart event, the handler
/// pre-sets the suspension kind (`Connect` or `Accept`) via
/// [`SocketCore::mark_suspended`] and returns [`Io::WouldBlock`];
/// returning would-block without a suspension kind set is a bug and
/// panics in the ioctl entry.
pub trait ControlHandler {
    /// Decodes and executes one control request on `minor`.
    fn ioctl(
        &mut self,
        core: &mut SocketCore,
        env: &mut dyn DriverEnv,
        minor: Minor,
        request: u64,
        endpt: Endpoint,
        grant: GrantId,
    ) -> Result<Io>;
}

impl SocketCore {
    /// Assigns the socket's communication style.
    pub fn set_sock_type(&mut self, minor: Minor, sock_type: SockType) -> Result<()> {
        self.table.get_mut(minor)?.sock_type = Some(sock_type);
        Ok(())
    }

    /// Binds the socket to a name.
    pub fn bind_addr(&mut self, minor: Minor, addr: UnixAddr) -> Result<()> {
        self.table.get_mut(minor)?.addr = Some(addr);
        Ok(())
    }

    /// Sets the destination for the next datagram send.
    pub fn set_target(&mut self, minor: Minor, target: UnixAddr) -> Result<()> {
        self.table.get_mut(minor)?.target = Some(target);
        Ok(())
    }

    /// Puts the socket in the listen state with the given backlog
    /// length, capped at [`SOMAXCONN`].
    pub fn set_listening(&mut self, minor: Minor, backlog: usize) -> Result<()> {
        let sock = self.table.get_mut(minor)?;
        sock.listening = true;
        sock.backlog_size = backlog.clamp(1, SOMAXCONN);
        Ok(())
    }

    /// Enqueues a connector on a listener's backlog.
    ///
    /// Returns false when every eligible entry is taken; refusing the
    /// connection is the control side's decision.
    pub fn push_backlog(&mut self, listener: Minor, client: Minor) -> Result<bool> {
        let sock = self.table.get_mut(listener)?;
        let open = sock.backlog[..sock.backlog_size]
            .iter_mut()
            .find(|entry| entry.is_none());
        match open {
            Some(entry) => {
                *entry = Some(client);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dequeues the first waiting connector, if any.
    pub fn pop_backlog(&mut self, listener: Minor) -> Result<Option<Minor>> {
        let sock = self.table.get_mut(listener)?;
        let found = sock.backlog[..sock.backlog_size]
            .iter_mut()
            .find(|entry| entry.is_some());
        Ok(found.and_then(Option::take))
    }

    /// Links two sockets as a connected pair (both directions).
    pub fn link_peers(&mut self, a: Minor, b: Minor) -> Result<()> {
        self.table.get(b)?;
        self.table.get_mut(a)?.peer = Some(b);
        self.table.get_mut(b)?.peer = Some(a);
        Ok(())
    }

    /// Sets one side of a peer link.
    ///
    /// A connecting client points at its listener this way while the
    /// listener still points nowhere.
    pub fn set_peer(&mut self, minor: Minor, peer: Option<Minor>) -> Result<()> {
        if let Some(peer) = peer {
            self.table.get(peer)?;
        }
        self.table.get_mut(minor)?.peer = peer;
        Ok(())
    }

    /// Reserves `child` as the slot a parked accept on it will receive
    /// the next connector through.
    pub fn reserve_child(&mut self, listener: Minor, child: Minor) -> Result<()> {
        self.table.get(child)?;
        self.table.get_mut(listener)?.child = Some(child);
        Ok(())
    }

    /// Drops a listener's child reservation.
    pub fn clear_child(&mut self, listener: Minor) -> Result<()> {
        self.table.get_mut(listener)?.child = None;
        Ok(())
    }

    /// Stages passed file descriptors for the next send.
    ///
    /// At most [`OPEN_MAX`] descriptors fit in the slot.
    pub fn stage_fds(&mut self, minor: Minor, fds: &[i32]) -> Result<()> {
        let sock = self.table.get_mut(minor)?;
        if sock.ancillary.len() + fds.len() > OPEN_MAX {
            return Err(Error::InvalidArgument);
        }
        sock.ancillary.extend_from_slice(fds);
        Ok(())
    }

    /// Takes the staged file descriptors, leaving the slot empty.
    pub fn take_fds(&mut self, minor: Minor) -> Result<Vec<i32>> {
        Ok(std::mem::take(&mut self.table.get_mut(minor)?.ancillary))
    }

    /// Shuts down socket halves by clearing mode bits.
    pub fn clear_mode(&mut self, minor: Minor, halves: Mode) -> Result<()> {
        self.table.get_mut(minor)?.mode.remove(halves);
        Ok(())
    }

    /// Arms a deferred error to be delivered by the next read or write.
    pub fn set_error(&mut self, minor: Minor, err: Error) -> Result<()> {
        self.table.get_mut(minor)?.err = Some(err);
        Ok(())
    }

    /// Pre-sets the suspension kind for a control operation about to
    /// report would-block.
    ///
    /// The ioctl entry fills in the parked parameters afterwards; only
    /// [`Connect`](SuspendKind::Connect) and
    /// [`Accept`](SuspendKind::Accept) make sense here.
    pub fn mark_suspended(&mut self, minor: Minor, kind: SuspendKind) -> Result<()> {
        self.table.get_mut(minor)?.suspended = Some(kind);
        Ok(())
    }

    /// Revives a parked request, if one is outstanding.
    ///
    /// The control side calls this when its wiring completes the event a
    /// counterpart was waiting on (a connect satisfied by an accept, or
    /// the other way around).
    pub fn wake(&mut self, env: &mut dyn DriverEnv, minor: Minor) -> Result<()> {
        if self.table.get(minor)?.suspended.is_some() {
            self.unsuspend(env, minor);
        }
        Ok(())
    }
}
