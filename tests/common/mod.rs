#![allow(dead_code)]
//! Shared scenario harness.
//!
//! Stands a [`SocketCore`] next to the in-memory [`TestEnv`] and a
//! minimal control collaborator, [`TestControl`], that implements bind,
//! listen, connect, accept, sendto targeting and shutdown purely on the
//! public hook surface — the same way the real control decoder would.
//! The wire format is the harness's own (one staged command per ioctl);
//! the core never sees it.

use udsock::test_utils::TestEnv;
use udsock::{
    ControlHandler, DriverEnv, Endpoint, Error, GrantId, Io, Minor, Mode, OpFlags, RequestId,
    Response, Result, SockType, SocketCore, SuspendKind, UnixAddr,
};

/// One decoded control request.
#[derive(Debug, Clone)]
pub enum Cmd {
    /// Assign the socket type.
    SetType(SockType),
    /// Bind to a name.
    Bind(UnixAddr),
    /// Enter the listen state with a backlog length.
    Listen(usize),
    /// Connect to a bound listener.
    Connect(UnixAddr),
    /// Accept onto this (fresh) socket from the given listener.
    Accept(Minor),
    /// Set the datagram send destination.
    SetTarget(UnixAddr),
    /// Shut down the given halves.
    Shutdown(Mode),
}

/// Minimal control decoder used by the scenarios.
///
/// Commands are staged out of band; the ioctl request word is unused,
/// which is exactly the point — the core forwards it opaquely.
#[derive(Debug, Default)]
pub struct TestControl {
    pending: Option<Cmd>,
}

impl TestControl {
    fn find_listener(
        core: &SocketCore,
        addr: &UnixAddr,
        sock_type: Option<SockType>,
    ) -> Option<Minor> {
        (1..udsock::NR_SOCKS as u32)
            .map(Minor::new)
            .filter(|m| core.is_open(*m))
            .find(|m| {
                core.is_listening(*m).unwrap_or(false)
                    && core.sock_type(*m).ok().flatten() == sock_type
                    && core
                        .addr_of(*m)
                        .ok()
                        .flatten()
                        .is_some_and(|a| a.matches(addr))
            })
    }
}

impl ControlHandler for TestControl {
    fn ioctl(
        &mut self,
        core: &mut SocketCore,
        env: &mut dyn DriverEnv,
        minor: Minor,
        _request: u64,
        _endpt: Endpoint,
        _grant: GrantId,
    ) -> Result<Io> {
        match self.pending.take().expect("no control command staged") {
            Cmd::SetType(t) => {
                core.set_sock_type(minor, t)?;
                Ok(Io::Done(0))
            }
            Cmd::Bind(addr) => {
                core.bind_addr(minor, addr)?;
                Ok(Io::Done(0))
            }
            Cmd::Listen(backlog) => {
                core.set_listening(minor, backlog)?;
                Ok(Io::Done(0))
            }
            Cmd::SetTarget(addr) => {
                core.set_target(minor, addr)?;
                Ok(Io::Done(0))
            }
            Cmd::Shutdown(halves) => {
                core.clear_mode(minor, halves)?;
                // A peer blocked on us may now complete (EOF or EPIPE).
                if let Some(peer) = core.peer_of(minor)? {
                    core.wake(env, peer)?;
                }
                Ok(Io::Done(0))
            }
            Cmd::Connect(addr) => {
                let sock_type = core.sock_type(minor)?;
                let listener =
                    Self::find_listener(core, &addr, sock_type).ok_or(Error::NoEntry)?;

                if let Some(child) = core.child_of(listener)? {
                    // The server is already parked on accept with a
                    // reserved slot: finish the handshake now.
                    core.link_peers(minor, child)?;
                    if let Some(t) = sock_type {
                        core.set_sock_type(child, t)?;
                    }
                    core.clear_child(listener)?;
                    core.wake(env, child)?;
                    Ok(Io::Done(0))
                } else {
                    if !core.push_backlog(listener, minor)? {
                        return Err(Error::Again);
                    }
                    core.set_peer(minor, Some(listener))?;
                    core.mark_suspended(minor, SuspendKind::Connect)?;
                    Ok(Io::WouldBlock)
                }
            }
            Cmd::Accept(listener) => {
                if let Some(client) = core.pop_backlog(listener)? {
                    core.link_peers(client, minor)?;
                    if let Some(t) = core.sock_type(listener)? {
                        core.set_sock_type(minor, t)?;
                    }
                    core.wake(env, client)?;
                    Ok(Io::Done(0))
                } else {
                    core.reserve_child(listener, minor)?;
                    core.mark_suspended(minor, SuspendKind::Accept)?;
                    Ok(Io::WouldBlock)
                }
            }
        }
    }
}

/// A completed entry-point call with the pieces assertions need.
#[derive(Debug)]
pub struct Call {
    pub response: Response,
    pub grant: GrantId,
    pub id: RequestId,
}

/// Everything a scenario needs in one place.
pub struct Harness {
    pub core: SocketCore,
    pub env: TestEnv,
    pub ctl: TestControl,
    next_id: u64,
}

impl Harness {
    pub fn new() -> Self {
        udsock::test_utils::init_test_logging();
        Self {
            core: SocketCore::new(),
            env: TestEnv::new(),
            ctl: TestControl::default(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn caller(&self, minor: Minor) -> Endpoint {
        self.core.owner_of(minor).expect("socket is open")
    }

    /// Opens a raw socket for an endpoint.
    pub fn open(&mut self, endpt: u32) -> Minor {
        self.core.open(Endpoint::new(endpt)).expect("open")
    }

    /// Opens a socket and assigns its type via the control path.
    pub fn socket(&mut self, endpt: u32, sock_type: SockType) -> Minor {
        let minor = self.open(endpt);
        let r = self.ioctl(minor, Cmd::SetType(sock_type));
        assert_eq!(r.response, Response::Reply(Ok(0)));
        minor
    }

    /// Issues a control command, blocking flavor.
    pub fn ioctl(&mut self, minor: Minor, cmd: Cmd) -> Call {
        self.ioctl_flags(minor, cmd, OpFlags::NONE)
    }

    /// Issues a control command with `NONBLOCK` set.
    pub fn ioctl_nb(&mut self, minor: Minor, cmd: Cmd) -> Call {
        self.ioctl_flags(minor, cmd, OpFlags::NONBLOCK)
    }

    fn ioctl_flags(&mut self, minor: Minor, cmd: Cmd, flags: OpFlags) -> Call {
        let id = self.next_id();
        let endpt = self.caller(minor);
        self.ctl.pending = Some(cmd);
        let response = self.core.ioctl(
            &mut self.env,
            &mut self.ctl,
            minor,
            0,
            endpt,
            GrantId::INVALID,
            flags,
            endpt,
            id,
        );
        Call {
            response,
            grant: GrantId::INVALID,
            id,
        }
    }

    pub fn bind(&mut self, minor: Minor, path: &str) {
        let r = self.ioctl(minor, Cmd::Bind(UnixAddr::new(path)));
        assert_eq!(r.response, Response::Reply(Ok(0)));
    }

    pub fn listen(&mut self, minor: Minor, backlog: usize) {
        let r = self.ioctl(minor, Cmd::Listen(backlog));
        assert_eq!(r.response, Response::Reply(Ok(0)));
    }

    pub fn connect(&mut self, minor: Minor, path: &str) -> Call {
        self.ioctl(minor, Cmd::Connect(UnixAddr::new(path)))
    }

    pub fn connect_nb(&mut self, minor: Minor, path: &str) -> Call {
        self.ioctl_nb(minor, Cmd::Connect(UnixAddr::new(path)))
    }

    pub fn accept(&mut self, child: Minor, listener: Minor) -> Call {
        self.ioctl(child, Cmd::Accept(listener))
    }

    pub fn set_target(&mut self, minor: Minor, path: &str) {
        let r = self.ioctl(minor, Cmd::SetTarget(UnixAddr::new(path)));
        assert_eq!(r.response, Response::Reply(Ok(0)));
    }

    pub fn shutdown(&mut self, minor: Minor, halves: Mode) {
        let r = self.ioctl(minor, Cmd::Shutdown(halves));
        assert_eq!(r.response, Response::Reply(Ok(0)));
    }

    /// Issues a read of `n` bytes.
    pub fn read(&mut self, minor: Minor, n: usize) -> Call {
        self.read_flags(minor, n, OpFlags::NONE)
    }

    /// Issues a non-blocking read of `n` bytes.
    pub fn read_nb(&mut self, minor: Minor, n: usize) -> Call {
        self.read_flags(minor, n, OpFlags::NONBLOCK)
    }

    fn read_flags(&mut self, minor: Minor, n: usize, flags: OpFlags) -> Call {
        let id = self.next_id();
        let endpt = self.caller(minor);
        let grant = self.env.grant_buffer(n);
        let response = self
            .core
            .read(&mut self.env, minor, endpt, grant, n, flags, id);
        Call {
            response,
            grant,
            id,
        }
    }

    /// Issues a write of `bytes`.
    pub fn write(&mut self, minor: Minor, bytes: &[u8]) -> Call {
        self.write_flags(minor, bytes, OpFlags::NONE)
    }

    /// Issues a non-blocking write of `bytes`.
    pub fn write_nb(&mut self, minor: Minor, bytes: &[u8]) -> Call {
        self.write_flags(minor, bytes, OpFlags::NONBLOCK)
    }

    fn write_flags(&mut self, minor: Minor, bytes: &[u8], flags: OpFlags) -> Call {
        let id = self.next_id();
        let endpt = self.caller(minor);
        let grant = self.env.grant_bytes(bytes);
        let response =
            self.core
                .write(&mut self.env, minor, endpt, grant, bytes.len(), flags, id);
        Call {
            response,
            grant,
            id,
        }
    }

    pub fn close(&mut self, minor: Minor) {
        self.core.close(&mut self.env, minor).expect("close");
    }

    /// Returns the first `n` bytes a completed read left in its grant.
    pub fn read_data(&self, call: &Call, n: usize) -> Vec<u8> {
        self.env.grant_data(call.grant)[..n].to_vec()
    }

    /// Builds a connected pair through the full control handshake,
    /// returning `(client, server_side)`. The listener is closed once
    /// the pair stands.
    pub fn connected_pair(&mut self, path: &str, sock_type: SockType) -> (Minor, Minor) {
        let listener = self.socket(1, sock_type);
        self.bind(listener, path);
        self.listen(listener, 8);

        let client = self.socket(2, sock_type);
        let connect = self.connect(client, path);
        assert_eq!(connect.response, Response::DontReply);

        let server = self.open(1);
        let accept = self.accept(server, listener);
        assert_eq!(accept.response, Response::Reply(Ok(0)));

        // The parked connect completed from inside the accept.
        let (endpt, id, result) = self.env.task_replies.pop().expect("connect reply");
        assert_eq!(endpt, self.caller(client));
        assert_eq!(id, connect.id);
        assert_eq!(result, Ok(0));

        self.close(listener);
        (client, server)
    }
}
