//! Udsock: single-threaded UNIX-domain-socket IPC core.
//!
//! # Overview
//!
//! Udsock is the engine behind a character-device socket service: a
//! fixed table of socket slots multiplexing stream, seqpacket and
//! datagram traffic over per-socket ring buffers. It is built on the
//! principle that suspension should be structural, not conventional: a
//! request that cannot progress becomes a record in its slot, replayed
//! by the peer event that unblocks it — never a captured stack, never a
//! second thread.
//!
//! # Core Guarantees
//!
//! - **Single-threaded by contract**: one request at a time; all shared
//!   state lives in the table and is serialised by dispatch
//! - **FIFO delivery**: bytes written on one side of a pair drain in
//!   order on the other; seqpacket boundaries are preserved by refusing
//!   to fill a non-empty ring
//! - **One-shot reset**: tearing down a pair arms `ConnectionReset` on
//!   the survivor exactly once
//! - **Wakeups before return**: the call that makes a condition true
//!   delivers the parked reply and the select notification itself
//! - **POSIX-ish surface**: broken pipes, message-size limits,
//!   non-blocking semantics and cancellation behave the way socket code
//!   expects
//!
//! # Module Structure
//!
//! - [`config`]: build-time constants
//! - [`error`]: typed driver errors
//! - [`types`]: identifiers, socket types and flag bitsets
//! - [`addr`]: UNIX-domain names and datagram matching
//! - [`select`]: readiness operations
//! - [`suspend`]: parked-request records
//! - [`env`]: the collaborator seam to the dispatch harness
//! - [`control`]: the control-plane seam and its hook surface
//! - [`driver`]: the socket core and its introspection views
//! - [`datapath`]: the read/write state machine
//! - [`dispatch`]: character-device entry points
//! - [`test_utils`]: logging setup and the in-memory harness

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod addr;
pub mod config;
pub mod control;
pub mod datapath;
pub mod dispatch;
pub mod driver;
pub mod env;
pub mod error;
mod ring;
pub mod select;
mod slot;
pub mod suspend;
mod table;
pub mod test_utils;
pub mod types;

// Re-exports for convenient access to the driver surface
pub use addr::UnixAddr;
pub use config::{BUF_CAP, NR_SOCKS, OPEN_MAX, PATH_MAX, SOMAXCONN};
pub use control::ControlHandler;
pub use driver::SocketCore;
pub use datapath::Io;
pub use dispatch::Response;
pub use env::DriverEnv;
pub use error::{Error, Result};
pub use select::SelectOps;
pub use suspend::{ParkedRequest, SuspendKind};
pub use types::{Endpoint, GrantId, Minor, Mode, OpFlags, RequestId, SockType};
