//! Test utilities.
//!
//! This module provides shared helpers for unit and scenario tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - An in-memory [`TestEnv`] standing in for the dispatch harness
//!
//! # Example
//! ```
//! use udsock::test_utils::{init_test_logging, TestEnv};
//!
//! init_test_logging();
//! let mut env = TestEnv::new();
//! let grant = env.grant_bytes(b"payload");
//! assert_eq!(env.grant_data(grant), b"payload");
//! ```

use crate::env::DriverEnv;
use crate::error::{Error, Result};
use crate::select::SelectOps;
use crate::types::{Endpoint, GrantId, Minor, RequestId};
use std::collections::HashMap;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "==== TEST PHASE: {} ====", $name);
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// A deferred completion recorded by [`TestEnv`].
pub type TaskReply = (Endpoint, RequestId, Result<usize>);

/// In-memory dispatch harness for tests.
///
/// Grants are plain byte buffers: the safe-copy primitive bounds-checks
/// against them and fails with
/// [`InvalidArgument`](crate::Error::InvalidArgument), which doubles as
/// the copy-fault injection mechanism (hand the core a short grant).
/// Replies and notifications are recorded in order for assertions.
#[derive(Debug, Default)]
pub struct TestEnv {
    grants: HashMap<u32, Vec<u8>>,
    next_grant: u32,
    /// Deferred task completions, in delivery order.
    pub task_replies: Vec<TaskReply>,
    /// Select notifications, in delivery order.
    pub select_replies: Vec<(Endpoint, Minor, SelectOps)>,
    /// Descriptors released on close, per socket.
    pub released_fds: Vec<(Minor, Vec<i32>)>,
    /// True once the core asked the process to exit.
    pub terminated: bool,
}

impl TestEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grant pre-filled with `bytes` (a write-side source).
    pub fn grant_bytes(&mut self, bytes: &[u8]) -> GrantId {
        let id = self.next_grant;
        self.next_grant += 1;
        self.grants.insert(id, bytes.to_vec());
        GrantId::new(id)
    }

    /// Creates a zeroed grant of `len` bytes (a read-side destination).
    pub fn grant_buffer(&mut self, len: usize) -> GrantId {
        let id = self.next_grant;
        self.next_grant += 1;
        self.grants.insert(id, vec![0; len]);
        GrantId::new(id)
    }

    /// Returns the current contents of a grant.
    ///
    /// # Panics
    ///
    /// Panics if the grant was never created.
    #[must_use]
    pub fn grant_data(&self, grant: GrantId) -> &[u8] {
        self.grants
            .get(&grant.raw())
            .expect("unknown grant in test")
    }

    fn window(&mut self, grant: GrantId, offset: usize, len: usize) -> Result<&mut [u8]> {
        let buf = self
            .grants
            .get_mut(&grant.raw())
            .ok_or(Error::InvalidArgument)?;
        let end = offset.checked_add(len).ok_or(Error::InvalidArgument)?;
        if end > buf.len() {
            return Err(Error::InvalidArgument);
        }
        Ok(&mut buf[offset..end])
    }
}

impl DriverEnv for TestEnv {
    fn copy_to_grant(
        &mut self,
        _endpt: Endpoint,
        grant: GrantId,
        offset: usize,
        src: &[u8],
    ) -> Result<()> {
        self.window(grant, offset, src.len())?.copy_from_slice(src);
        Ok(())
    }

    fn copy_from_grant(
        &mut self,
        _endpt: Endpoint,
        grant: GrantId,
        offset: usize,
        dst: &mut [u8],
    ) -> Result<()> {
        dst.copy_from_slice(self.window(grant, offset, dst.len())?);
        Ok(())
    }

    fn task_reply(&mut self, endpt: Endpoint, id: RequestId, result: Result<usize>) {
        self.task_replies.push((endpt, id, result));
    }

    fn select_reply(&mut self, endpt: Endpoint, minor: Minor, ops: SelectOps) {
        self.select_replies.push((endpt, minor, ops));
    }

    fn release_fds(&mut self, minor: Minor, fds: &[i32]) {
        self.released_fds.push((minor, fds.to_vec()));
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}
