//! Per-socket ring buffer.
//!
//! Each in-use socket owns one circular byte buffer of capacity
//! [`BUF_CAP`]. The owner drains it; the peer fills it. Both operations
//! are wrap-around aware and move bytes in at most two contiguous
//! segments through the safe-copy primitive, so a caller grant sees one
//! linear window regardless of where the data sits in the ring.
//!
//! Ring state only advances after every copy has succeeded; a copy
//! failure leaves `pos` and `size` untouched and surfaces the error
//! verbatim.

use crate::config::BUF_CAP;
use crate::env::DriverEnv;
use crate::error::{Error, Result};
use crate::types::{Endpoint, GrantId};

/// A fixed-capacity circular byte buffer.
///
/// `pos` is the tail (next byte to drain); the head is implicit at
/// `(pos + size) % BUF_CAP`. When the buffer drains empty, `pos` snaps
/// back to 0 so the next fill starts contiguous and may save a wrap
/// copy.
#[derive(Debug)]
pub(crate) struct RingBuffer {
    buf: Box<[u8]>,
    pos: usize,
    size: usize,
}

impl RingBuffer {
    /// Allocates a ring of `BUF_CAP` bytes.
    ///
    /// Allocation is fallible: the buffer only exists while the socket is
    /// open, and exhaustion maps to [`Error::OutOfMemory`].
    pub(crate) fn new() -> Result<Self> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(BUF_CAP)
            .map_err(|_| Error::OutOfMemory)?;
        storage.resize(BUF_CAP, 0);
        Ok(Self {
            buf: storage.into_boxed_slice(),
            pos: 0,
            size: 0,
        })
    }

    /// Returns the number of buffered bytes.
    #[must_use]
    pub(crate) const fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no bytes are buffered.
    #[must_use]
    pub(crate) const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if the ring is at capacity.
    #[must_use]
    pub(crate) const fn is_full(&self) -> bool {
        self.size == BUF_CAP
    }

    /// Returns the number of bytes the ring can still accept.
    #[must_use]
    pub(crate) const fn free(&self) -> usize {
        BUF_CAP - self.size
    }

    /// Returns the tail offset; exposed for invariant checks.
    #[cfg(test)]
    pub(crate) const fn tail(&self) -> usize {
        self.pos
    }

    /// Drains up to `min(n, len())` bytes from the tail into the caller's
    /// grant, returning the number of bytes moved.
    pub(crate) fn drain_to_grant(
        &mut self,
        env: &mut dyn DriverEnv,
        endpt: Endpoint,
        grant: GrantId,
        n: usize,
    ) -> Result<usize> {
        let n = n.min(self.size);
        if n == 0 {
            return Ok(0);
        }

        let first = n.min(BUF_CAP - self.pos);
        env.copy_to_grant(endpt, grant, 0, &self.buf[self.pos..self.pos + first])?;
        if first < n {
            env.copy_to_grant(endpt, grant, first, &self.buf[..n - first])?;
        }

        self.pos = (self.pos + n) % BUF_CAP;
        self.size -= n;
        if self.size == 0 {
            self.pos = 0;
        }
        Ok(n)
    }

    /// Fills up to `min(n, free())` bytes from the caller's grant at the
    /// head, returning the number of bytes moved.
    pub(crate) fn fill_from_grant(
        &mut self,
        env: &mut dyn DriverEnv,
        endpt: Endpoint,
        grant: GrantId,
        n: usize,
    ) -> Result<usize> {
        let n = n.min(self.free());
        if n == 0 {
            return Ok(0);
        }

        let head = (self.pos + self.size) % BUF_CAP;
        let first = n.min(BUF_CAP - head);
        env.copy_from_grant(endpt, grant, 0, &mut self.buf[head..head + first])?;
        if first < n {
            env.copy_from_grant(endpt, grant, first, &mut self.buf[..n - first])?;
        }

        self.size += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn filled(env: &mut TestEnv, ring: &mut RingBuffer, bytes: &[u8]) {
        let grant = env.grant_bytes(bytes);
        let n = ring
            .fill_from_grant(env, Endpoint::new(1), grant, bytes.len())
            .expect("fill failed");
        assert_eq!(n, bytes.len());
    }

    fn drained(env: &mut TestEnv, ring: &mut RingBuffer, n: usize) -> Vec<u8> {
        let grant = env.grant_buffer(n);
        let moved = ring
            .drain_to_grant(env, Endpoint::new(1), grant, n)
            .expect("drain failed");
        env.grant_data(grant)[..moved].to_vec()
    }

    #[test]
    fn fill_then_drain_round_trips() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        filled(&mut env, &mut ring, b"hello");
        assert_eq!(ring.len(), 5);
        assert_eq!(drained(&mut env, &mut ring, 16), b"hello");
        assert!(ring.is_empty());
    }

    #[test]
    fn drain_clamps_to_buffered_bytes() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        filled(&mut env, &mut ring, b"abc");
        let out = drained(&mut env, &mut ring, 100);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn fill_clamps_to_free_space() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        let big = vec![0x5a; BUF_CAP + 7];
        let grant = env.grant_bytes(&big);
        let n = ring
            .fill_from_grant(&mut env, Endpoint::new(1), grant, big.len())
            .expect("fill failed");
        assert_eq!(n, BUF_CAP);
        assert!(ring.is_full());
        assert_eq!(ring.free(), 0);
    }

    #[test]
    fn wrap_around_preserves_order() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        // Push the tail near the end of the buffer, then drain most of it
        // so the next fill wraps.
        let lead = vec![1u8; BUF_CAP - 4];
        filled(&mut env, &mut ring, &lead);
        assert_eq!(drained(&mut env, &mut ring, BUF_CAP - 8).len(), BUF_CAP - 8);
        assert_eq!(ring.len(), 4);

        filled(&mut env, &mut ring, b"ABCDEFGH");
        assert_eq!(ring.len(), 12);

        let out = drained(&mut env, &mut ring, 12);
        assert_eq!(&out[..4], &[1, 1, 1, 1]);
        assert_eq!(&out[4..], b"ABCDEFGH");
    }

    #[test]
    fn pos_resets_when_emptied() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        filled(&mut env, &mut ring, b"xyz");
        let _ = drained(&mut env, &mut ring, 3);
        assert!(ring.is_empty());
        assert_eq!(ring.tail(), 0);
    }

    #[test]
    fn copy_failure_leaves_state_untouched() {
        let mut env = TestEnv::new();
        let mut ring = RingBuffer::new().expect("alloc");

        filled(&mut env, &mut ring, b"hello");

        // A grant smaller than the requested drain makes the copy fail.
        let short = env.grant_buffer(2);
        let err = ring
            .drain_to_grant(&mut env, Endpoint::new(1), short, 5)
            .expect_err("short grant must fail");
        assert_eq!(err, Error::InvalidArgument);
        assert_eq!(ring.len(), 5);
        assert_eq!(drained(&mut env, &mut ring, 5), b"hello");
    }
}
