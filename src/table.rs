//! The socket table.
//!
//! One fixed array of [`NR_SOCKS`] optional slots; a slot's index is its
//! minor number. Slot 0 is the device node itself and is never handed
//! out. Allocation claims the first free slot and allocates its ring;
//! release drops the whole `Socket`, ring included, restoring the free
//! state.
//!
//! Lookup distinguishes the two failure modes the dispatch contract
//! requires: an index outside the table is [`Error::NoSuchDevice`], a
//! free slot inside it is [`Error::InvalidArgument`].

use crate::config::NR_SOCKS;
use crate::error::{Error, Result};
use crate::ring::RingBuffer;
use crate::slot::Socket;
use crate::types::{Endpoint, Minor};

/// The process-wide socket table.
#[derive(Debug)]
pub(crate) struct SocketTable {
    slots: Vec<Option<Socket>>,
}

impl SocketTable {
    /// Creates a table with every slot free.
    pub(crate) fn new() -> Self {
        let mut slots = Vec::with_capacity(NR_SOCKS);
        slots.resize_with(NR_SOCKS, || None);
        Self { slots }
    }

    /// Claims the first free slot for `owner`, allocating its ring.
    ///
    /// Scans `[1..NR_SOCKS)`; slot 0 is reserved. Fails with
    /// [`Error::NoFile`] when the table is exhausted and
    /// [`Error::OutOfMemory`] when the ring allocation fails.
    pub(crate) fn allocate(&mut self, owner: Endpoint) -> Result<Minor> {
        let index = self.slots[1..]
            .iter()
            .position(Option::is_none)
            .map(|i| i + 1)
            .ok_or(Error::NoFile)?;

        let ring = RingBuffer::new()?;
        self.slots[index] = Some(Socket::new(owner, ring));
        Ok(Minor::new(index as u32))
    }

    /// Frees the slot, dropping its state.
    pub(crate) fn release(&mut self, minor: Minor) -> Option<Socket> {
        self.slots.get_mut(minor.index())?.take()
    }

    /// Returns the socket at `minor`.
    pub(crate) fn get(&self, minor: Minor) -> Result<&Socket> {
        self.slots
            .get(minor.index())
            .ok_or(Error::NoSuchDevice)?
            .as_ref()
            .ok_or(Error::InvalidArgument)
    }

    /// Returns the socket at `minor`, mutably.
    pub(crate) fn get_mut(&mut self, minor: Minor) -> Result<&mut Socket> {
        self.slots
            .get_mut(minor.index())
            .ok_or(Error::NoSuchDevice)?
            .as_mut()
            .ok_or(Error::InvalidArgument)
    }

    /// Returns true if `minor` names an in-use slot.
    pub(crate) fn is_in_use(&self, minor: Minor) -> bool {
        self.get(minor).is_ok()
    }

    /// Returns the number of in-use slots.
    pub(crate) fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Iterates over the in-use slots in minor order.
    pub(crate) fn iter_in_use(&self) -> impl Iterator<Item = (Minor, &Socket)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| Some((Minor::new(i as u32), s.as_ref()?)))
    }

    /// Iterates mutably over the in-use slots in minor order.
    pub(crate) fn iter_in_use_mut(&mut self) -> impl Iterator<Item = (Minor, &mut Socket)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| Some((Minor::new(i as u32), s.as_mut()?)))
    }
}
