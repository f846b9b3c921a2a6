//! Select readiness operations.
//!
//! A select request names the operations it cares about as a bitset and
//! may ask to be notified later about the ones that are not immediately
//! satisfiable. The watched remainder is remembered on the slot
//! (`sel_endpt`, `sel_ops`); the data path and reset clear each bit as
//! they report it.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Bitset of selectable operations, plus the notification request flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectOps(u8);

impl SelectOps {
    /// Data (or a pending error/EOF) can be read.
    pub const READ: Self = Self(0b0001);
    /// A write would make progress without blocking.
    pub const WRITE: Self = Self(0b0010);
    /// Exceptional condition.
    pub const ERR: Self = Self(0b0100);
    /// Request a deferred notification for unsatisfied operations.
    pub const NOTIFY: Self = Self(0b1000);

    /// Returns the empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns true if no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the operations bits with the notification flag masked off.
    #[must_use]
    pub const fn requested(self) -> Self {
        Self(self.0 & (Self::READ.0 | Self::WRITE.0 | Self::ERR.0))
    }

    /// Returns true if deferred notification was requested.
    #[must_use]
    pub const fn notify(self) -> bool {
        self.0 & Self::NOTIFY.0 != 0
    }

    /// Returns the bits of `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Clears the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for SelectOps {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SelectOps {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SelectOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::READ) {
            names.push("READ");
        }
        if self.contains(Self::WRITE) {
            names.push("WRITE");
        }
        if self.contains(Self::ERR) {
            names.push("ERR");
        }
        if self.contains(Self::NOTIFY) {
            names.push("NOTIFY");
        }
        write!(f, "SelectOps({})", names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_strips_notify() {
        let ops = SelectOps::READ | SelectOps::WRITE | SelectOps::NOTIFY;
        assert!(ops.notify());
        assert_eq!(ops.requested(), SelectOps::READ | SelectOps::WRITE);
        assert!(!ops.requested().notify());
    }

    #[test]
    fn difference_and_remove() {
        let ops = SelectOps::READ | SelectOps::WRITE;
        assert_eq!(ops.difference(SelectOps::READ), SelectOps::WRITE);

        let mut watched = ops;
        watched.remove(SelectOps::WRITE);
        assert_eq!(watched, SelectOps::READ);
    }

    #[test]
    fn debug_lists_set_bits() {
        let ops = SelectOps::READ | SelectOps::NOTIFY;
        assert_eq!(format!("{ops:?}"), "SelectOps(READ|NOTIFY)");
    }
}
