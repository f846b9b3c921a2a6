//! UNIX-domain socket names.
//!
//! A socket name is a filesystem-style path. Only the first
//! [`PATH_MAX`](crate::config::PATH_MAX) bytes participate in identity;
//! longer paths are truncated at construction, mirroring the fixed
//! address field of the wire format. An unbound address slot is simply
//! `None` and never matches anything.

use crate::config::PATH_MAX;
use core::fmt;

/// A UNIX-domain address: a path of at most `PATH_MAX` bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UnixAddr {
    path: Box<[u8]>,
}

impl UnixAddr {
    /// Creates an address from a path, keeping at most `PATH_MAX` bytes.
    #[must_use]
    pub fn new(path: impl AsRef<[u8]>) -> Self {
        let bytes = path.as_ref();
        let kept = &bytes[..bytes.len().min(PATH_MAX)];
        Self { path: kept.into() }
    }

    /// Returns the path bytes.
    #[must_use]
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// Returns true if `other` names the same socket.
    ///
    /// Both sides are already truncated to `PATH_MAX`, so this is a plain
    /// byte comparison; datagram recipient resolution uses it against
    /// every bound address in the table.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Debug for UnixAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixAddr({})", String::from_utf8_lossy(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_byte_equality() {
        let a = UnixAddr::new("/tmp/sock");
        let b = UnixAddr::new("/tmp/sock");
        let c = UnixAddr::new("/tmp/other");
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn overlong_paths_truncate_to_path_max() {
        let long = vec![b'x'; PATH_MAX + 32];
        let addr = UnixAddr::new(&long);
        assert_eq!(addr.path().len(), PATH_MAX);

        // Two paths that differ only past the truncation point collide.
        let mut other = long.clone();
        other[PATH_MAX + 1] = b'y';
        assert!(addr.matches(&UnixAddr::new(&other)));
    }
}
