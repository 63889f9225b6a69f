//! Permission sets
//!
//! A [`PermissionSet`] is a small bitset of atomic storage rights. Each
//! resource kind exposes the units it can grant through [`AllowedPermissions`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// An immutable set of atomic storage rights.
///
/// ```
/// use sas_broker::permission::PermissionSet;
///
/// let set = PermissionSet::READ | PermissionSet::ADD;
/// assert!(set.contains(PermissionSet::READ));
/// assert!(!set.contains(PermissionSet::WRITE));
/// assert_eq!(PermissionSet::READ_WRITE.bits(), 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u8);

impl PermissionSet {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1);
    pub const ADD: Self = Self(2);
    pub const UPDATE: Self = Self(4);
    pub const DELETE: Self = Self(8);
    pub const PROCESS: Self = Self(16);

    /// `ADD | UPDATE | DELETE`
    pub const WRITE: Self = Self(Self::ADD.0 | Self::UPDATE.0 | Self::DELETE.0);
    /// `READ | WRITE`
    pub const READ_WRITE: Self = Self(Self::READ.0 | Self::WRITE.0);

    const ALL: Self = Self(Self::READ_WRITE.0 | Self::PROCESS.0);

    /// Returns `None` if `bits` has flags outside the known rights.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 { Some(Self(bits)) } else { None }
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every right in `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for PermissionSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for PermissionSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl BitAnd for PermissionSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PermissionSet, &str); 5] = [
            (PermissionSet::READ, "Read"),
            (PermissionSet::ADD, "Add"),
            (PermissionSet::UPDATE, "Update"),
            (PermissionSet::DELETE, "Delete"),
            (PermissionSet::PROCESS, "Process"),
        ];

        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The grantable units of a resource kind.
///
/// A request is permitted when it can be assembled exactly from units that it
/// fully contains. Blob storage grants `READ` and the whole `WRITE` triple, so
/// `ADD` alone is not grantable there even though `WRITE` includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedPermissions {
    units: &'static [PermissionSet],
}

impl AllowedPermissions {
    pub const BLOB: Self = Self {
        units: &[PermissionSet::READ, PermissionSet::WRITE],
    };

    pub const TABLE: Self = Self {
        units: &[
            PermissionSet::READ,
            PermissionSet::ADD,
            PermissionSet::UPDATE,
            PermissionSet::DELETE,
            PermissionSet::PROCESS,
        ],
    };

    pub const QUEUE: Self = Self::TABLE;

    #[must_use]
    pub const fn new(units: &'static [PermissionSet]) -> Self {
        Self { units }
    }

    #[must_use]
    pub fn units(&self) -> &'static [PermissionSet] {
        self.units
    }

    /// Union of all units.
    #[must_use]
    pub fn all(&self) -> PermissionSet {
        self.units.iter().fold(PermissionSet::NONE, |acc, &u| acc | u)
    }

    /// Returns `true` if `requested` is non-empty and is exactly covered by
    /// units it contains.
    #[must_use]
    pub fn permits(&self, requested: PermissionSet) -> bool {
        if requested.is_empty() {
            return false;
        }
        let covered = self
            .units
            .iter()
            .filter(|&&unit| requested.contains(unit))
            .fold(PermissionSet::NONE, |acc, &u| acc | u);
        covered == requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composites() {
        assert_eq!(PermissionSet::WRITE.bits(), 14);
        assert_eq!(PermissionSet::READ_WRITE.bits(), 15);
        assert_eq!(PermissionSet::PROCESS.bits(), 16);
        assert!(PermissionSet::READ_WRITE.contains(PermissionSet::WRITE));
        assert!(PermissionSet::WRITE.intersects(PermissionSet::DELETE));
        assert!(!PermissionSet::WRITE.intersects(PermissionSet::READ));
        assert_eq!(
            PermissionSet::READ_WRITE.difference(PermissionSet::WRITE),
            PermissionSet::READ
        );
    }

    #[test]
    fn from_bits() {
        assert_eq!(PermissionSet::from_bits(0), Some(PermissionSet::NONE));
        assert_eq!(PermissionSet::from_bits(31).map(PermissionSet::bits), Some(31));
        assert_eq!(PermissionSet::from_bits(32), None);
    }

    #[test]
    fn display() {
        assert_eq!(PermissionSet::NONE.to_string(), "None");
        assert_eq!(PermissionSet::READ_WRITE.to_string(), "Read|Add|Update|Delete");
        assert_eq!((PermissionSet::PROCESS | PermissionSet::READ).to_string(), "Read|Process");
    }

    #[test]
    fn blob_units() {
        let allowed = AllowedPermissions::BLOB;
        assert!(allowed.permits(PermissionSet::READ));
        assert!(allowed.permits(PermissionSet::WRITE));
        assert!(allowed.permits(PermissionSet::READ_WRITE));

        assert!(!allowed.permits(PermissionSet::NONE));
        assert!(!allowed.permits(PermissionSet::ADD));
        assert!(!allowed.permits(PermissionSet::READ | PermissionSet::DELETE));
        assert!(!allowed.permits(PermissionSet::PROCESS));
        assert_eq!(allowed.all(), PermissionSet::READ_WRITE);
    }

    #[test]
    fn table_units() {
        let allowed = AllowedPermissions::TABLE;
        assert!(allowed.permits(PermissionSet::ADD));
        assert!(allowed.permits(PermissionSet::UPDATE | PermissionSet::PROCESS));
        assert!(allowed.permits(PermissionSet::READ_WRITE | PermissionSet::PROCESS));
        assert!(!allowed.permits(PermissionSet::NONE));
    }
}
