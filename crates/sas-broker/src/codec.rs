//! Permission strings
//!
//! Callers express permissions as a string of letters. [`decode`] turns that
//! string into a [`PermissionSet`] checked against a kind's grantable units and
//! [`encode`] renders a set in the native `sp` syntax of a storage kind.

use crate::error::BrokerResult;
use crate::kind::ResourceKind;
use crate::permission::{AllowedPermissions, PermissionSet};

/// Whole-string forms accepted in addition to per-letter input.
const SHORTHANDS: [(&str, PermissionSet); 4] = [
    ("r", PermissionSet::READ),
    ("w", PermissionSet::WRITE),
    ("rw", PermissionSet::READ_WRITE),
    ("wr", PermissionSet::READ_WRITE),
];

const TABLE_LETTERS: &[(PermissionSet, char)] = &[
    (PermissionSet::READ, 'r'),
    (PermissionSet::ADD, 'a'),
    (PermissionSet::UPDATE, 'u'),
    (PermissionSet::DELETE, 'd'),
];

const QUEUE_LETTERS: &[(PermissionSet, char)] = &[
    (PermissionSet::READ, 'r'),
    (PermissionSet::ADD, 'a'),
    (PermissionSet::UPDATE, 'u'),
    (PermissionSet::DELETE, 'd'),
    (PermissionSet::PROCESS, 'p'),
];

fn push_letters(out: &mut String, set: PermissionSet, letters: &[(PermissionSet, char)]) {
    for &(flag, c) in letters {
        if set.contains(flag) {
            out.push(c);
        }
    }
}

fn letter_flag(c: char) -> Option<PermissionSet> {
    match c {
        'r' => Some(PermissionSet::READ),
        'a' => Some(PermissionSet::ADD),
        'u' => Some(PermissionSet::UPDATE),
        'd' => Some(PermissionSet::DELETE),
        'p' => Some(PermissionSet::PROCESS),
        _ => None,
    }
}

/// Parses a permission string.
///
/// The shorthands `r`, `w`, `rw` and `wr` are expanded first and then checked
/// like any other input. Otherwise letters from `r a u d p` are read left to
/// right and each one must be new and grantable on its own.
///
/// ```
/// use sas_broker::codec::decode;
/// use sas_broker::permission::{AllowedPermissions, PermissionSet};
///
/// assert_eq!(decode("rw", AllowedPermissions::BLOB).unwrap(), PermissionSet::READ_WRITE);
/// assert!(decode("a", AllowedPermissions::BLOB).is_err());
/// assert!(decode("rr", AllowedPermissions::TABLE).is_err());
/// ```
///
/// # Errors
/// Returns `InvalidPermissionString` if the string is blank, contains an
/// unknown letter, repeats a letter or asks for a right `allowed` does not
/// grant.
pub fn decode(letters: &str, allowed: AllowedPermissions) -> BrokerResult<PermissionSet> {
    if letters.trim().is_empty() {
        return Err(broker_error!(InvalidPermissionString, "permission string is empty"));
    }

    if let Some(&(_, set)) = SHORTHANDS.iter().find(|(s, _)| *s == letters) {
        if !allowed.permits(set) {
            return Err(broker_error!(
                InvalidPermissionString,
                "permission {} is not allowed for this resource",
                letters
            ));
        }
        return Ok(set);
    }

    let mut set = PermissionSet::NONE;
    for c in letters.chars() {
        let Some(flag) = letter_flag(c) else {
            return Err(broker_error!(InvalidPermissionString, "unknown permission letter: {:?}", c));
        };
        if set.contains(flag) {
            return Err(broker_error!(InvalidPermissionString, "duplicate permission letter: {:?}", c));
        }
        if !allowed.permits(flag) {
            return Err(broker_error!(
                InvalidPermissionString,
                "permission {:?} is not allowed for this resource",
                c
            ));
        }
        set |= flag;
    }
    Ok(set)
}

/// Renders `set` as the native `sp` value of `kind`.
///
/// Letters come out in the order `r a u d p`. Blob storage collapses the whole
/// write triple to `w` and has no meaning for `PROCESS`. Tables do not use
/// `PROCESS` either.
///
/// ```
/// use sas_broker::ResourceKind;
/// use sas_broker::codec::encode;
/// use sas_broker::permission::PermissionSet;
///
/// assert_eq!(encode(ResourceKind::Blob, PermissionSet::READ_WRITE).unwrap(), "rw");
/// assert_eq!(encode(ResourceKind::Table, PermissionSet::READ_WRITE).unwrap(), "raud");
/// ```
///
/// # Errors
/// Returns `InvalidPermissionString` for a blob set holding part of the write
/// triple without all of it.
pub fn encode(kind: ResourceKind, set: PermissionSet) -> BrokerResult<String> {
    let mut out = String::with_capacity(5);
    match kind {
        ResourceKind::Blob => {
            if set.contains(PermissionSet::READ) {
                out.push('r');
            }
            if set.contains(PermissionSet::WRITE) {
                out.push('w');
            } else if set.intersects(PermissionSet::WRITE) {
                return Err(broker_error!(
                    InvalidPermissionString,
                    "blobs do not support add, update or delete on their own, use write instead"
                ));
            }
        }
        ResourceKind::Table => push_letters(&mut out, set, TABLE_LETTERS),
        ResourceKind::Queue => push_letters(&mut out, set, QUEUE_LETTERS),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::BrokerErrorCode;

    fn decode_err(letters: &str, allowed: AllowedPermissions) -> BrokerErrorCode {
        decode(letters, allowed).unwrap_err().code()
    }

    #[test]
    fn shorthands() {
        let blob = AllowedPermissions::BLOB;
        assert_eq!(decode("r", blob).unwrap(), PermissionSet::READ);
        assert_eq!(decode("w", blob).unwrap(), PermissionSet::WRITE);
        assert_eq!(decode("rw", blob).unwrap(), PermissionSet::READ_WRITE);
        assert_eq!(decode("wr", blob).unwrap(), PermissionSet::READ_WRITE);

        let table = AllowedPermissions::TABLE;
        assert_eq!(decode("w", table).unwrap(), PermissionSet::WRITE);
        assert_eq!(decode("wr", table).unwrap(), PermissionSet::READ_WRITE);
    }

    #[test]
    fn shorthand_is_checked_against_allow_list() {
        static READ_ONLY: AllowedPermissions = AllowedPermissions::new(&[PermissionSet::READ]);
        assert_eq!(decode("r", READ_ONLY).unwrap(), PermissionSet::READ);
        assert_eq!(decode_err("w", READ_ONLY), BrokerErrorCode::InvalidPermissionString);
        assert_eq!(decode_err("rw", READ_ONLY), BrokerErrorCode::InvalidPermissionString);
    }

    #[test]
    fn letters() {
        let queue = AllowedPermissions::QUEUE;
        assert_eq!(
            decode("raup", queue).unwrap(),
            PermissionSet::READ | PermissionSet::ADD | PermissionSet::UPDATE | PermissionSet::PROCESS
        );
        assert_eq!(decode("pdr", queue).unwrap(), PermissionSet::READ | PermissionSet::DELETE | PermissionSet::PROCESS);
    }

    #[test]
    fn rejects() {
        let blob = AllowedPermissions::BLOB;
        let table = AllowedPermissions::TABLE;

        for letters in ["", "   ", "a", "u", "d", "p", "ra", "rwp", "ww"] {
            assert_eq!(decode_err(letters, blob), BrokerErrorCode::InvalidPermissionString, "{letters:?}");
        }
        for letters in ["rr", "raa", "x", "R", "r a", "rwx", "rwa"] {
            assert_eq!(decode_err(letters, table), BrokerErrorCode::InvalidPermissionString, "{letters:?}");
        }
    }

    #[test]
    fn encode_blob() {
        assert_eq!(encode(ResourceKind::Blob, PermissionSet::READ).unwrap(), "r");
        assert_eq!(encode(ResourceKind::Blob, PermissionSet::WRITE).unwrap(), "w");
        assert_eq!(encode(ResourceKind::Blob, PermissionSet::READ_WRITE).unwrap(), "rw");
        assert_eq!(
            encode(ResourceKind::Blob, PermissionSet::READ | PermissionSet::PROCESS).unwrap(),
            "r"
        );

        for partial in [
            PermissionSet::ADD,
            PermissionSet::UPDATE | PermissionSet::DELETE,
            PermissionSet::READ | PermissionSet::DELETE,
        ] {
            let err = encode(ResourceKind::Blob, partial).unwrap_err();
            assert_eq!(err.code(), BrokerErrorCode::InvalidPermissionString);
        }
    }

    #[test]
    fn encode_table_and_queue() {
        let everything = PermissionSet::READ_WRITE | PermissionSet::PROCESS;
        assert_eq!(encode(ResourceKind::Table, everything).unwrap(), "raud");
        assert_eq!(encode(ResourceKind::Queue, everything).unwrap(), "raudp");
        assert_eq!(encode(ResourceKind::Table, PermissionSet::PROCESS).unwrap(), "");
        assert_eq!(
            encode(ResourceKind::Queue, PermissionSet::PROCESS | PermissionSet::READ).unwrap(),
            "rp"
        );
    }

    #[test]
    fn decode_then_encode() {
        let cases = [
            (ResourceKind::Blob, "r", "r"),
            (ResourceKind::Blob, "w", "w"),
            (ResourceKind::Blob, "wr", "rw"),
            (ResourceKind::Table, "dar", "rad"),
            (ResourceKind::Table, "w", "aud"),
            (ResourceKind::Queue, "raup", "raup"),
            (ResourceKind::Queue, "pu", "up"),
        ];
        for (kind, input, expected) in cases {
            let set = decode(input, kind.allowed_permissions()).unwrap();
            assert_eq!(encode(kind, set).unwrap(), expected, "{kind} {input}");
        }
    }
}
