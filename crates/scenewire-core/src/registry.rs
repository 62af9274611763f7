//! Identity registry seam.
//!
//! The interner forwards each freshly created (category, id, key) mapping
//! exactly once to an external identity subsystem, e.g. a CAD database that
//! needs to resolve protocol keys back to persistent object handles. This
//! crate only defines the seam.

use crate::interner::{Category, ObjectId};

/// External identity registry. Invoked once per freshly interned id.
pub trait IdentityRegistry {
    fn register(&mut self, category: Category, id: ObjectId, canonical_key: &str);
}

/// Registry that discards all registrations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRegistry;

impl IdentityRegistry for NullRegistry {
    fn register(&mut self, _category: Category, _id: ObjectId, _canonical_key: &str) {}
}

/// Canonical transform of a protocol key.
///
/// Surrounding whitespace is stripped; purely numeric keys also lose their
/// leading zeros ("007" and "7" name the same entity on the wire).
pub fn canonical_key(key: &str) -> String {
    let trimmed = key.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_owned();
        }
        return stripped.to_owned();
    }
    trimmed.to_owned()
}
