//! Per-category identifier interning.
//!
//! Maps opaque protocol keys to small dense integer ids. Each [`Category`]
//! has its own namespace: the same key interned as a material and as a
//! texture yields two independent ids. Ids at or below
//! [`ObjectId::RESERVED_MAX`] are reserved for well-known objects; fresh
//! allocations start at [`BASE_ID`].
//!
//! The table is plain owned data with no global state. Callers that replay
//! partial streams through several decoders and need stable ids share one
//! table through [`SharedIdTable`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::registry::{IdentityRegistry, canonical_key};

/// First id handed out by fresh allocation. Everything below is reserved.
pub const BASE_ID: u32 = 101;

/// Identifier category. Each category is an independent id namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Texture,
    Material,
    Metafile,
    Viewport,
    VisualStyle,
    Layer,
    Overlay,
    HlBranch,
    Background,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Texture,
        Category::Material,
        Category::Metafile,
        Category::Viewport,
        Category::VisualStyle,
        Category::Layer,
        Category::Overlay,
        Category::HlBranch,
        Category::Background,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Texture => "texture",
            Self::Material => "material",
            Self::Metafile => "metafile",
            Self::Viewport => "viewport",
            Self::VisualStyle => "visual style",
            Self::Layer => "layer",
            Self::Overlay => "overlay",
            Self::HlBranch => "highlight branch",
            Self::Background => "background",
        };
        f.write_str(name)
    }
}

/// Interned identifier. Id 0 means "no object".
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The "no object" id, produced by the reserved key `"0"`.
    pub const NONE: Self = Self(0);
    /// Largest reserved/well-known id.
    pub const RESERVED_MAX: u32 = 100;

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_reserved(self) -> bool {
        self.0 <= Self::RESERVED_MAX
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier consistency errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// A record introducing an entity supplied a key its category already knows.
    #[error("{category} key {key:?} already interned")]
    AlreadyKnown { key: String, category: Category },

    /// A record referencing an entity supplied a key never introduced.
    #[error("{category} key {key:?} was never introduced")]
    NeverIntroduced { key: String, category: Category },

    /// Every non-reserved id in the category is assigned.
    #[error("{category} id space exhausted")]
    Exhausted { category: Category },
}

#[derive(Debug, Clone, Default)]
struct CategoryTable {
    /// Key → id, in insertion order (registry forwarding order).
    ids: IndexMap<String, ObjectId>,
    /// Every assigned id, including forced special mappings.
    used: HashSet<u32>,
    /// Allocation cursor: next candidate id.
    next: u32,
}

impl CategoryTable {
    fn new() -> Self {
        Self {
            ids: IndexMap::new(),
            used: HashSet::new(),
            next: BASE_ID,
        }
    }

    /// Allocate the next unused id, skipping assigned ones and wrapping
    /// back to `BASE_ID` when the range is exhausted.
    fn allocate(&mut self, category: Category) -> Result<ObjectId, IdError> {
        let start = self.next;
        loop {
            let candidate = self.next;
            self.next = if candidate == u32::MAX {
                BASE_ID
            } else {
                candidate + 1
            };
            if !self.used.contains(&candidate) {
                self.used.insert(candidate);
                return Ok(ObjectId(candidate));
            }
            if self.next == start {
                return Err(IdError::Exhausted { category });
            }
        }
    }
}

/// Per-category identifier table.
///
/// Instance-owned: construct with [`IdTable::new`], tear down by dropping.
/// Not internally synchronized; see [`SharedIdTable`] for cross-decoder use.
#[derive(Debug, Clone)]
pub struct IdTable {
    categories: [CategoryTable; 9],
}

/// Synchronization handle for sharing one table across decoder instances.
pub type SharedIdTable = Arc<Mutex<IdTable>>;

impl Default for IdTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IdTable {
    pub fn new() -> Self {
        Self {
            categories: std::array::from_fn(|_| CategoryTable::new()),
        }
    }

    /// Return the memoized id for `key`, or allocate a fresh one.
    ///
    /// The reserved key `"0"` always yields [`ObjectId::NONE`] and is never
    /// memoized. A freshly created mapping is forwarded once to `registry`.
    pub fn get_or_create<R: IdentityRegistry + ?Sized>(
        &mut self,
        key: &str,
        category: Category,
        registry: &mut R,
    ) -> Result<ObjectId, IdError> {
        if key == "0" {
            return Ok(ObjectId::NONE);
        }
        let table = &mut self.categories[category.index()];
        if let Some(&id) = table.ids.get(key) {
            return Ok(id);
        }
        let id = table.allocate(category)?;
        table.ids.insert(key.to_owned(), id);
        registry.register(category, id, &canonical_key(key));
        Ok(id)
    }

    /// Whether `key` resolves in `category`. The reserved key `"0"` always does.
    pub fn contains(&self, key: &str, category: Category) -> bool {
        key == "0" || self.categories[category.index()].ids.contains_key(key)
    }

    /// Force a mapping, for well-known ids and deterministic replay.
    ///
    /// A fresh non-zero mapping is forwarded to `registry` like any other
    /// first creation. Re-forcing an existing key replaces its id without
    /// re-forwarding.
    pub fn set_special<R: IdentityRegistry + ?Sized>(
        &mut self,
        key: &str,
        id: ObjectId,
        category: Category,
        registry: &mut R,
    ) {
        let table = &mut self.categories[category.index()];
        table.used.insert(id.raw());
        let fresh = table.ids.insert(key.to_owned(), id).is_none();
        if fresh && !id.is_none() {
            registry.register(category, id, &canonical_key(key));
        }
    }

    /// Drop all mappings of one category. The next allocation restarts at
    /// [`BASE_ID`].
    pub fn clear(&mut self, category: Category) {
        self.categories[category.index()] = CategoryTable::new();
    }

    /// `get_or_create` for records that introduce an entity: the key must
    /// be new to its category.
    pub fn create_new<R: IdentityRegistry + ?Sized>(
        &mut self,
        key: &str,
        category: Category,
        registry: &mut R,
    ) -> Result<ObjectId, IdError> {
        if self.contains(key, category) {
            return Err(IdError::AlreadyKnown {
                key: key.to_owned(),
                category,
            });
        }
        self.get_or_create(key, category, registry)
    }

    /// Resolve a key for records that reference an entity: the key must
    /// already be known in its category.
    pub fn lookup_existing(&self, key: &str, category: Category) -> Result<ObjectId, IdError> {
        if key == "0" {
            return Ok(ObjectId::NONE);
        }
        self.categories[category.index()]
            .ids
            .get(key)
            .copied()
            .ok_or_else(|| IdError::NeverIntroduced {
                key: key.to_owned(),
                category,
            })
    }

    /// Number of memoized mappings in one category.
    pub fn len(&self, category: Category) -> usize {
        self.categories[category.index()].ids.len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.len(category) == 0
    }

    /// Iterate one category's mappings in insertion order.
    pub fn iter(&self, category: Category) -> impl Iterator<Item = (&str, ObjectId)> {
        self.categories[category.index()]
            .ids
            .iter()
            .map(|(k, &id)| (k.as_str(), id))
    }
}
