//! Persisted-identity equality.
//!
//! Entities compare by where they live in the database, not by field values.
//! Two in-memory records are the same entity iff both have been persisted and
//! their (table, primary key) pairs match.

use std::hash::{Hash, Hasher};

/// The persisted identity of an entity: backing table plus primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub table: &'static str,
    pub id: i64,
}

/// Identity derived from persisted state rather than field values.
///
/// Transient entities (never persisted) have no key and therefore compare
/// unequal to everything — including a field-identical twin and, under
/// `PartialEq`, themselves. Flush an entity before relying on equality.
/// Hashing a transient entity is allowed and hashes the absent key.
pub trait Identity {
    /// Name of the base table backing this entity type.
    const TABLE: &'static str;

    /// Primary key, if persisted.
    fn id(&self) -> Option<i64>;

    /// The persisted identity, or `None` while transient.
    fn entity_key(&self) -> Option<EntityKey> {
        self.id().map(|id| EntityKey {
            table: Self::TABLE,
            id,
        })
    }
}

/// True iff both entities are persisted under the same key.
///
/// Entities of different types can never be compared here; the type system
/// closes the "not comparable" case from the start.
pub fn same_identity<T: Identity>(a: &T, b: &T) -> bool {
    match (a.entity_key(), b.entity_key()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Feed the (table, id) identity into a hasher.
///
/// Stable across calls, and agrees with [`same_identity`]: equal entities
/// hash identically.
pub fn identity_hash<T: Identity, H: Hasher>(entity: &T, state: &mut H) {
    T::TABLE.hash(state);
    entity.id().hash(state);
}

/// Implement [`Identity`] plus the identity-based `PartialEq`/`Hash` pair
/// for an entity struct with an `id: Option<i64>` field.
macro_rules! impl_identity {
    ($entity:ty, $table:literal) => {
        impl $crate::model::identity::Identity for $entity {
            const TABLE: &'static str = $table;

            fn id(&self) -> Option<i64> {
                self.id
            }
        }

        impl PartialEq for $entity {
            fn eq(&self, other: &Self) -> bool {
                $crate::model::identity::same_identity(self, other)
            }
        }

        impl ::std::hash::Hash for $entity {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                $crate::model::identity::identity_hash(self, state);
            }
        }
    };
}

pub(crate) use impl_identity;
