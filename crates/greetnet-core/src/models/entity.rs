//! Typed reference to a cluster or destination row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to one of the two aggregate roots that own tags, carry
/// field permissions and hold translatable text.
///
/// Replaces the stringly-typed content-type/object-id pair: the kind is
/// part of the type, so a permission or tag edge can never point at a
/// table that does not participate in these subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Cluster(Uuid),
    Destination(Uuid),
}

impl EntityRef {
    /// The SurrealDB table the referenced row lives in.
    pub fn table(&self) -> &'static str {
        match self {
            EntityRef::Cluster(_) => "cluster",
            EntityRef::Destination(_) => "destination",
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            EntityRef::Cluster(id) | EntityRef::Destination(id) => *id,
        }
    }

    pub fn from_parts(table: &str, id: Uuid) -> Option<Self> {
        match table {
            "cluster" => Some(EntityRef::Cluster(id)),
            "destination" => Some(EntityRef::Destination(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table(), self.uuid())
    }
}
