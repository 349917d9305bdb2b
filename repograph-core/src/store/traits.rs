use std::collections::HashMap;

use crate::types::{Direction, Entity, EntityKind, RelationKind, Relationship, StoreStats};

/// The graph store gateway. All pipeline passes and the query surface
/// read/write through this trait.
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    // ── Entity operations ──────────────────────────────────────────

    /// Insert or update an entity. Idempotent by `(kind, name)`:
    /// re-upserting the same key refreshes attributes, never duplicates.
    async fn upsert_entity(&self, entity: &Entity) -> crate::error::Result<()>;

    /// Batch upsert entities, grouped by kind, within a single
    /// transaction. Returns the number of records written.
    async fn bulk_insert_entities(&self, entities: &[Entity]) -> crate::error::Result<u64>;

    /// Get an entity by its identity name.
    async fn get(&self, name: &str) -> crate::error::Result<Option<Entity>>;

    /// Whether an entity with this name exists.
    async fn exists(&self, name: &str) -> crate::error::Result<bool>;

    /// Case-tolerant unqualified lookup via derived short names.
    async fn find_by_short_name(&self, term: &str) -> crate::error::Result<Vec<Entity>>;

    // ── Relationship operations ────────────────────────────────────

    /// Batch insert edges, grouped by kind and endpoint pair tag, within
    /// a single transaction. Append-only. Returns the number written.
    async fn bulk_insert_relationships(
        &self,
        relationships: &[Relationship],
    ) -> crate::error::Result<u64>;

    /// All outgoing edges of the given kinds from an entity. An empty
    /// kind list matches every kind.
    async fn relationships_from(
        &self,
        from: &str,
        kinds: &[RelationKind],
    ) -> crate::error::Result<Vec<Relationship>>;

    /// Nearest enclosing File of an entity, following CONTAINS edges
    /// upstream. Bounded to two hops to cover method-in-class nesting.
    async fn containing_file(&self, name: &str) -> crate::error::Result<Option<Entity>>;

    // ── Traversal ──────────────────────────────────────────────────

    /// Directional bounded traversal from one start entity.
    ///
    /// `depth` is clamped to 1..=5: a negative value means unbounded and
    /// maps to 5, zero maps to 1. Empty filter slices match everything.
    /// Returns reached entity names bucketed by kind; an entity reachable
    /// via multiple paths may appear more than once. An unknown start
    /// yields an empty result.
    async fn traverse(
        &self,
        start: &str,
        direction: Direction,
        depth: i64,
        entity_kinds: &[EntityKind],
        relation_kinds: &[RelationKind],
    ) -> crate::error::Result<HashMap<String, Vec<String>>>;

    // ── Maintenance ────────────────────────────────────────────────

    /// Reset the store to empty. Must be called before a fresh full build.
    async fn clear_all(&self) -> crate::error::Result<()>;

    /// Get summary statistics about the store.
    async fn stats(&self) -> crate::error::Result<StoreStats>;
}
