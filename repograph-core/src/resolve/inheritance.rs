use tracing::{debug, instrument};

use crate::store::GraphStore;
use crate::types::{Entity, EntityKind, RawInherit, RelationKind, Relationship};

/// The inheritance resolution pass. Runs after import resolution so the
/// declaring file's IMPORTS edges are queryable.
#[derive(Debug)]
pub struct InheritanceResolver;

impl InheritanceResolver {
    /// Resolve every raw inheritance record into an INHERITS edge. An edge
    /// is never dropped: an unresolvable superclass expression gets an
    /// Unparsed placeholder target.
    #[instrument(skip_all, name = "resolve_inherits")]
    pub async fn resolve_inherits(
        store: &dyn GraphStore,
        raw_inherits: &[RawInherit],
    ) -> crate::error::Result<Vec<Relationship>> {
        let mut edges = Vec::new();

        for raw in raw_inherits {
            let target_name = match Self::resolve(store, raw).await? {
                Some(name) => name,
                // Unresolvable: name the placeholder from the expression
                None => raw.superclass.clone(),
            };

            let target = match store.get(&target_name).await? {
                Some(entity) => entity,
                None => {
                    // Superclass comes from an external surface we never
                    // parsed
                    let placeholder = Entity::unparsed(target_name);
                    store.upsert_entity(&placeholder).await?;
                    placeholder
                }
            };

            let class_entity = Entity::new(EntityKind::Class, raw.class_name.clone());
            edges.push(Relationship::new(
                RelationKind::Inherits,
                &class_entity,
                &target,
            ));
        }

        debug!(edges = edges.len(), "Inheritance resolution complete");
        Ok(edges)
    }

    /// Map one superclass expression to a target entity name, or `None`
    /// when neither the declaring file nor its imports explain it.
    async fn resolve(
        store: &dyn GraphStore,
        raw: &RawInherit,
    ) -> crate::error::Result<Option<String>> {
        if let Some((module, name)) = raw.superclass.rsplit_once('.') {
            // Dotted form: match the prefix against imported modules
            let imports = store
                .relationships_from(&raw.file, &[RelationKind::Imports])
                .await?;
            for edge in imports {
                if edge.to_kind != EntityKind::File {
                    continue;
                }
                let effective = edge.alias.as_deref().or(edge.import.as_deref());
                if effective == Some(module) {
                    return Ok(Some(format!("{}:{name}", edge.to)));
                }
            }
            return Ok(None);
        }

        // Plain identifier: a local definition wins
        let local = format!("{}:{}", raw.file, raw.superclass);
        if store.exists(&local).await? {
            return Ok(Some(local));
        }

        // Otherwise an imported symbol
        let imports = store
            .relationships_from(&raw.file, &[RelationKind::Imports])
            .await?;
        for edge in imports {
            if !matches!(edge.to_kind, EntityKind::Class | EntityKind::Unparsed) {
                continue;
            }
            let effective = edge.alias.as_deref().or(edge.import.as_deref());
            if effective == Some(raw.superclass.as_str()) {
                return Ok(Some(edge.to));
            }
        }

        Ok(None)
    }
}
