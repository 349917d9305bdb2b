use std::collections::{HashMap, HashSet};

use repograph_lang::FrontEnd;
use tracing::{debug, instrument};

use crate::store::GraphStore;
use crate::types::{short_name_of, Entity, EntityKind, RelationKind, Relationship};

/// The reference resolution pass. Matches the identifier and attribute
/// tokens used in each declaration's body against the declaring file's
/// one-hop definition scope (everything one IMPORTS or CONTAINS edge away).
///
/// The per-file scope cache lives only as long as the resolver; a fresh
/// build gets a fresh resolver.
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    front_end: &'a dyn FrontEnd,
    scope_cache: HashMap<String, Vec<Relationship>>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(front_end: &'a dyn FrontEnd) -> Self {
        Self {
            front_end,
            scope_cache: HashMap::new(),
        }
    }

    /// Resolve body references for every Variable, Function, and Class
    /// entity. Edges targeting File entities are dropped: an attribute
    /// access resolving to a file-level node is a known false-positive
    /// class on case-insensitive filesystems.
    #[instrument(skip_all, name = "resolve_references")]
    pub async fn resolve_all(
        &mut self,
        store: &dyn GraphStore,
        entities: &[Entity],
    ) -> crate::error::Result<Vec<Relationship>> {
        let mut edges = Vec::new();

        for entity in entities {
            if !matches!(
                entity.kind,
                EntityKind::Variable | EntityKind::Function | EntityKind::Class
            ) {
                continue;
            }
            for (to, to_kind) in self.resolve_entity(store, entity).await? {
                if to_kind == EntityKind::File {
                    continue;
                }
                edges.push(Relationship::new(
                    RelationKind::References,
                    entity,
                    &Entity::new(to_kind, to),
                ));
            }
        }

        debug!(edges = edges.len(), "Reference resolution complete");
        Ok(edges)
    }

    /// Targets an entity's body refers to, deduplicated.
    async fn resolve_entity(
        &mut self,
        store: &dyn GraphStore,
        entity: &Entity,
    ) -> crate::error::Result<HashSet<(String, EntityKind)>> {
        let mut targets = HashSet::new();

        let names = self.front_end.capture_references(&entity.source)?;
        if names.is_empty() {
            return Ok(targets);
        }

        let Some(file) = store.containing_file(&entity.name).await? else {
            return Ok(targets);
        };
        let scope = self.scope(store, &file.name).await?;

        for member in &scope {
            let effective = match member.kind {
                RelationKind::Imports => {
                    match member.alias.as_deref().or(member.import.as_deref()) {
                        Some(effective) => effective.to_string(),
                        None => continue,
                    }
                }
                _ => short_name_of(&member.to).to_string(),
            };

            for name in &names {
                if *name == effective {
                    targets.insert((member.to.clone(), member.to_kind));
                    continue;
                }
                let Some(attr) = name
                    .strip_prefix(&effective)
                    .and_then(|rest| rest.strip_prefix('.'))
                else {
                    continue;
                };
                let Some(candidate) = attribute_candidate(member, attr) else {
                    continue;
                };
                match store.get(&candidate).await? {
                    Some(found) => {
                        targets.insert((found.name, found.kind));
                    }
                    None => {
                        // Attribute into an unresolved external surface;
                        // keep the edge traversable
                        store
                            .upsert_entity(&Entity::unparsed(candidate.clone()))
                            .await?;
                        targets.insert((candidate, EntityKind::Unparsed));
                    }
                }
            }
        }

        Ok(targets)
    }

    /// One-hop definition scope of a file, cached for the pass lifetime.
    async fn scope(
        &mut self,
        store: &dyn GraphStore,
        file: &str,
    ) -> crate::error::Result<Vec<Relationship>> {
        if let Some(cached) = self.scope_cache.get(file) {
            return Ok(cached.clone());
        }
        let edges = store
            .relationships_from(file, &[RelationKind::Imports, RelationKind::Contains])
            .await?;
        self.scope_cache.insert(file.to_string(), edges.clone());
        Ok(edges)
    }
}

/// Candidate entity name for an attribute access through a scope member,
/// by the member's kind. Variable and Function targets don't support
/// attribute resolution.
fn attribute_candidate(member: &Relationship, attr: &str) -> Option<String> {
    match (member.kind, member.to_kind) {
        (RelationKind::Imports, EntityKind::File) => Some(format!("{}:{attr}", member.to)),
        (RelationKind::Imports, EntityKind::Class | EntityKind::Unparsed)
        | (RelationKind::Contains, EntityKind::Class) => Some(format!("{}.{attr}", member.to)),
        _ => None,
    }
}
