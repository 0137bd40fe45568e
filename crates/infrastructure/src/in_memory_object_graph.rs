use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use custodia_application::{ObjectRelationRepository, RelatedObjectResolver};
use custodia_core::{AppError, AppResult};
use custodia_domain::ObjectRef;
use tokio::sync::RwLock;

/// In-memory relation projection keyed by (object, relation name).
#[derive(Debug, Default)]
pub struct InMemoryObjectGraph {
    relations: RwLock<HashMap<(ObjectRef, String), ObjectRef>>,
}

impl InMemoryObjectGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelatedObjectResolver for InMemoryObjectGraph {
    async fn resolve_related(
        &self,
        object: &ObjectRef,
        relation: &str,
    ) -> AppResult<Option<ObjectRef>> {
        Ok(self
            .relations
            .read()
            .await
            .get(&(object.clone(), relation.to_owned()))
            .cloned())
    }
}

#[async_trait]
impl ObjectRelationRepository for InMemoryObjectGraph {
    async fn set_relation(
        &self,
        child: &ObjectRef,
        relation: &str,
        parent: &ObjectRef,
    ) -> AppResult<()> {
        let mut relations = self.relations.write().await;
        if reaches(&relations, parent, child) {
            return Err(AppError::Validation(format!(
                "relation '{relation}' of '{child}' would make it its own ancestor"
            )));
        }

        relations.insert((child.clone(), relation.to_owned()), parent.clone());
        Ok(())
    }

    async fn clear_relation(&self, child: &ObjectRef, relation: &str) -> AppResult<()> {
        self.relations
            .write()
            .await
            .remove(&(child.clone(), relation.to_owned()));
        Ok(())
    }
}

fn reaches(
    relations: &HashMap<(ObjectRef, String), ObjectRef>,
    from: &ObjectRef,
    target: &ObjectRef,
) -> bool {
    let mut visited = HashSet::new();
    let mut pending = vec![from];
    while let Some(current) = pending.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }

        pending.extend(
            relations
                .iter()
                .filter(|((object, _), _)| object == current)
                .map(|(_, related)| related),
        );
    }

    false
}
