use async_trait::async_trait;

use custodia_core::AppResult;
use custodia_domain::ObjectRef;

/// Port resolving one relation hop from an object to its related object.
///
/// Single-typed and any-type relations resolve the same way: the result
/// carries its own model type.
#[async_trait]
pub trait RelatedObjectResolver: Send + Sync {
    /// Returns the object reached through `relation`, if it is set.
    async fn resolve_related(
        &self,
        object: &ObjectRef,
        relation: &str,
    ) -> AppResult<Option<ObjectRef>>;
}

/// Port keeping the relation projection current as objects change.
#[async_trait]
pub trait ObjectRelationRepository: Send + Sync {
    /// Points `relation` of `child` at `parent`, replacing any previous value.
    ///
    /// Fails with `Validation` when `child` is `parent` or is already reachable
    /// from `parent` through stored relations; the projection stays acyclic.
    async fn set_relation(
        &self,
        child: &ObjectRef,
        relation: &str,
        parent: &ObjectRef,
    ) -> AppResult<()>;

    /// Clears `relation` of `child`.
    async fn clear_relation(&self, child: &ObjectRef, relation: &str) -> AppResult<()>;
}
