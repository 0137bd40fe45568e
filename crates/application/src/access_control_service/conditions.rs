use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use custodia_core::AppResult;
use custodia_domain::{ObjectRef, RelationPath};
use tracing::{debug, warn};

use crate::{ModelPermissionRegistry, RelatedObjectResolver};

/// Maximum number of inheritance hops followed from a candidate object.
pub const MAX_INHERITANCE_DEPTH: usize = 32;

pub(super) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Inclusion condition over the set of objects a user holds a permission on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclCondition {
    /// Holds when an entry grants the permission on this object.
    Granted(ObjectRef),
    /// A relation along the path is not set; never holds.
    Unreachable,
    /// Holds when any branch holds.
    Any(Vec<AclCondition>),
    /// Holds when every branch holds; an empty list never holds.
    All(Vec<AclCondition>),
}

impl AclCondition {
    /// Evaluates the condition against the objects carrying a matching entry.
    #[must_use]
    pub fn evaluate(&self, granted: &HashSet<ObjectRef>) -> bool {
        match self {
            Self::Granted(object) => granted.contains(object),
            Self::Unreachable => false,
            Self::Any(branches) => branches.iter().any(|branch| branch.evaluate(granted)),
            Self::All(branches) => {
                !branches.is_empty() && branches.iter().all(|branch| branch.evaluate(granted))
            }
        }
    }

    /// Returns every object the condition mentions.
    #[must_use]
    pub fn referenced_objects(&self) -> Vec<&ObjectRef> {
        let mut objects = Vec::new();
        self.collect_objects(&mut objects);
        objects
    }

    fn collect_objects<'a>(&'a self, objects: &mut Vec<&'a ObjectRef>) {
        match self {
            Self::Granted(object) => objects.push(object),
            Self::Unreachable => {}
            Self::Any(branches) | Self::All(branches) => {
                for branch in branches {
                    branch.collect_objects(objects);
                }
            }
        }
    }
}

/// Builds the inheritance condition of one candidate object.
///
/// The first level of declared paths is combined with OR. Below it, the
/// entry of an ancestor and the conditions of its own declared paths are
/// combined with AND per path, and sibling paths with OR.
///
/// A path that leads back to an object already on the chain, or past
/// [`MAX_INHERITANCE_DEPTH`] hops, is cut and treated like an unset
/// relation.
pub(super) struct AclConditionBuilder<'a> {
    registry: &'a ModelPermissionRegistry,
    resolver: &'a dyn RelatedObjectResolver,
}

/// Walk state of one candidate: the chain being expanded and the ancestors
/// whose conditions did not depend on a cut.
#[derive(Default)]
struct Walk {
    chain: Vec<ObjectRef>,
    expanded: HashMap<ObjectRef, Vec<AclCondition>>,
}

struct Expansion {
    conditions: Vec<AclCondition>,
    cut: bool,
}

impl Expansion {
    fn cut() -> Self {
        Self {
            conditions: vec![AclCondition::Unreachable],
            cut: true,
        }
    }
}

impl<'a> AclConditionBuilder<'a> {
    pub(super) fn new(
        registry: &'a ModelPermissionRegistry,
        resolver: &'a dyn RelatedObjectResolver,
    ) -> Self {
        Self { registry, resolver }
    }

    pub(super) async fn build(&self, object: &ObjectRef) -> AppResult<AclCondition> {
        let mut branches = vec![AclCondition::Granted(object.clone())];
        let mut walk = Walk {
            chain: vec![object.clone()],
            ..Walk::default()
        };

        let mut relation_branches = Vec::new();
        for path in self.registry.get_inheritances(object.model())? {
            let related = self.resolve_path(object, path).await?;
            let expansion = self.path_conditions(&mut walk, related).await?;
            relation_branches.push(AclCondition::Any(expansion.conditions));
        }

        if !relation_branches.is_empty() {
            branches.push(AclCondition::Any(relation_branches));
        }

        Ok(AclCondition::Any(branches))
    }

    fn path_conditions<'s>(
        &'s self,
        walk: &'s mut Walk,
        related: Option<ObjectRef>,
    ) -> BoxFuture<'s, AppResult<Expansion>> {
        Box::pin(async move {
            let Some(related) = related else {
                return Ok(Expansion {
                    conditions: vec![AclCondition::Unreachable],
                    cut: false,
                });
            };

            if walk.chain.contains(&related) {
                debug!(object = %related, "inheritance chain revisits an object");
                return Ok(Expansion::cut());
            }
            if walk.chain.len() > MAX_INHERITANCE_DEPTH {
                warn!(
                    object = %related,
                    limit = MAX_INHERITANCE_DEPTH,
                    "inheritance chain exceeds the depth limit"
                );
                return Ok(Expansion::cut());
            }
            if let Some(conditions) = walk.expanded.get(&related) {
                return Ok(Expansion {
                    conditions: conditions.clone(),
                    cut: false,
                });
            }

            walk.chain.push(related.clone());
            let mut conditions = vec![AclCondition::Granted(related.clone())];
            let mut relation_branches = Vec::new();
            let mut cut = false;
            for path in self.registry.get_inheritances(related.model())? {
                let next = self.resolve_path(&related, path).await?;
                let nested = self.path_conditions(&mut *walk, next).await?;
                cut |= nested.cut;
                relation_branches.push(AclCondition::All(nested.conditions));
            }
            walk.chain.pop();

            if !relation_branches.is_empty() {
                conditions.push(AclCondition::Any(relation_branches));
            }
            if !cut {
                walk.expanded.insert(related, conditions.clone());
            }

            Ok(Expansion { conditions, cut })
        })
    }

    pub(super) async fn resolve_path(
        &self,
        object: &ObjectRef,
        path: &RelationPath,
    ) -> AppResult<Option<ObjectRef>> {
        let mut current = object.clone();
        for hop in path.hops() {
            match self.resolver.resolve_related(&current, hop).await? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }
}
