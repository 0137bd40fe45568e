use std::collections::{BTreeMap, BTreeSet};

use custodia_core::{AppError, AppResult};
use custodia_domain::{ModelType, Permission, PermissionId, PermissionNamespace, RelationPath};

mod builder;


pub use builder::ModelPermissionRegistryBuilder;

/// Immutable catalogue of permissions, per-model permission sets and
/// inheritance paths.
///
/// Populated once through [`ModelPermissionRegistryBuilder`] before traffic is
/// accepted and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelPermissionRegistry {
    namespaces: BTreeMap<String, PermissionNamespace>,
    permissions: BTreeMap<PermissionId, Permission>,
    model_permissions: BTreeMap<ModelType, BTreeSet<PermissionId>>,
    inheritances: BTreeMap<ModelType, Vec<RelationPath>>,
    proxies: BTreeMap<ModelType, ModelType>,
}

impl ModelPermissionRegistry {
    /// Starts a new registry builder.
    #[must_use]
    pub fn builder() -> ModelPermissionRegistryBuilder {
        ModelPermissionRegistryBuilder::new()
    }

    /// Returns the permissions registered for a model type.
    ///
    /// Unknown model types yield an empty set.
    #[must_use]
    pub fn get_for_class(&self, model: &ModelType) -> BTreeSet<PermissionId> {
        self.model_permissions
            .get(self.resolve_proxy(model))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns whether the permission is meaningful for objects of the type.
    #[must_use]
    pub fn is_applicable(&self, model: &ModelType, permission: &PermissionId) -> bool {
        self.model_permissions
            .get(self.resolve_proxy(model))
            .is_some_and(|permissions| permissions.contains(permission))
    }

    /// Returns the inheritance paths declared for a model type.
    ///
    /// A registered type without inheritance yields an empty slice; a type the
    /// registry never saw is reported as [`AppError::UnknownModel`].
    pub fn get_inheritances(&self, model: &ModelType) -> AppResult<&[RelationPath]> {
        let model = self.resolve_proxy(model);
        if let Some(paths) = self.inheritances.get(model) {
            return Ok(paths.as_slice());
        }

        if self.model_permissions.contains_key(model) {
            return Ok(&[]);
        }

        Err(AppError::UnknownModel(model.to_string()))
    }

    /// Returns whether the model type was declared through any registration.
    #[must_use]
    pub fn is_registered(&self, model: &ModelType) -> bool {
        let model = self.resolve_proxy(model);
        self.model_permissions.contains_key(model) || self.inheritances.contains_key(model)
    }

    /// Lists every model type known to the registry, proxies included.
    #[must_use]
    pub fn get_classes(&self) -> BTreeSet<ModelType> {
        self.model_permissions
            .keys()
            .chain(self.inheritances.keys())
            .chain(self.proxies.keys())
            .cloned()
            .collect()
    }

    /// Finds a declared permission.
    #[must_use]
    pub fn permission(&self, id: &PermissionId) -> Option<&Permission> {
        self.permissions.get(id)
    }

    /// Returns the declared permission or a validation error.
    pub fn validate_permission(&self, id: &PermissionId) -> AppResult<&Permission> {
        self.permissions
            .get(id)
            .ok_or_else(|| AppError::Validation(format!("unknown permission '{id}'")))
    }

    /// Iterates over every declared permission ordered by identifier.
    pub fn all_permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    /// Iterates over every declared namespace ordered by name.
    pub fn namespaces(&self) -> impl Iterator<Item = &PermissionNamespace> {
        self.namespaces.values()
    }

    /// Iterates over the permissions declared inside one namespace.
    pub fn permissions_in_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Permission> + 'a {
        self.permissions
            .values()
            .filter(move |permission| permission.id().namespace() == namespace)
    }

    fn resolve_proxy<'a>(&'a self, model: &'a ModelType) -> &'a ModelType {
        self.proxies.get(model).unwrap_or(model)
    }
}
