use tracing::debug;

use super::*;

/// Collects permission and inheritance declarations during startup.
#[derive(Debug, Default)]
pub struct ModelPermissionRegistryBuilder {
    registry: ModelPermissionRegistry,
}

impl ModelPermissionRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a permission namespace.
    ///
    /// Declaring the same namespace twice with the same label is a no-op.
    pub fn register_namespace(
        &mut self,
        name: &str,
        label: &str,
    ) -> AppResult<PermissionNamespace> {
        let namespace = PermissionNamespace::new(name, label)?;
        match self.registry.namespaces.get(namespace.name()) {
            Some(existing) if existing.label() != namespace.label() => {
                Err(AppError::Conflict(format!(
                    "permission namespace '{}' is already declared as '{}'",
                    existing.name(),
                    existing.label()
                )))
            }
            Some(existing) => Ok(existing.clone()),
            None => {
                self.registry
                    .namespaces
                    .insert(namespace.name().to_owned(), namespace.clone());
                Ok(namespace)
            }
        }
    }

    /// Declares a permission inside an already declared namespace.
    pub fn register_permission(
        &mut self,
        namespace: &PermissionNamespace,
        name: &str,
        label: &str,
    ) -> AppResult<PermissionId> {
        if !self.registry.namespaces.contains_key(namespace.name()) {
            return Err(AppError::Validation(format!(
                "permission namespace '{}' must be declared before its permissions",
                namespace.name()
            )));
        }

        let permission = Permission::new(namespace, name, label)?;
        let id = permission.id().clone();
        match self.registry.permissions.get(&id) {
            Some(existing) if existing.label() != permission.label() => {
                Err(AppError::Conflict(format!(
                    "permission '{id}' is already declared as '{}'",
                    existing.label()
                )))
            }
            Some(_) => Ok(id),
            None => {
                self.registry.permissions.insert(id.clone(), permission);
                Ok(id)
            }
        }
    }

    /// Associates declared permissions with a model type.
    pub fn register(
        &mut self,
        model: &ModelType,
        permissions: &[PermissionId],
    ) -> AppResult<&mut Self> {
        if let Some(unknown) = permissions
            .iter()
            .find(|permission| !self.registry.permissions.contains_key(permission))
        {
            return Err(AppError::Validation(format!(
                "cannot register undeclared permission '{unknown}' for model '{model}'"
            )));
        }

        self.ensure_not_proxy(model)?;
        self.registry
            .model_permissions
            .entry(model.clone())
            .or_default()
            .extend(permissions.iter().cloned());
        debug!(model = %model, count = permissions.len(), "registered model permissions");

        Ok(self)
    }

    /// Declares that objects of `model` inherit entries through `relation`.
    pub fn register_inheritance(
        &mut self,
        model: &ModelType,
        relation: &str,
    ) -> AppResult<&mut Self> {
        let path = RelationPath::parse(relation)?;
        self.ensure_not_proxy(model)?;

        let paths = self
            .registry
            .inheritances
            .entry(model.clone())
            .or_default();
        if !paths.contains(&path) {
            debug!(model = %model, relation = %path, "registered inheritance path");
            paths.push(path);
        }

        Ok(self)
    }

    /// Makes `proxy` share the permissions and inheritance of `base`.
    pub fn register_proxy(&mut self, proxy: &ModelType, base: &ModelType) -> AppResult<&mut Self> {
        if proxy == base {
            return Err(AppError::Validation(format!(
                "model '{proxy}' cannot proxy itself"
            )));
        }

        if self.registry.proxies.contains_key(base) {
            return Err(AppError::Validation(format!(
                "model '{base}' is itself a proxy and cannot be proxied"
            )));
        }

        if self.registry.model_permissions.contains_key(proxy)
            || self.registry.inheritances.contains_key(proxy)
        {
            return Err(AppError::Conflict(format!(
                "model '{proxy}' already has its own registrations"
            )));
        }

        self.registry.proxies.insert(proxy.clone(), base.clone());
        Ok(self)
    }

    /// Freezes the declarations.
    #[must_use]
    pub fn build(self) -> ModelPermissionRegistry {
        self.registry
    }

    fn ensure_not_proxy(&self, model: &ModelType) -> AppResult<()> {
        match self.registry.proxies.get(model) {
            Some(base) => Err(AppError::Conflict(format!(
                "model '{model}' is a proxy of '{base}'; register on the base model"
            ))),
            None => Ok(()),
        }
    }
}
