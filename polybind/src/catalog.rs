//! Qualified-name lookup of bean types.

use indexmap::IndexMap;

use crate::{Bean, BeanType, RegistrationError};

/// Name → type lookup used to resolve descriptor entries.
///
/// Names in a descriptor may be written relative to a default namespace:
/// with namespace `geo`, `Circle` is looked up as `geo::Circle` first and
/// only then as `Circle`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    namespace: Option<String>,
    types: IndexMap<&'static str, &'static BeanType>,
}

impl Catalog {
    /// An empty catalog with no default namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace relative names are resolved against.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add `T` and its ancestors.
    pub fn with<T: Bean>(mut self) -> Result<Self, RegistrationError> {
        self.add(T::TYPE)?;
        Ok(self)
    }

    /// Add a type and its ancestors.
    ///
    /// Adding the same type twice is harmless; adding a different type
    /// under a name that is already taken is an error.
    pub fn add(&mut self, ty: &'static BeanType) -> Result<(), RegistrationError> {
        for ty in core::iter::once(ty).chain(ty.ancestors()) {
            match self.types.get(ty.name()) {
                Some(existing) if same_declaration(existing, ty) => {}
                Some(_) => return Err(RegistrationError::DuplicateType { name: ty.name() }),
                None => {
                    self.types.insert(ty.name(), ty);
                }
            }
        }
        Ok(())
    }

    /// Look up a name, trying the default namespace first.
    pub fn resolve(&self, name: &str) -> Option<&'static BeanType> {
        if let Some(namespace) = &self.namespace {
            let qualified = format!("{namespace}::{name}");
            if let Some(&ty) = self.types.get(qualified.as_str()) {
                return Some(ty);
            }
        }
        self.types.get(name).copied()
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when no types are known.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Known types, in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &'static BeanType> + '_ {
        self.types.values().copied()
    }
}

fn same_declaration(a: &BeanType, b: &BeanType) -> bool {
    a.properties() == b.properties() && a.parent().map(BeanType::name) == b.parent().map(BeanType::name)
}
