//! Type signatures: the property names that identify a subtype.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::IntrospectionFailure;
use crate::{BeanType, RegistrationError};

/// The set of property names that must all be present in a JSON object for
/// a subtype to match.
///
/// Computed once, when the [`TypeMap`](crate::TypeMap) is built. Only
/// properties introduced between the subtype and its supertype count:
/// anything the supertype (or its ancestors) declares is shared by every
/// candidate and cannot discriminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    subtype: &'static BeanType,
    names: BTreeSet<&'static str>,
}

impl Signature {
    /// Derive the signature of `subtype` relative to `supertype`.
    ///
    /// Fails if `subtype` is not assignable to `supertype`, or if any type
    /// on the path between them declares a malformed property list.
    pub fn derive(
        subtype: &'static BeanType,
        supertype: &'static BeanType,
    ) -> Result<Self, RegistrationError> {
        if !subtype.is_assignable_to(supertype) {
            return Err(RegistrationError::NotAssignable {
                subtype: subtype.name(),
                supertype: supertype.name(),
            });
        }

        let mut shared: BTreeSet<&'static str> = BTreeSet::new();
        for ty in core::iter::once(supertype).chain(supertype.ancestors()) {
            shared.extend(checked_properties(ty)?);
        }

        let mut names = BTreeSet::new();
        let path = core::iter::once(subtype)
            .chain(subtype.ancestors())
            .take_while(|ty| *ty != supertype);
        for ty in path {
            for &name in checked_properties(ty)? {
                if !shared.contains(name) {
                    names.insert(name);
                }
            }
        }

        Ok(Self { subtype, names })
    }

    /// The subtype this signature identifies.
    pub fn subtype(&self) -> &'static BeanType {
        self.subtype
    }

    /// The discriminating property names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Number of discriminating properties.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True for a catch-all subtype with nothing to discriminate on.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if every name in the signature is a field of `tree`.
    ///
    /// Presence only: a field whose value is `null` still counts, a field
    /// that is absent does not. Non-object trees only satisfy the empty
    /// signature.
    pub fn matches(&self, tree: &Value) -> bool {
        self.names.iter().all(|name| has_field(tree, name))
    }

    /// Signature names that `tree` lacks.
    pub fn missing(&self, tree: &Value) -> Vec<&'static str> {
        self.names
            .iter()
            .filter(|name| !has_field(tree, name))
            .copied()
            .collect()
    }
}

/// Field-presence test on a decoded tree.
pub fn has_field(tree: &Value, name: &str) -> bool {
    tree.as_object().is_some_and(|object| object.contains_key(name))
}

fn checked_properties(
    ty: &'static BeanType,
) -> Result<&'static [&'static str], RegistrationError> {
    let properties = ty.properties();
    let mut seen = BTreeSet::new();
    for &name in properties {
        let failure = if name.is_empty() {
            Some(IntrospectionFailure::EmptyProperty)
        } else if !seen.insert(name) {
            Some(IntrospectionFailure::DuplicateProperty(name))
        } else {
            None
        };
        if let Some(failure) = failure {
            return Err(RegistrationError::Introspection {
                type_name: ty.name(),
                failure,
            });
        }
    }
    Ok(properties)
}
