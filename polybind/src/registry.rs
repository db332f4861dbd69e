//! The polymorphic type map: supertype → ordered candidate subtypes.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::resolver::{self, Resolved};
use crate::{
    Bean, BeanType, CandidateOrder, Catalog, Descriptor, RegistrationError, Signature,
};

/// One supertype with its candidates and their signatures.
#[derive(Debug, Clone)]
pub struct Entry {
    supertype: &'static BeanType,
    candidates: Vec<Signature>,
}

impl Entry {
    /// The supertype this entry serves.
    pub fn supertype(&self) -> &'static BeanType {
        self.supertype
    }

    /// Candidate signatures, in resolution order.
    pub fn candidates(&self) -> &[Signature] {
        &self.candidates
    }

    /// Candidate subtypes, in resolution order.
    pub fn subtypes(&self) -> impl Iterator<Item = &'static BeanType> + '_ {
        self.candidates.iter().map(Signature::subtype)
    }

    /// Run the resolver over this entry's candidates.
    pub fn resolve(&self, tree: &Value) -> Resolved {
        resolver::resolve(tree, &self.candidates)
    }
}

/// Immutable map from supertypes to their candidate subtypes.
///
/// Built once through [`TypeMapBuilder`], then only read. Safe to share
/// across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    entries: IndexMap<&'static str, Entry>,
}

impl TypeMap {
    /// Start building a map.
    pub fn builder() -> TypeMapBuilder {
        TypeMapBuilder::default()
    }

    /// True if `supertype` has an entry.
    pub fn contains(&self, supertype: &BeanType) -> bool {
        self.entries.contains_key(supertype.name())
    }

    /// The entry for `supertype`, if it is polymorphic.
    pub fn entry(&self, supertype: &BeanType) -> Option<&Entry> {
        self.entries.get(supertype.name())
    }

    /// Candidate subtypes of `supertype` in resolution order; empty when
    /// `supertype` has no entry.
    pub fn subtypes_for(&self, supertype: &BeanType) -> Vec<&'static BeanType> {
        self.entry(supertype)
            .map(|entry| entry.subtypes().collect())
            .unwrap_or_default()
    }

    /// Resolve `tree` against `supertype`'s candidates.
    ///
    /// A type with no entry always resolves to [`Resolved::Fallback`].
    pub fn resolve(&self, tree: &Value, supertype: &BeanType) -> Resolved {
        match self.entry(supertype) {
            Some(entry) => entry.resolve(tree),
            None => Resolved::Fallback,
        }
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Number of supertypes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no supertype is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Pending = IndexMap<&'static str, (&'static BeanType, Vec<&'static BeanType>)>;

/// Collects registrations and validates them into a [`TypeMap`].
///
/// Every method consumes the builder, so once a registration is rejected
/// there is nothing left to build from.
#[derive(Debug, Default)]
pub struct TypeMapBuilder {
    pending: Pending,
    order: CandidateOrder,
}

impl TypeMapBuilder {
    /// Choose how candidate lists are ordered.
    pub fn order(mut self, order: CandidateOrder) -> Self {
        self.order = order;
        self
    }

    /// Register `subtypes` as candidates for `supertype`.
    ///
    /// Registering the same supertype again appends to its list; subtypes
    /// already present keep their original position.
    pub fn register(
        mut self,
        supertype: &'static BeanType,
        subtypes: &[&'static BeanType],
    ) -> Result<Self, RegistrationError> {
        for subtype in subtypes {
            if !subtype.is_assignable_to(supertype) {
                return Err(RegistrationError::NotAssignable {
                    subtype: subtype.name(),
                    supertype: supertype.name(),
                });
            }
        }

        let (_, list) = self
            .pending
            .entry(supertype.name())
            .or_insert_with(|| (supertype, Vec::new()));
        for &subtype in subtypes {
            if !list.contains(&subtype) {
                list.push(subtype);
            }
        }
        Ok(self)
    }

    /// Typed shorthand for registering a single subtype.
    pub fn subtype<Super: Bean, Sub: Bean>(self) -> Result<Self, RegistrationError> {
        self.register(Super::TYPE, &[Sub::TYPE])
    }

    /// Register every declaration in `descriptor`, resolving names
    /// through `catalog`.
    pub fn descriptor(
        mut self,
        descriptor: &Descriptor,
        catalog: &Catalog,
    ) -> Result<Self, RegistrationError> {
        for entry in descriptor.entries() {
            let lookup = |name: &str| {
                catalog
                    .resolve(name)
                    .ok_or_else(|| RegistrationError::UnknownType {
                        name: name.to_string(),
                        line: entry.line,
                    })
            };
            let supertype = lookup(&entry.supertype)?;
            let subtypes = entry
                .subtypes
                .iter()
                .map(|name| lookup(name))
                .collect::<Result<Vec<_>, _>>()?;
            self = self.register(supertype, &subtypes)?;
        }
        Ok(self)
    }

    /// Derive every signature, reject cycles, and freeze the map.
    pub fn build(self) -> Result<TypeMap, RegistrationError> {
        let mut entries = IndexMap::with_capacity(self.pending.len());

        for (name, pending) in &self.pending {
            let (supertype, subtypes) = (pending.0, &pending.1);
            let mut candidates = subtypes
                .iter()
                .map(|&subtype| Signature::derive(subtype, supertype))
                .collect::<Result<Vec<_>, _>>()?;
            if self.order == CandidateOrder::Name {
                candidates.sort_by_key(|candidate| candidate.subtype().name());
            }
            for candidate in &candidates {
                if candidate.is_empty() {
                    tracing::debug!(
                        supertype = supertype.name(),
                        subtype = candidate.subtype().name(),
                        "candidate has an empty signature and matches every object"
                    );
                }
            }
            entries.insert(
                *name,
                Entry {
                    supertype,
                    candidates,
                },
            );
        }

        check_cycles(&self.pending)?;

        tracing::debug!(
            supertypes = entries.len(),
            order = ?self.order,
            "built type map"
        );
        Ok(TypeMap { entries })
    }
}

/// Depth-first search for a supertype that can resolve back to itself.
fn check_cycles(pending: &Pending) -> Result<(), RegistrationError> {
    let mut done: BTreeSet<&'static str> = BTreeSet::new();
    for &start in pending.keys() {
        let mut path = Vec::new();
        visit(start, pending, &mut path, &mut done)?;
    }
    Ok(())
}

fn visit(
    node: &'static str,
    pending: &Pending,
    path: &mut Vec<&'static str>,
    done: &mut BTreeSet<&'static str>,
) -> Result<(), RegistrationError> {
    if let Some(pos) = path.iter().position(|&n| n == node) {
        let mut cycle = path[pos..].to_vec();
        cycle.push(node);
        return Err(RegistrationError::Cycle { path: cycle });
    }
    if done.contains(node) {
        return Ok(());
    }
    let Some((_, subtypes)) = pending.get(node) else {
        done.insert(node);
        return Ok(());
    };
    path.push(node);
    for subtype in subtypes {
        visit(subtype.name(), pending, path, done)?;
    }
    path.pop();
    done.insert(node);
    Ok(())
}
