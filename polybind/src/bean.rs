//! Static type metadata for decodable beans.
//!
//! A [`BeanType`] plays the role a runtime class descriptor plays elsewhere:
//! it names a type, points at its declared parent, lists the properties the
//! type itself introduces, and knows how to decode a [`Value`] into an
//! instance. Everything is built in `const` context, so a `BeanType` lives
//! for the whole program and can be shared freely between threads.

use core::any::Any;
use core::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::JsonBean;

/// A decoded object whose concrete type is only known at runtime.
pub type Object = Box<dyn Any + Send>;

type DecodeFn = fn(Value) -> Result<Object, serde_json::Error>;

/// Converts a boxed subtype into a boxed instance of its parent. Hands the
/// object back untouched if it is not of the expected type.
type UpcastFn = fn(Object) -> Result<Object, Object>;

type TreeSlotFn = for<'a> fn(&'a mut (dyn Any + Send)) -> Option<&'a mut JsonBean>;

/// A Rust type that can take part in polymorphic decoding.
///
/// # Example
///
/// ```rust
/// use polybind::{Bean, BeanType};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct ShapeFields {
///     color: Option<String>,
/// }
///
/// #[derive(Debug, Deserialize)]
/// struct Circle {
///     radius: f64,
/// }
///
/// #[derive(Debug)]
/// enum Shape {
///     Circle(Circle),
///     Plain(ShapeFields),
/// }
///
/// impl From<Circle> for Shape {
///     fn from(c: Circle) -> Self {
///         Shape::Circle(c)
///     }
/// }
///
/// impl From<ShapeFields> for Shape {
///     fn from(f: ShapeFields) -> Self {
///         Shape::Plain(f)
///     }
/// }
///
/// impl Bean for Shape {
///     const TYPE: &'static BeanType =
///         &BeanType::root_as::<Shape, ShapeFields>("geo::Shape", &["color"]);
/// }
///
/// impl Bean for Circle {
///     const TYPE: &'static BeanType =
///         &BeanType::subtype::<Circle, Shape>("geo::Circle", &["radius"]);
/// }
///
/// assert!(Circle::TYPE.is_assignable_to(Shape::TYPE));
/// assert!(!Shape::TYPE.is_assignable_to(Circle::TYPE));
/// ```
pub trait Bean: Send + Sized + 'static {
    /// Metadata describing this type.
    const TYPE: &'static BeanType;
}

/// Static metadata for one bean type.
pub struct BeanType {
    name: &'static str,
    parent: Option<&'static BeanType>,
    properties: &'static [&'static str],
    decode: DecodeFn,
    upcast: Option<UpcastFn>,
    tree_slot: Option<TreeSlotFn>,
}

impl BeanType {
    /// A root type whose own shape is `T` itself.
    pub const fn root<T>(name: &'static str, properties: &'static [&'static str]) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::root_as::<T, T>(name, properties)
    }

    /// A root type that, when no subtype matches, is decoded through `Own`
    /// and converted into `T`.
    ///
    /// This is the usual shape for an enum supertype: one variant per
    /// subtype plus a variant carrying `Own`, the fields the supertype
    /// declares itself.
    pub const fn root_as<T, Own>(name: &'static str, properties: &'static [&'static str]) -> Self
    where
        T: Send + 'static,
        Own: DeserializeOwned + Into<T>,
    {
        Self {
            name,
            parent: None,
            properties,
            decode: decode_into::<T, Own>,
            upcast: None,
            tree_slot: None,
        }
    }

    /// A root type that cannot be decoded on its own: when no subtype
    /// matches, decoding fails.
    pub const fn abstract_root<T>(name: &'static str, properties: &'static [&'static str]) -> Self
    where
        T: Send + 'static,
    {
        Self {
            name,
            parent: None,
            properties,
            decode: decode_abstract,
            upcast: None,
            tree_slot: None,
        }
    }

    /// A subtype of `P` decoded directly as `T`.
    pub const fn subtype<T, P>(name: &'static str, properties: &'static [&'static str]) -> Self
    where
        T: DeserializeOwned + Into<P> + Send + 'static,
        P: Bean,
    {
        Self::subtype_as::<T, T, P>(name, properties)
    }

    /// A subtype of `P` that is decoded through `Own`.
    ///
    /// Used for intermediate types that are themselves supertypes of
    /// something else.
    pub const fn subtype_as<T, Own, P>(
        name: &'static str,
        properties: &'static [&'static str],
    ) -> Self
    where
        T: Into<P> + Send + 'static,
        Own: DeserializeOwned + Into<T>,
        P: Bean,
    {
        Self {
            name,
            parent: Some(P::TYPE),
            properties,
            decode: decode_into::<T, Own>,
            upcast: Some(upcast_into::<T, P>),
            tree_slot: None,
        }
    }

    /// An intermediate type with no generic shape of its own.
    pub const fn abstract_subtype<T, P>(
        name: &'static str,
        properties: &'static [&'static str],
    ) -> Self
    where
        T: Into<P> + Send + 'static,
        P: Bean,
    {
        Self {
            name,
            parent: Some(P::TYPE),
            properties,
            decode: decode_abstract,
            upcast: Some(upcast_into::<T, P>),
            tree_slot: None,
        }
    }

    /// Declare that decoded `T` values carry a [`JsonBean`] the
    /// initialization hooks can fill in.
    ///
    /// Hooks run after the object has been upcast to the requested type, so
    /// only the slot of the type decoding was asked for is consulted. Declare
    /// it on the supertype; a slot declared on a subtype alone is never seen.
    pub const fn with_tree_slot<T>(mut self) -> Self
    where
        T: crate::TreeBacked + Send + 'static,
    {
        self.tree_slot = Some(tree_slot_of::<T>);
        self
    }

    /// Fully qualified name, e.g. `geo::Circle`.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name without its module path.
    pub fn simple_name(&self) -> &'static str {
        let name = self.name;
        match name.rfind("::") {
            Some(idx) => &name[idx + 2..],
            None => name,
        }
    }

    /// Declared parent type, if any.
    pub const fn parent(&self) -> Option<&'static BeanType> {
        self.parent
    }

    /// Properties this type declares itself (not its ancestors').
    pub const fn properties(&self) -> &'static [&'static str] {
        self.properties
    }

    /// Walk the parent chain, starting with the parent.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors { next: self.parent }
    }

    /// True when `supertype` is this type or one of its ancestors.
    pub fn is_assignable_to(&self, supertype: &BeanType) -> bool {
        self == supertype || self.ancestors().any(|a| a == supertype)
    }

    pub(crate) fn decode(&self, tree: Value) -> Result<Object, serde_json::Error> {
        (self.decode)(tree)
    }

    pub(crate) fn upcast_fn(&self) -> Option<UpcastFn> {
        self.upcast
    }

    pub(crate) fn tree_slot<'a>(&self, object: &'a mut (dyn Any + Send)) -> Option<&'a mut JsonBean> {
        self.tree_slot.and_then(|slot| slot(object))
    }
}

impl PartialEq for BeanType {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other) || self.name == other.name
    }
}

impl Eq for BeanType {}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanType")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("properties", &self.properties)
            .finish()
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a type's ancestors, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<&'static BeanType>,
}

impl Iterator for Ancestors {
    type Item = &'static BeanType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

fn decode_into<T, Own>(tree: Value) -> Result<Object, serde_json::Error>
where
    T: Send + 'static,
    Own: DeserializeOwned + Into<T>,
{
    let own: Own = serde_json::from_value(tree)?;
    Ok(Box::new(own.into()))
}

fn decode_abstract(_tree: Value) -> Result<Object, serde_json::Error> {
    Err(<serde_json::Error as serde::de::Error>::custom(
        "abstract type has no shape of its own",
    ))
}

fn upcast_into<T, P>(object: Object) -> Result<Object, Object>
where
    T: Into<P> + Send + 'static,
    P: Send + 'static,
{
    let value = object.downcast::<T>()?;
    Ok(Box::new(Into::<P>::into(*value)))
}

fn tree_slot_of<T>(object: &mut (dyn Any + Send)) -> Option<&mut JsonBean>
where
    T: crate::TreeBacked + Send + 'static,
{
    object.downcast_mut::<T>().map(T::bean_mut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_types::{Animal, Cat, Dog, Puppy};

    #[test]
    fn names_and_ancestry() {
        assert_eq!(Puppy::TYPE.name(), "zoo::Puppy");
        assert_eq!(Puppy::TYPE.simple_name(), "Puppy");
        let chain: Vec<_> = Puppy::TYPE.ancestors().map(BeanType::name).collect();
        assert_eq!(chain, ["zoo::Dog", "zoo::Animal"]);
    }

    #[test]
    fn assignability_follows_parent_chain() {
        assert!(Puppy::TYPE.is_assignable_to(Animal::TYPE));
        assert!(Puppy::TYPE.is_assignable_to(Dog::TYPE));
        assert!(Dog::TYPE.is_assignable_to(Dog::TYPE));
        assert!(!Dog::TYPE.is_assignable_to(Cat::TYPE));
        assert!(!Animal::TYPE.is_assignable_to(Dog::TYPE));
    }

    #[test]
    fn upcast_wraps_into_parent() {
        let upcast = Dog::TYPE.upcast_fn().unwrap();
        let object: Object = Box::new(Dog {
            name: "rex".into(),
            barks: true,
        });
        let animal = upcast(object).unwrap().downcast::<Animal>().unwrap();
        assert!(matches!(*animal, Animal::Dog(_)));
    }

    #[test]
    fn upcast_rejects_foreign_object() {
        let upcast = Dog::TYPE.upcast_fn().unwrap();
        let object: Object = Box::new(42u32);
        assert!(upcast(object).is_err());
    }

    #[test]
    fn abstract_decode_fails() {
        let err = crate::test_types::Creature::TYPE
            .decode(serde_json::json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("abstract"));
    }
}
