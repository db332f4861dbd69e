//! Post-decode initialization hooks.

use core::any::Any;
use core::fmt;

use serde_json::Value;

use crate::{Bean, BeanType, Codec, DecodeError, InitializeError, JsonBean, Object};

/// A freshly decoded object, before it is handed to the caller.
pub struct Decoded {
    requested: &'static BeanType,
    resolved: &'static BeanType,
    object: Object,
}

impl Decoded {
    pub(crate) fn new(
        requested: &'static BeanType,
        resolved: &'static BeanType,
        object: Object,
    ) -> Self {
        Self {
            requested,
            resolved,
            object,
        }
    }

    /// The type decoding was asked for. The object is an instance of it.
    pub fn requested(&self) -> &'static BeanType {
        self.requested
    }

    /// The concrete type the tree was actually decoded as.
    pub fn resolved(&self) -> &'static BeanType {
        self.resolved
    }

    /// Borrow the object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Mutably borrow the object as `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.object.downcast_mut::<T>()
    }

    /// The object's [`JsonBean`], if the requested type declares one with
    /// [`BeanType::with_tree_slot`]. The resolved type's slot is not used.
    pub fn tree_slot(&mut self) -> Option<&mut JsonBean> {
        self.requested.tree_slot(self.object.as_mut())
    }

    /// Take the object out as `T`.
    pub fn into_inner<T: Bean>(self) -> Result<T, DecodeError> {
        let Decoded {
            requested,
            resolved,
            object,
        } = self;
        match object.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(DecodeError::TypeMismatch {
                expected: T::TYPE.name(),
                found: if requested == T::TYPE {
                    resolved.name()
                } else {
                    requested.name()
                },
            }),
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("requested", &self.requested.name())
            .field("resolved", &self.resolved.name())
            .finish_non_exhaustive()
    }
}

/// Runs once after each successful polymorphic decode.
///
/// `tree` is a deep copy of the tree the object was decoded from, so the
/// hook may keep it. Returning an error fails the whole decode; the object
/// is dropped, never returned half-initialized.
pub trait Initializer: Send + Sync {
    /// Finish initializing `object`.
    fn initialize(
        &self,
        object: &mut Decoded,
        codec: &Codec,
        tree: Value,
    ) -> Result<(), InitializeError> {
        let _ = (object, codec, tree);
        Ok(())
    }

    /// When false the codec skips the hook and the tree copy entirely.
    fn enabled(&self) -> bool {
        true
    }
}

/// The default hook: does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInitializer;

impl Initializer for NoopInitializer {
    fn enabled(&self) -> bool {
        false
    }
}

/// Stores the tree on beans that have a tree slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainTree;

impl Initializer for RetainTree {
    fn initialize(
        &self,
        object: &mut Decoded,
        _codec: &Codec,
        tree: Value,
    ) -> Result<(), InitializeError> {
        if let Some(bean) = object.tree_slot() {
            bean.retain(tree);
        }
        Ok(())
    }
}

/// Stores the tree and its canonical text on beans that have a tree slot.
///
/// The text is produced by [`Codec::to_text`], so it follows the codec's
/// formatting settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainText;

impl Initializer for RetainText {
    fn initialize(
        &self,
        object: &mut Decoded,
        codec: &Codec,
        tree: Value,
    ) -> Result<(), InitializeError> {
        if let Some(bean) = object.tree_slot() {
            bean.retain_text(codec.to_text(&tree)?);
            bean.retain(tree);
        }
        Ok(())
    }
}

/// Runs `A`, then `B`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chain<A, B>(pub A, pub B);

impl<A: Initializer, B: Initializer> Initializer for Chain<A, B> {
    fn initialize(
        &self,
        object: &mut Decoded,
        codec: &Codec,
        tree: Value,
    ) -> Result<(), InitializeError> {
        match (self.0.enabled(), self.1.enabled()) {
            (true, true) => {
                self.0.initialize(object, codec, tree.clone())?;
                self.1.initialize(object, codec, tree)
            }
            (true, false) => self.0.initialize(object, codec, tree),
            (false, true) => self.1.initialize(object, codec, tree),
            (false, false) => Ok(()),
        }
    }

    fn enabled(&self) -> bool {
        self.0.enabled() || self.1.enabled()
    }
}

/// A hook built from a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn")
    }
}

/// Build a hook from a closure.
///
/// ```rust
/// use polybind::{Codec, TypeMap, initialize};
///
/// let hook = initialize::from_fn(|object, _codec, tree| {
///     println!("{} decoded from {tree}", object.resolved());
///     Ok(())
/// });
/// let codec = Codec::builder(TypeMap::default()).initializer(hook).build();
/// # let _ = codec;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Decoded, &Codec, Value) -> Result<(), InitializeError> + Send + Sync,
{
    FromFn(f)
}

impl<F> Initializer for FromFn<F>
where
    F: Fn(&mut Decoded, &Codec, Value) -> Result<(), InitializeError> + Send + Sync,
{
    fn initialize(
        &self,
        object: &mut Decoded,
        codec: &Codec,
        tree: Value,
    ) -> Result<(), InitializeError> {
        (self.0)(object, codec, tree)
    }
}
