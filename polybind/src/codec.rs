//! The decode interception layer.
//!
//! A [`Codec`] sits between callers and serde. Every decode of a [`Bean`]
//! type goes through [`Codec::decode_tree`]: if the requested type is a
//! registered supertype, the tree is resolved against its candidates and
//! decoded as the chosen subtype, recursively, then converted back up to
//! the requested type. Anything else is handed to serde unchanged.
//!
//! Nested polymorphic fields are reached through
//! [`deserialize_polymorphic`], which finds the active codec in a
//! thread-local scope stack pushed for the duration of each decode call.

use core::cell::RefCell;
use core::fmt;
use std::io::Read;
use std::sync::{Arc, OnceLock};

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::{self, NoMatchReport, Resolved};
use crate::{
    Bean, BeanType, CodecConfig, DecodeError, Decoded, Initializer, NoopInitializer, Object,
    TypeMap,
};

static INSTALLED: OnceLock<Codec> = OnceLock::new();

thread_local! {
    static SCOPE: RefCell<Vec<Codec>> = const { RefCell::new(Vec::new()) };
}

/// Decodes JSON into [`Bean`] types, resolving registered supertypes to
/// their concrete subtypes.
///
/// Cheap to clone; clones share the same map, configuration, and hook.
/// A codec is immutable once built and can be used from any number of
/// threads at once.
#[derive(Clone)]
pub struct Codec {
    inner: Arc<Inner>,
}

struct Inner {
    types: TypeMap,
    config: CodecConfig,
    initializer: Box<dyn Initializer>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("types", &self.inner.types)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Codec`].
pub struct CodecBuilder {
    types: TypeMap,
    config: CodecConfig,
    initializer: Box<dyn Initializer>,
}

impl CodecBuilder {
    /// Replace the default configuration.
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the hook run after each polymorphic decode.
    pub fn initializer(mut self, initializer: impl Initializer + 'static) -> Self {
        self.initializer = Box::new(initializer);
        self
    }

    /// Finish building.
    pub fn build(self) -> Codec {
        tracing::debug!(
            supertypes = self.types.len(),
            max_depth = self.config.depth_limit(),
            hook = self.initializer.enabled(),
            "built codec"
        );
        Codec {
            inner: Arc::new(Inner {
                types: self.types,
                config: self.config,
                initializer: self.initializer,
            }),
        }
    }
}

impl fmt::Debug for CodecBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecBuilder")
            .field("types", &self.types)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What one decode call reads from. Materialized into a tree exactly once.
enum Input<'a> {
    Text(&'a [u8]),
    Reader(Box<dyn Read + 'a>),
    Tree(Value),
}

impl Input<'_> {
    fn materialize(self) -> Result<Value, DecodeError> {
        match self {
            Input::Text(bytes) => serde_json::from_slice(bytes).map_err(DecodeError::Parse),
            Input::Reader(reader) => serde_json::from_reader(reader).map_err(DecodeError::Parse),
            Input::Tree(tree) => Ok(tree),
        }
    }
}

/// Marks a codec as active on this thread until dropped.
struct Scope(());

impl Scope {
    fn enter(codec: &Codec, type_name: &'static str) -> Result<Self, DecodeError> {
        let limit = codec.inner.config.depth_limit();
        SCOPE.with_borrow_mut(|stack| {
            if stack.len() >= limit {
                return Err(DecodeError::DepthExceeded { type_name, limit });
            }
            stack.push(codec.clone());
            Ok(Scope(()))
        })
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        SCOPE.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

impl Codec {
    /// A codec over `types` with default settings and no hook.
    pub fn new(types: TypeMap) -> Self {
        Self::builder(types).build()
    }

    /// Start configuring a codec over `types`.
    pub fn builder(types: TypeMap) -> CodecBuilder {
        CodecBuilder {
            types,
            config: CodecConfig::default(),
            initializer: Box::new(NoopInitializer),
        }
    }

    /// The type map this codec resolves against.
    pub fn types(&self) -> &TypeMap {
        &self.inner.types
    }

    /// This codec's settings.
    pub fn config(&self) -> &CodecConfig {
        &self.inner.config
    }

    /// Make this codec the process-wide default for
    /// [`deserialize_polymorphic`] calls made outside any decode scope.
    ///
    /// Can only be done once; a second call hands the codec back.
    pub fn install(self) -> Result<(), Codec> {
        INSTALLED.set(self)
    }

    /// The process-wide default codec, if one was installed.
    pub fn installed() -> Option<&'static Codec> {
        INSTALLED.get()
    }

    /// The codec driving the innermost decode on this thread, or else the
    /// installed default.
    pub fn current() -> Option<Codec> {
        SCOPE
            .with_borrow(|stack| stack.last().cloned())
            .or_else(|| INSTALLED.get().cloned())
    }

    /// Parse text into a generic tree.
    pub fn read_tree(&self, text: &[u8]) -> Result<Value, DecodeError> {
        Input::Text(text).materialize()
    }

    /// Convert any serializable value into a generic tree.
    pub fn tree_for<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value)
    }

    /// Canonical text for a tree, indented if the codec is configured to.
    pub fn to_text(&self, tree: &Value) -> Result<String, serde_json::Error> {
        if self.inner.config.is_pretty() {
            serde_json::to_string_pretty(tree)
        } else {
            serde_json::to_string(tree)
        }
    }

    /// Resolve `tree` against `supertype` without decoding it.
    pub fn resolve(&self, tree: &Value, supertype: &BeanType) -> Resolved {
        self.inner.types.resolve(tree, supertype)
    }

    /// Decode JSON text as `T`.
    pub fn decode_str<T: Bean>(&self, text: &str) -> Result<T, DecodeError> {
        self.decode_input(Input::Text(text.as_bytes()))
    }

    /// Decode JSON bytes as `T`.
    pub fn decode_slice<T: Bean>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        self.decode_input(Input::Text(bytes))
    }

    /// Decode JSON read from `reader` as `T`.
    pub fn decode_reader<T: Bean, R: Read>(&self, reader: R) -> Result<T, DecodeError> {
        self.decode_input(Input::Reader(Box::new(reader)))
    }

    /// Decode an already parsed tree as `T`.
    pub fn decode_tree<T: Bean>(&self, tree: Value) -> Result<T, DecodeError> {
        self.decode_input(Input::Tree(tree))
    }

    /// Decode `tree` as the type `ty` describes, without naming it statically.
    pub fn decode_value(&self, tree: Value, ty: &'static BeanType) -> Result<Decoded, DecodeError> {
        self.decode_object(Input::Tree(tree), ty)
    }

    /// Decode plain serde types with this codec in scope, so that
    /// polymorphic fields anywhere inside `T` resolve through it.
    pub fn from_str<T: DeserializeOwned>(&self, text: &str) -> Result<T, DecodeError> {
        self.scoped(|| serde_json::from_str(text))
    }

    /// Like [`Codec::from_str`], from bytes.
    pub fn from_slice<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        self.scoped(|| serde_json::from_slice(bytes))
    }

    /// Like [`Codec::from_str`], from a reader.
    pub fn from_reader<T: DeserializeOwned, R: Read>(&self, reader: R) -> Result<T, DecodeError> {
        self.scoped(|| serde_json::from_reader(reader))
    }

    /// Like [`Codec::from_str`], from a parsed tree.
    pub fn from_value<T: DeserializeOwned>(&self, tree: Value) -> Result<T, DecodeError> {
        self.scoped(|| serde_json::from_value(tree))
    }

    fn scoped<T>(
        &self,
        decode: impl FnOnce() -> Result<T, serde_json::Error>,
    ) -> Result<T, DecodeError> {
        let type_name = core::any::type_name::<T>();
        let _scope = Scope::enter(self, type_name)?;
        decode().map_err(|source| match source.classify() {
            serde_json::error::Category::Data => DecodeError::Decode { type_name, source },
            _ => DecodeError::Parse(source),
        })
    }

    fn decode_input<T: Bean>(&self, input: Input<'_>) -> Result<T, DecodeError> {
        self.decode_object(input, T::TYPE)?.into_inner::<T>()
    }

    fn decode_object(
        &self,
        input: Input<'_>,
        ty: &'static BeanType,
    ) -> Result<Decoded, DecodeError> {
        let _scope = Scope::enter(self, ty.name())?;
        let tree = input.materialize()?;

        let hook = &self.inner.initializer;
        let retained = (self.inner.types.contains(ty) && hook.enabled()).then(|| tree.clone());

        let (object, resolved) = self.dispatch(tree, ty, 0)?;
        let mut decoded = Decoded::new(ty, resolved, object);

        if let Some(tree) = retained {
            hook.initialize(&mut decoded, self, tree)
                .map_err(|source| {
                    tracing::debug!(type_name = ty.name(), %source, "initialization failed");
                    DecodeError::Initialize {
                        type_name: ty.name(),
                        source,
                    }
                })?;
        }
        Ok(decoded)
    }

    /// Decode `tree` as `ty`, following registered subtypes.
    ///
    /// Returns the object, already converted to `ty`, together with the
    /// concrete type it was decoded as.
    fn dispatch(
        &self,
        tree: Value,
        ty: &'static BeanType,
        depth: usize,
    ) -> Result<(Object, &'static BeanType), DecodeError> {
        let limit = self.inner.config.depth_limit();
        if depth >= limit {
            return Err(DecodeError::DepthExceeded {
                type_name: ty.name(),
                limit,
            });
        }

        let Some(entry) = self.inner.types.entry(ty) else {
            let object = ty.decode(tree).map_err(|source| DecodeError::Decode {
                type_name: ty.name(),
                source,
            })?;
            return Ok((object, ty));
        };

        match entry.resolve(&tree) {
            Resolved::Subtype(subtype) => {
                tracing::debug!(
                    supertype = ty.name(),
                    subtype = subtype.name(),
                    depth,
                    "resolved subtype"
                );
                let (object, concrete) = self.dispatch(tree, subtype, depth + 1)?;
                Ok((upcast(object, subtype, ty)?, concrete))
            }
            Resolved::Fallback => {
                tracing::debug!(supertype = ty.name(), depth, "no subtype matched");
                let fields = resolver::field_names(&tree);
                match ty.decode(tree) {
                    Ok(object) => Ok((object, ty)),
                    Err(source) => Err(DecodeError::Fallback {
                        supertype: ty.name(),
                        source,
                        report: Box::new(NoMatchReport::from_fields(
                            fields,
                            ty,
                            entry.candidates(),
                        )),
                    }),
                }
            }
        }
    }
}

/// Convert an object of type `from` into `to`, one parent at a time.
fn upcast(
    mut object: Object,
    from: &'static BeanType,
    to: &'static BeanType,
) -> Result<Object, DecodeError> {
    let mut current = from;
    while current != to {
        let mismatch = DecodeError::TypeMismatch {
            expected: to.name(),
            found: current.name(),
        };
        let (Some(parent), Some(step)) = (current.parent(), current.upcast_fn()) else {
            return Err(mismatch);
        };
        object = step(object).map_err(|_| mismatch)?;
        current = parent;
    }
    Ok(object)
}

/// Deserialize a polymorphic field through the active [`Codec`].
///
/// Use it as a `deserialize_with` target, or from a hand-written
/// `Deserialize` impl on the supertype:
///
/// ```rust
/// use polybind::{Bean, deserialize_polymorphic};
/// use serde::Deserialize;
/// # use polybind::BeanType;
/// # #[derive(Deserialize)]
/// # struct Shape { color: Option<String> }
/// # impl Bean for Shape {
/// #     const TYPE: &'static BeanType = &BeanType::root::<Shape>("geo::Shape", &["color"]);
/// # }
///
/// #[derive(Deserialize)]
/// struct Drawing {
///     #[serde(deserialize_with = "deserialize_polymorphic")]
///     background: Shape,
/// }
/// ```
///
/// The codec is the one driving the enclosing decode call on this thread,
/// or the [installed](Codec::install) default. With neither, this fails.
pub fn deserialize_polymorphic<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Bean,
{
    let tree = Value::deserialize(deserializer)?;
    let codec = Codec::current().ok_or_else(|| {
        D::Error::custom(format_args!(
            "no codec in scope to decode {}",
            T::TYPE.name()
        ))
    })?;
    codec.decode_tree::<T>(tree).map_err(D::Error::custom)
}
