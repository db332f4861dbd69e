//! Beans that remember the tree they were decoded from.

use core::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Holder for the tree (and optionally its text) a bean was decoded from.
///
/// Embed one in a bean with `#[serde(skip)]` and implement [`TreeBacked`];
/// [`RetainTree`](crate::RetainTree) and [`RetainText`](crate::RetainText)
/// fill it in after a successful decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonBean {
    node: Option<Value>,
    text: Option<String>,
}

impl JsonBean {
    /// Create an empty holder.
    pub const fn new() -> Self {
        Self {
            node: None,
            text: None,
        }
    }

    /// Store a tree, replacing any previous one.
    pub fn retain(&mut self, node: Value) {
        self.node = Some(node);
    }

    /// Store the canonical text form of the tree.
    pub fn retain_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// The captured tree.
    pub fn node(&self) -> Option<&Value> {
        self.node.as_ref()
    }

    /// The captured text form.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Look up a node by JSON pointer (RFC 6901), e.g. `/address/city`.
    ///
    /// Returns `None` when nothing was captured or the pointer does not
    /// resolve.
    pub fn node_at(&self, pointer: &str) -> Option<&Value> {
        self.node.as_ref()?.pointer(pointer)
    }

    /// Text of the node at `pointer`.
    ///
    /// Strings come back unquoted, other scalars in their JSON spelling,
    /// containers as the empty string.
    pub fn text_at(&self, pointer: &str) -> Option<String> {
        let text = match self.node_at(pointer)? {
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => String::new(),
            scalar => scalar.to_string(),
        };
        Some(text)
    }
}

impl fmt::Display for JsonBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.text, &self.node) {
            (Some(text), _) => f.write_str(text),
            (None, Some(node)) => write!(f, "{node}"),
            (None, None) => f.write_str("null"),
        }
    }
}

/// A bean carrying a [`JsonBean`].
pub trait TreeBacked {
    /// Shared access to the holder.
    fn bean(&self) -> &JsonBean;

    /// Mutable access to the holder.
    fn bean_mut(&mut self) -> &mut JsonBean;
}

/// Serializes a bean as the tree it was decoded from, when there is one.
///
/// Beans decoded without a retaining hook (or built in code) fall back to
/// their own `Serialize` impl.
///
/// ```rust
/// use polybind::{JsonBean, Passthrough, TreeBacked};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Note {
///     text: String,
///     #[serde(skip)]
///     bean: JsonBean,
/// }
///
/// impl TreeBacked for Note {
///     fn bean(&self) -> &JsonBean {
///         &self.bean
///     }
///     fn bean_mut(&mut self) -> &mut JsonBean {
///         &mut self.bean
///     }
/// }
///
/// let mut note = Note { text: "hi".into(), bean: JsonBean::new() };
/// assert_eq!(serde_json::to_string(&Passthrough(&note)).unwrap(), r#"{"text":"hi"}"#);
///
/// note.bean_mut().retain(serde_json::json!({"text": "hi", "extra": 1}));
/// assert_eq!(
///     serde_json::to_string(&Passthrough(&note)).unwrap(),
///     r#"{"text":"hi","extra":1}"#
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Passthrough<'a, T>(pub &'a T);

impl<T> Serialize for Passthrough<'_, T>
where
    T: TreeBacked + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.bean().node() {
            Some(node) => node.serialize(serializer),
            None => self.0.serialize(serializer),
        }
    }
}
