//! Error types for registration, descriptors and decoding.

use std::path::PathBuf;

use core::fmt;

use crate::resolver::NoMatchReport;

/// Why a type's declared properties could not be turned into a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntrospectionFailure {
    /// A property name is the empty string.
    EmptyProperty,
    /// The same property name is declared twice on one type.
    DuplicateProperty(&'static str),
}

impl fmt::Display for IntrospectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrospectionFailure::EmptyProperty => write!(f, "empty property name"),
            IntrospectionFailure::DuplicateProperty(name) => {
                write!(f, "property '{name}' declared more than once")
            }
        }
    }
}

/// Errors raised while building a [`TypeMap`](crate::TypeMap) or a
/// [`Catalog`](crate::Catalog).
///
/// These are build-time failures: a builder that returned one is consumed,
/// so a half-validated registry can never be used for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A subtype does not have the supertype anywhere in its parent chain.
    NotAssignable {
        /// The offending subtype
        subtype: &'static str,
        /// The supertype it was registered under
        supertype: &'static str,
    },
    /// A type's property list is malformed.
    Introspection {
        /// The type whose properties were rejected
        type_name: &'static str,
        /// What was wrong with them
        failure: IntrospectionFailure,
    },
    /// Following supertype -> subtype edges leads back to an earlier type.
    Cycle {
        /// The chain of type names, starting and ending with the same type
        path: Vec<&'static str>,
    },
    /// A descriptor names a type the catalog does not know.
    UnknownType {
        /// The name as written in the descriptor
        name: String,
        /// Descriptor line the name appeared on
        line: usize,
    },
    /// Two different types were added to a catalog under the same name.
    DuplicateType {
        /// The contested qualified name
        name: &'static str,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::NotAssignable { subtype, supertype } => {
                write!(f, "{subtype} is not a subtype of {supertype}")
            }
            RegistrationError::Introspection { type_name, failure } => {
                write!(f, "cannot derive a signature for {type_name}: {failure}")
            }
            RegistrationError::Cycle { path } => {
                write!(f, "subtype cycle: {}", path.join(" -> "))
            }
            RegistrationError::UnknownType { name, line } => {
                write!(f, "line {line}: unknown type '{name}'")
            }
            RegistrationError::DuplicateType { name } => {
                write!(f, "two different types are named {name}")
            }
        }
    }
}

impl core::error::Error for RegistrationError {}

/// Errors raised while reading a registry descriptor.
#[derive(Debug)]
pub enum DescriptorError {
    /// The descriptor file could not be read.
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// A non-comment line has neither `=` nor `:`.
    MissingSeparator {
        /// 1-based line number
        line: usize,
    },
    /// A line has a separator but nothing before it.
    EmptyKey {
        /// 1-based line number
        line: usize,
    },
    /// The same supertype is declared twice.
    DuplicateKey {
        /// The repeated supertype name
        key: String,
        /// Line of the repeat
        line: usize,
        /// Line of the first declaration
        first_line: usize,
    },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::Io { path, source } => {
                write!(f, "cannot read descriptor {}: {source}", path.display())
            }
            DescriptorError::MissingSeparator { line } => {
                write!(f, "line {line}: expected `supertype = subtype, ...`")
            }
            DescriptorError::EmptyKey { line } => write!(f, "line {line}: missing supertype name"),
            DescriptorError::DuplicateKey {
                key,
                line,
                first_line,
            } => write!(
                f,
                "line {line}: supertype '{key}' already declared on line {first_line}"
            ),
        }
    }
}

impl core::error::Error for DescriptorError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            DescriptorError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error returned by an [`Initializer`](crate::Initializer).
#[derive(Debug)]
pub struct InitializeError {
    message: String,
    source: Option<Box<dyn core::error::Error + Send + Sync>>,
}

impl InitializeError {
    /// Create an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl core::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for InitializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for InitializeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn core::error::Error + 'static))
    }
}

impl From<serde_json::Error> for InitializeError {
    fn from(err: serde_json::Error) -> Self {
        InitializeError::with_source("cannot re-serialize tree", err)
    }
}

/// Errors that can occur while decoding.
///
/// Resolution itself never fails: a tree that matches no candidate falls
/// back to the supertype. Everything here comes from materializing the
/// input, from the underlying serde decode, or from the initialization hook.
#[derive(Debug)]
pub enum DecodeError {
    /// The input is not valid JSON.
    Parse(serde_json::Error),
    /// Decoding the tree as a concrete type failed.
    Decode {
        /// The type that was attempted
        type_name: &'static str,
        /// serde's explanation
        source: serde_json::Error,
    },
    /// No candidate matched and decoding as the supertype itself failed.
    Fallback {
        /// The supertype that was attempted
        supertype: &'static str,
        /// serde's explanation
        source: serde_json::Error,
        /// Why each candidate was passed over
        report: Box<NoMatchReport>,
    },
    /// Polymorphic decoding nested deeper than the configured limit.
    DepthExceeded {
        /// The type being decoded when the limit was hit
        type_name: &'static str,
        /// The configured limit
        limit: usize,
    },
    /// The initialization hook rejected the decoded object.
    Initialize {
        /// The requested type
        type_name: &'static str,
        /// The hook's error
        source: InitializeError,
    },
    /// A decoded object could not be converted to the requested type.
    ///
    /// Only reachable when a [`BeanType`](crate::BeanType) was declared with
    /// a Rust type that does not match the one it describes.
    TypeMismatch {
        /// The type that was expected
        expected: &'static str,
        /// The type that was produced
        found: &'static str,
    },
}

impl DecodeError {
    /// The no-match report, when this error comes from a failed fallback.
    pub fn report(&self) -> Option<&NoMatchReport> {
        match self {
            DecodeError::Fallback { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Parse(err) => write!(f, "invalid JSON: {err}"),
            DecodeError::Decode { type_name, source } => {
                write!(f, "cannot decode {type_name}: {source}")
            }
            DecodeError::Fallback {
                supertype,
                source,
                report,
            } => {
                write!(
                    f,
                    "no subtype of {supertype} matched, and decoding {supertype} failed: {source}"
                )?;
                if !report.is_empty() {
                    write!(f, "\n\n{report}")?;
                }
                Ok(())
            }
            DecodeError::DepthExceeded { type_name, limit } => write!(
                f,
                "polymorphic decoding of {type_name} nested deeper than {limit} levels"
            ),
            DecodeError::Initialize { type_name, source } => {
                write!(f, "initialization of {type_name} failed: {source}")
            }
            DecodeError::TypeMismatch { expected, found } => {
                write!(f, "decoded {found} where {expected} was expected")
            }
        }
    }
}

impl core::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            DecodeError::Parse(err) => Some(err),
            DecodeError::Decode { source, .. } => Some(source),
            DecodeError::Fallback { source, .. } => Some(source),
            DecodeError::Initialize { source, .. } => Some(source),
            DecodeError::DepthExceeded { .. } | DecodeError::TypeMismatch { .. } => None,
        }
    }
}
