//! Codec and type-map settings.

use core::fmt;
use core::str::FromStr;

/// How a supertype's candidate list is ordered once the map is built.
///
/// Resolution is first-match, so this decides which subtype wins when
/// several signatures are satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateOrder {
    /// Keep the order subtypes were registered or declared in.
    #[default]
    Declaration,
    /// Sort each list by qualified type name.
    Name,
}

impl FromStr for CandidateOrder {
    type Err = UnknownOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "declaration" => Ok(CandidateOrder::Declaration),
            "name" => Ok(CandidateOrder::Name),
            other => Err(UnknownOrder(other.to_string())),
        }
    }
}

/// A string that names no [`CandidateOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrder(pub String);

impl fmt::Display for UnknownOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown candidate order '{}' (expected 'declaration' or 'name')",
            self.0
        )
    }
}

impl core::error::Error for UnknownOrder {}

/// Settings for a [`Codec`](crate::Codec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    max_depth: usize,
    pretty: bool,
}

impl CodecConfig {
    /// Default nesting limit for polymorphic decoding.
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    /// Start from the defaults.
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            pretty: false,
        }
    }

    /// Limit on nested polymorphic decodes: subtype-to-subtype hops within
    /// one value, plus polymorphic values nested inside each other.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Indent the canonical text produced by [`Codec::to_text`](crate::Codec::to_text).
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// The configured nesting limit.
    pub const fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Whether canonical text is indented.
    pub const fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}
