#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod bean;
mod catalog;
mod codec;
mod config;
mod descriptor;
mod error;
pub mod initialize;
mod json_bean;
mod registry;
mod resolver;
mod signature;
pub mod unix_timestamp;

pub use bean::{Ancestors, Bean, BeanType, Object};
pub use catalog::Catalog;
pub use codec::{Codec, CodecBuilder, deserialize_polymorphic};
pub use config::{CandidateOrder, CodecConfig, UnknownOrder};
pub use descriptor::{Descriptor, DescriptorEntry};
pub use error::{
    DecodeError, DescriptorError, InitializeError, IntrospectionFailure, RegistrationError,
};
pub use initialize::{Chain, Decoded, Initializer, NoopInitializer, RetainText, RetainTree};
pub use json_bean::{JsonBean, Passthrough, TreeBacked};
pub use registry::{Entry, TypeMap, TypeMapBuilder};
pub use resolver::{CandidateMiss, FieldSuggestion, NoMatchReport, Resolved, resolve};
pub use signature::{Signature, has_field};
