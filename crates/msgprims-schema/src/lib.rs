//! Message definition parser, schema model and fingerprinting.
//!
//! Definitions use the line-oriented `.msg` format (`TYPE NAME` per line).
//! Compiled schemas are immutable and shared through a [`SchemaRegistry`],
//! which also resolves composite field types by name.
//!
//! Fingerprints are MD5 digests over the canonical field list and match the
//! `md5sum` values of ROS1 message definitions.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod types;

pub use config::{RegistryConfig, DEFAULT_MAX_DEFINITIONS, DEFAULT_MAX_DEFINITION_SIZE};
pub use error::{Result, SchemaError};
pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use parser::compile;
pub use registry::SchemaRegistry;
pub use schema::{min_element_size, MessageSchema, SchemaBuilder, LENGTH_PREFIX_SIZE};
pub use types::{ArrayKind, ConstantSpec, FieldSpec, FieldType, PrimitiveKind};
