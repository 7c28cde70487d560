//! Schema-driven binary codec for compiled message definitions.
//!
//! Every message is laid out in schema field order with no framing:
//! - Fixed-width primitives as little-endian bytes
//! - Strings and `uint8[]` as a `u32` byte count followed by the bytes
//! - Variable arrays as a `u32` element count followed by the elements
//! - Fixed arrays and composite fields inline, without prefixes
//!
//! [`MessageCodec`] drives encode and decode over dynamically-typed
//! [`MessageValue`]s; the [`wire`] module exposes the same primitives to
//! generated bindings.

pub use bytes;

pub mod codec;
pub mod config;
pub mod error;
pub mod json;
pub mod value;
pub mod wire;

pub use codec::MessageCodec;
pub use config::{CodecConfig, DEFAULT_MAX_EMPTY_ELEMENTS, DEFAULT_MAX_LENGTH};
pub use error::{CodecError, PathSegment, Result};
pub use json::{from_json, to_json};
pub use value::{Duration, MessageValue, Time, Value};
pub use wire::{check_array_len, WireReader, WireWriter, LENGTH_PREFIX_SIZE};
