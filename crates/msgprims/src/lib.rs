//! ROS1-style message schemas, a binary wire codec, and binding generation.
//!
//! msgprims compiles `.msg` definitions into schemas with stable md5
//! fingerprints, encodes and decodes messages against them, and emits
//! typed bindings for Rust, Python and TypeScript.
//!
//! # Crate Structure
//!
//! - [`schema`]: definition parser, fingerprints and the type registry
//! - [`codec`]: little-endian wire codec, dynamic values and the JSON bridge
//! - [`gen`]: source generation (behind the `gen` feature)

/// Re-export schema types.
pub mod schema {
    pub use msgprims_schema::*;
}

/// Re-export codec types.
pub mod codec {
    pub use msgprims_codec::*;
}

/// Re-export generator types (requires `gen` feature).
#[cfg(feature = "gen")]
pub mod gen {
    pub use msgprims_gen::*;
}
