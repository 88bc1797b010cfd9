//! A lazy, mutable protobuf wire-format field accessor.
//!
//! This crate sits between raw encoded protobuf bytes and a higher-level
//! generated message type. It indexes a wire buffer without decoding any
//! payloads, decodes fields on first typed access, supports read-modify-write
//! without a full re-parse, and re-serializes preserving unknown fields and
//! sub-message aliasing.
//!
//! Schema awareness, reflection, text/JSON formats, RPC, and threading
//! primitives are out of scope: this crate only knows field numbers and wire
//! types, never a message's declared shape.
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod accessor;
pub mod entry;
pub mod error;
pub mod leb128;
pub mod scalar;
mod storage;
mod util;
pub mod wire;

pub use accessor::{Accessor, StringValue, DEFAULT_PIVOT};
pub use entry::{AccessorHandle, Entry};
pub use error::{AccessError, Checks, ErrorKind};
pub use scalar::{Scalar, ScalarKind};
pub use wire::WireType;
