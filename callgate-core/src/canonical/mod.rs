//! Canonical serialization of tool-call arguments.
//!
//! Policy rules match patterns against a string rendering of a call's
//! arguments. That rendering has to be the same for the same data no matter
//! how the caller built it, and it has to survive hostile shapes (cycles,
//! absent members, callables) without failing. This module provides:
//!
//! - **[`ArgValue`]**: the argument value model, with shared composite nodes
//! - **[`stable_stringify`]**: the canonical single-line serialization
//! - **[`fingerprint`]**: SHA-256 of the canonical form, for audit and
//!   exact-invocation matching

mod serializer;
mod value;

pub use serializer::{
    fingerprint, stable_stringify, CIRCULAR_MARKER, MAX_DEPTH, MAX_DEPTH_MARKER,
};
pub(crate) use serializer::fingerprint_canonical;
pub use value::{ArgArray, ArgObject, ArgValue, HookError, ToJsonHook};
