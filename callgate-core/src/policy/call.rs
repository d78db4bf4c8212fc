//! The proposed tool invocation being judged.

use crate::canonical::{stable_stringify, ArgValue};
use serde::Deserialize;

/// A tool invocation proposed by the agent.
///
/// Deserializes from `{"name": "...", "args": {...}}`; `args` may be absent
/// or `null`, both of which mean "no arguments". Arguments that are `Null`
/// or `Undefined` are treated the same way however the call was built.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Tool identifier.
    pub name: String,

    /// Call arguments, if any.
    #[serde(default)]
    pub args: Option<ArgValue>,
}

impl ToolCall {
    /// A call with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    /// Attach arguments.
    pub fn with_args(mut self, args: impl Into<ArgValue>) -> Self {
        self.args = Some(args.into());
        self
    }
}

/// Canonical form of a call's arguments, rendered at most once.
pub(crate) struct CanonicalArgs<'a> {
    args: Option<&'a ArgValue>,
    rendered: Option<String>,
}

impl<'a> CanonicalArgs<'a> {
    pub(crate) fn new(call: &'a ToolCall) -> Self {
        Self {
            args: call
                .args
                .as_ref()
                .filter(|args| !matches!(args, ArgValue::Null | ArgValue::Undefined)),
            rendered: None,
        }
    }

    /// The canonical string, or `None` when the call has no arguments.
    pub(crate) fn get(&mut self) -> Option<&str> {
        let args = self.args?;
        Some(
            self.rendered
                .get_or_insert_with(|| stable_stringify(args))
                .as_str(),
        )
    }
}
