//! Policy rules.

use super::call::{CanonicalArgs, ToolCall};
use super::decision::PolicyDecision;
use crate::canonical::{stable_stringify, ArgValue};
use crate::error::{PolicyError, Result};
use regex::Regex;
use serde::{Serialize, Serializer};

/// A single policy rule.
///
/// A rule matches a call when its tool name (if any) equals the call's name
/// and its argument pattern (if any) matches the call's canonical arguments.
/// A rule with a pattern never matches a call without arguments.
///
/// Patterns use the `regex` crate: unanchored (they match anywhere in the
/// canonical string), case-sensitive unless written with `(?i)`, and without
/// look-around or backreferences.
///
/// # Example
///
/// ```rust
/// use callgate_core::{PolicyDecision, PolicyRule};
///
/// // Deny any shell call that mentions `rm -rf`
/// let rule = PolicyRule::for_tool("shell", PolicyDecision::Deny)
///     .with_pattern("rm -rf")
///     .unwrap()
///     .with_priority(100);
/// assert_eq!(rule.priority, 100);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// Tool this rule applies to, or `None` for every tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Pattern the canonical arguments must match.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_pattern"
    )]
    pub args_pattern: Option<Regex>,

    /// Decision yielded when the rule matches.
    pub decision: PolicyDecision,

    /// Evaluation order; higher runs first.
    pub priority: i32,
}

impl PolicyRule {
    /// A wildcard rule (any tool) at priority 0.
    pub fn new(decision: PolicyDecision) -> Self {
        Self {
            tool_name: None,
            args_pattern: None,
            decision,
            priority: 0,
        }
    }

    /// A rule for one tool at priority 0.
    pub fn for_tool(tool_name: impl Into<String>, decision: PolicyDecision) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            ..Self::new(decision)
        }
    }

    /// A rule matching exactly one invocation: this tool with arguments
    /// whose canonical form equals that of `args`.
    ///
    /// This is what a host records when a user answers "always allow" for a
    /// specific call.
    pub fn exact_invocation(
        tool_name: impl Into<String>,
        args: &ArgValue,
        decision: PolicyDecision,
    ) -> Result<Self> {
        let pattern = format!("^{}$", regex::escape(&stable_stringify(args)));
        Self::for_tool(tool_name, decision).with_pattern(&pattern)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Compile and attach an argument pattern.
    pub fn with_pattern(self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.with_regex(regex))
    }

    /// Attach an already compiled argument pattern.
    pub fn with_regex(mut self, regex: Regex) -> Self {
        self.args_pattern = Some(regex);
        self
    }

    /// Whether this rule applies to every tool.
    pub fn is_wildcard(&self) -> bool {
        self.tool_name.is_none()
    }

    /// Whether this rule matches `call`.
    pub fn matches(&self, call: &ToolCall) -> bool {
        self.matches_with(call, &mut CanonicalArgs::new(call))
    }

    pub(crate) fn matches_with(&self, call: &ToolCall, canonical: &mut CanonicalArgs<'_>) -> bool {
        if let Some(name) = &self.tool_name {
            if *name != call.name {
                return false;
            }
        }

        match &self.args_pattern {
            None => true,
            // No arguments never satisfies a pattern.
            Some(pattern) => canonical.get().is_some_and(|args| pattern.is_match(args)),
        }
    }

    /// Short description used in verdict reasons.
    pub fn describe(&self) -> String {
        let mut text = match &self.tool_name {
            Some(name) => format!("rule for tool '{}'", name),
            None => "wildcard rule".to_string(),
        };
        if let Some(pattern) = &self.args_pattern {
            text.push_str(&format!(" matching /{}/", pattern.as_str()));
        }
        text.push_str(&format!(" (priority {})", self.priority));
        text
    }
}

impl PartialEq for PolicyRule {
    fn eq(&self, other: &Self) -> bool {
        self.tool_name == other.tool_name
            && self.args_pattern.as_ref().map(Regex::as_str)
                == other.args_pattern.as_ref().map(Regex::as_str)
            && self.decision == other.decision
            && self.priority == other.priority
    }
}

impl Eq for PolicyRule {}

fn serialize_pattern<S>(pattern: &Option<Regex>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match pattern {
        Some(regex) => serializer.serialize_str(regex.as_str()),
        None => serializer.serialize_none(),
    }
}
