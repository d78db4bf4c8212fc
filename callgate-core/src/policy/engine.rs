//! The policy engine.

use super::call::{CanonicalArgs, ToolCall};
use super::decision::PolicyDecision;
use super::rule::PolicyRule;
use super::verdict::PolicyVerdict;
use crate::canonical::fingerprint_canonical;
use log::{debug, log_enabled, Level};
use parking_lot::RwLock;
use std::sync::Arc;

/// Construction parameters for a [`PolicyEngine`].
#[derive(Debug, Clone, Default)]
pub struct PolicyEngineConfig {
    /// Initial rules, in any order.
    pub rules: Vec<PolicyRule>,

    /// Returned when no rule matches.
    pub default_decision: PolicyDecision,

    /// No human is available: `AskUser` outcomes become `Deny`.
    pub non_interactive: bool,
}

impl PolicyEngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = PolicyRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn with_default_decision(mut self, decision: PolicyDecision) -> Self {
        self.default_decision = decision;
        self
    }

    pub fn with_non_interactive(mut self, non_interactive: bool) -> Self {
        self.non_interactive = non_interactive;
        self
    }
}

/// Decides whether a proposed tool call is allowed, denied, or needs a human.
///
/// Rules are kept sorted by descending priority (ties keep insertion order)
/// and the first matching rule wins. With no match the default decision
/// applies. In non-interactive mode every `AskUser` outcome becomes `Deny`.
///
/// The rule list is an immutable snapshot that mutations replace wholesale,
/// so `check` can run from any number of threads while rules are added or
/// removed, and always sees a complete, sorted list.
///
/// # Example
///
/// ```rust
/// use callgate_core::{PolicyDecision, PolicyEngine, PolicyEngineConfig, PolicyRule, ToolCall};
///
/// let engine = PolicyEngine::new(
///     PolicyEngineConfig::new()
///         .with_rule(PolicyRule::new(PolicyDecision::Deny))
///         .with_rule(PolicyRule::for_tool("read_file", PolicyDecision::Allow).with_priority(10)),
/// );
///
/// assert_eq!(engine.check(&ToolCall::new("read_file")), PolicyDecision::Allow);
/// assert_eq!(engine.check(&ToolCall::new("shell")), PolicyDecision::Deny);
/// ```
#[derive(Debug)]
pub struct PolicyEngine {
    rules: RwLock<Arc<[PolicyRule]>>,
    default_decision: PolicyDecision,
    non_interactive: bool,
}

impl PolicyEngine {
    /// Create an engine. Rules are sorted into priority order.
    pub fn new(config: PolicyEngineConfig) -> Self {
        let mut rules = config.rules;
        sort_by_priority(&mut rules);
        Self {
            rules: RwLock::new(rules.into()),
            default_decision: config.default_decision,
            non_interactive: config.non_interactive,
        }
    }

    /// Decide on a call.
    pub fn check(&self, call: &ToolCall) -> PolicyDecision {
        self.evaluate(call).decision
    }

    /// Decide on a call and report which rule decided it.
    pub fn evaluate(&self, call: &ToolCall) -> PolicyVerdict {
        let rules = self.rules();
        let mut canonical = CanonicalArgs::new(call);

        let matched = rules
            .iter()
            .find(|rule| rule.matches_with(call, &mut canonical));
        let raw = matched.map_or(self.default_decision, |rule| rule.decision);
        let downgraded = self.non_interactive && raw.is_ask_user();
        let decision = if downgraded { PolicyDecision::Deny } else { raw };

        if log_enabled!(Level::Debug) {
            let args = canonical
                .get()
                .map(fingerprint_canonical)
                .unwrap_or_else(|| "-".to_string());
            debug!(
                "tool '{}' args {} -> {} ({})",
                call.name,
                args,
                decision,
                matched.map_or_else(|| "default".to_string(), PolicyRule::describe),
            );
        }

        PolicyVerdict {
            decision,
            matched_rule: matched.cloned(),
            downgraded,
        }
    }

    /// Add a rule, keeping priority order. Duplicates are allowed.
    pub fn add_rule(&self, rule: PolicyRule) {
        let mut guard = self.rules.write();
        let mut next = guard.to_vec();
        next.push(rule);
        sort_by_priority(&mut next);
        *guard = next.into();
    }

    /// Remove every rule whose tool name is `tool_name`.
    ///
    /// Wildcard rules are never removed. Returns how many rules were removed.
    pub fn remove_rules_for_tool(&self, tool_name: &str) -> usize {
        let mut guard = self.rules.write();
        let next: Vec<PolicyRule> = guard
            .iter()
            .filter(|rule| rule.tool_name.as_deref() != Some(tool_name))
            .cloned()
            .collect();
        let removed = guard.len() - next.len();
        if removed > 0 {
            debug!("removed {} rule(s) for tool '{}'", removed, tool_name);
            *guard = next.into();
        }
        removed
    }

    /// Snapshot of the rules in evaluation order.
    ///
    /// The snapshot is immutable; later changes to the engine are not
    /// reflected in it.
    pub fn rules(&self) -> Arc<[PolicyRule]> {
        self.rules.read().clone()
    }

    pub fn default_decision(&self) -> PolicyDecision {
        self.default_decision
    }

    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(PolicyEngineConfig::default())
    }
}

// `sort_by` is stable, so equal priorities keep insertion order.
fn sort_by_priority(rules: &mut [PolicyRule]) {
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
}
