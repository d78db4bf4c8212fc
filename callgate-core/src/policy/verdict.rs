//! Decisions with provenance.

use super::decision::PolicyDecision;
use super::rule::PolicyRule;
use serde::Serialize;

/// The result of evaluating a call, with the rule responsible for it.
///
/// Hosts use [`PolicyVerdict::reason`] to tell the model (and the user) why a
/// call was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    /// Final decision, after non-interactive adjustment.
    pub decision: PolicyDecision,

    /// The first matching rule, or `None` if the default decision applied.
    pub matched_rule: Option<PolicyRule>,

    /// True when non-interactive mode turned `AskUser` into `Deny`.
    pub downgraded: bool,
}

impl PolicyVerdict {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allow()
    }

    pub fn is_denied(&self) -> bool {
        self.decision.is_deny()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.decision.is_ask_user()
    }

    /// Human-readable explanation of the decision.
    pub fn reason(&self) -> String {
        let source = match &self.matched_rule {
            Some(rule) => rule.describe(),
            None => "default policy".to_string(),
        };

        if self.downgraded {
            return format!(
                "{} requires user confirmation, which is unavailable in non-interactive mode",
                source
            );
        }

        match self.decision {
            PolicyDecision::Allow => format!("allowed by {}", source),
            PolicyDecision::Deny => format!("denied by {}", source),
            PolicyDecision::AskUser => format!("{} requires user confirmation", source),
        }
    }
}
