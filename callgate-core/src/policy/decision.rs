//! The three-way policy outcome.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome of evaluating a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Execute without confirmation.
    Allow,
    /// Refuse and report the refusal to the agent.
    Deny,
    /// Ask a human before executing (default).
    #[default]
    AskUser,
}

impl PolicyDecision {
    /// The serialized name (`allow`, `deny`, `ask_user`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDecision::Allow => "allow",
            PolicyDecision::Deny => "deny",
            PolicyDecision::AskUser => "ask_user",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, PolicyDecision::Deny)
    }

    pub fn is_ask_user(&self) -> bool {
        matches!(self, PolicyDecision::AskUser)
    }
}

impl std::fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyDecision {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(PolicyDecision::Allow),
            "deny" => Ok(PolicyDecision::Deny),
            "ask_user" => Ok(PolicyDecision::AskUser),
            _ => Err(PolicyError::InvalidDecision(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ask_user() {
        assert_eq!(PolicyDecision::default(), PolicyDecision::AskUser);
    }

    #[test]
    fn test_display_and_parse() {
        for decision in [
            PolicyDecision::Allow,
            PolicyDecision::Deny,
            PolicyDecision::AskUser,
        ] {
            assert_eq!(decision.to_string().parse::<PolicyDecision>().unwrap(), decision);
        }
        assert_eq!("ASK_USER".parse::<PolicyDecision>().unwrap(), PolicyDecision::AskUser);
        assert!("maybe".parse::<PolicyDecision>().unwrap_err().is_invalid_decision());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&PolicyDecision::AskUser).unwrap(),
            r#""ask_user""#
        );
        let parsed: PolicyDecision = serde_json::from_str(r#""deny""#).unwrap();
        assert_eq!(parsed, PolicyDecision::Deny);
    }
}
