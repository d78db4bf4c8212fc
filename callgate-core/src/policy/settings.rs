//! Policy settings loaded from JSON.
//!
//! Settings are the host-facing way to describe a policy. They are turned
//! into a [`PolicyEngineConfig`] by [`PolicySettings::to_config`], which
//! compiles patterns (reporting the offending one on failure) and expands
//! the shorthand lists and approval mode into prioritized rules:
//!
//! | Source | Decision | Priority |
//! |--------|----------|----------|
//! | `rules` | as written | as written (default 0) |
//! | `excludedTools` | deny | [`EXCLUDED_TOOL_PRIORITY`] |
//! | `allowedTools` | allow | [`ALLOWED_TOOL_PRIORITY`] |
//! | `editTools` in `autoEdit` mode | allow | [`AUTO_EDIT_PRIORITY`] |
//! | wildcard in `yolo` mode | allow | [`YOLO_PRIORITY`] |
//!
//! # Example
//!
//! ```json
//! {
//!   "defaultDecision": "ask_user",
//!   "approvalMode": "autoEdit",
//!   "allowedTools": ["read_file", "glob"],
//!   "excludedTools": ["web_fetch"],
//!   "rules": [
//!     { "toolName": "shell", "argsPattern": "rm\\s+-rf", "decision": "deny", "priority": 300 }
//!   ]
//! }
//! ```

use super::decision::PolicyDecision;
use super::engine::{PolicyEngine, PolicyEngineConfig};
use super::rule::PolicyRule;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Priority of rules generated from `excludedTools`.
pub const EXCLUDED_TOOL_PRIORITY: i32 = 200;

/// Priority of rules generated from `allowedTools`.
pub const ALLOWED_TOOL_PRIORITY: i32 = 100;

/// Priority of edit-tool rules generated in `autoEdit` mode.
pub const AUTO_EDIT_PRIORITY: i32 = 15;

/// Priority of the wildcard allow generated in `yolo` mode. Below any
/// explicit rule a host is likely to write.
pub const YOLO_PRIORITY: i32 = -1000;

/// Tools treated as file editors in `autoEdit` mode unless overridden.
pub const DEFAULT_EDIT_TOOLS: &[&str] = &["edit", "replace", "write_file"];

/// How much the host trusts the agent without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalMode {
    /// Only explicit rules and lists apply.
    #[default]
    Default,
    /// File edit tools are allowed without asking.
    AutoEdit,
    /// Everything not otherwise decided is allowed.
    Yolo,
}

/// A rule as written in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_pattern: Option<String>,

    pub decision: PolicyDecision,

    #[serde(default)]
    pub priority: i32,
}

impl RuleSettings {
    /// Compile into a [`PolicyRule`].
    pub fn to_rule(&self) -> Result<PolicyRule> {
        let rule = PolicyRule {
            tool_name: self.tool_name.clone(),
            args_pattern: None,
            decision: self.decision,
            priority: self.priority,
        };
        match &self.args_pattern {
            Some(pattern) => rule.with_pattern(pattern),
            None => Ok(rule),
        }
    }
}

/// Policy settings document.
///
/// Every field is optional; an empty document yields an engine that asks
/// the user about everything. Unknown fields are rejected, so a misspelled
/// list is an error instead of an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PolicySettings {
    pub default_decision: PolicyDecision,
    pub non_interactive: bool,
    pub approval_mode: ApprovalMode,
    pub allowed_tools: Vec<String>,
    pub excluded_tools: Vec<String>,
    pub edit_tools: Vec<String>,
    pub rules: Vec<RuleSettings>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            default_decision: PolicyDecision::default(),
            non_interactive: false,
            approval_mode: ApprovalMode::default(),
            allowed_tools: Vec::new(),
            excluded_tools: Vec::new(),
            edit_tools: DEFAULT_EDIT_TOOLS.iter().map(|s| s.to_string()).collect(),
            rules: Vec::new(),
        }
    }
}

impl PolicySettings {
    /// Parse settings from JSON. Blank input yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file. An empty file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&contents)?;
        log::debug!(
            "loaded policy settings from {} ({} explicit rules)",
            path.display(),
            settings.rules.len()
        );
        Ok(settings)
    }

    /// Expand into an engine configuration.
    pub fn to_config(&self) -> Result<PolicyEngineConfig> {
        let mut rules = self
            .rules
            .iter()
            .map(RuleSettings::to_rule)
            .collect::<Result<Vec<_>>>()?;

        rules.extend(self.excluded_tools.iter().map(|tool| {
            PolicyRule::for_tool(tool.as_str(), PolicyDecision::Deny)
                .with_priority(EXCLUDED_TOOL_PRIORITY)
        }));
        rules.extend(self.allowed_tools.iter().map(|tool| {
            PolicyRule::for_tool(tool.as_str(), PolicyDecision::Allow)
                .with_priority(ALLOWED_TOOL_PRIORITY)
        }));

        match self.approval_mode {
            ApprovalMode::Default => {}
            ApprovalMode::AutoEdit => {
                rules.extend(self.edit_tools.iter().map(|tool| {
                    PolicyRule::for_tool(tool.as_str(), PolicyDecision::Allow)
                        .with_priority(AUTO_EDIT_PRIORITY)
                }));
            }
            ApprovalMode::Yolo => {
                rules.push(PolicyRule::new(PolicyDecision::Allow).with_priority(YOLO_PRIORITY));
            }
        }

        Ok(PolicyEngineConfig {
            rules,
            default_decision: self.default_decision,
            non_interactive: self.non_interactive,
        })
    }

    /// Build an engine from these settings.
    pub fn build_engine(&self) -> Result<PolicyEngine> {
        Ok(PolicyEngine::new(self.to_config()?))
    }
}
