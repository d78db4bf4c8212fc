//! Tool-call policy evaluation.
//!
//! This module decides, for every tool call an agent proposes, whether it
//! runs without confirmation, is refused, or needs a human.
//!
//! # Overview
//!
//! - **[`PolicyEngine`]**: Holds prioritized rules and renders decisions
//! - **[`PolicyRule`]**: Tool name and/or argument pattern, with a decision
//! - **[`PolicyDecision`]**: `Allow`, `Deny` or `AskUser`
//! - **[`PolicyVerdict`]**: A decision plus the rule that produced it
//! - **[`PolicySettings`]**: JSON settings expanded into an engine config
//!
//! # Evaluation
//!
//! Rules are tried from highest to lowest priority (ties in insertion
//! order) and the first match wins. Argument patterns are matched against
//! the canonical serialization of the call's arguments (see
//! [`crate::canonical`]), so key order in the arguments never matters. A
//! rule with a pattern never matches a call without arguments.
//!
//! When nothing matches, the engine's default decision applies (`AskUser`
//! unless configured otherwise).
//!
//! # Non-interactive mode
//!
//! With no human available, every `AskUser` outcome becomes `Deny`. It never
//! becomes `Allow`.
//!
//! # Example
//!
//! ```rust
//! use callgate_core::policy::{PolicyDecision, PolicyEngine, PolicyEngineConfig, PolicyRule, ToolCall};
//!
//! let engine = PolicyEngine::new(PolicyEngineConfig::new().with_non_interactive(true));
//! engine.add_rule(PolicyRule::for_tool("read_file", PolicyDecision::Allow));
//!
//! assert_eq!(engine.check(&ToolCall::new("read_file")), PolicyDecision::Allow);
//! // Would ask, but nobody is there to answer.
//! assert_eq!(engine.check(&ToolCall::new("shell")), PolicyDecision::Deny);
//! ```

mod call;
mod decision;
mod engine;
mod rule;
pub mod settings;
mod verdict;

pub use call::ToolCall;
pub use decision::PolicyDecision;
pub use engine::{PolicyEngine, PolicyEngineConfig};
pub use rule::PolicyRule;
pub use settings::{ApprovalMode, PolicySettings, RuleSettings};
pub use verdict::PolicyVerdict;
