//! # callgate
//!
//! A policy layer that sits between an AI agent and the tools it wants to
//! run. For every proposed tool call it answers one question: run it, refuse
//! it, or ask a human first.
//!
//! ## Quick Start
//!
//! ```rust
//! use callgate_core::{PolicyDecision, PolicyEngine, PolicyEngineConfig, PolicyRule, ToolCall};
//! use serde_json::json;
//!
//! # fn main() -> callgate_core::Result<()> {
//! let engine = PolicyEngine::new(
//!     PolicyEngineConfig::new()
//!         .with_rule(PolicyRule::for_tool("shell", PolicyDecision::AskUser))
//!         .with_rule(
//!             PolicyRule::for_tool("shell", PolicyDecision::Deny)
//!                 .with_pattern(r"rm\s+-rf")?
//!                 .with_priority(100),
//!         ),
//! );
//!
//! let call = ToolCall::new("shell").with_args(json!({"cmd": "rm -rf /"}));
//! let verdict = engine.evaluate(&call);
//! assert_eq!(verdict.decision, PolicyDecision::Deny);
//! println!("{}", verdict.reason());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`policy`] - rules, the engine, verdicts and JSON settings
//! - [`canonical`] - the deterministic, cycle-safe argument serialization
//!   that argument patterns are matched against
//! - [`error`] - errors raised while building policy (evaluation never fails)

pub mod canonical;
pub mod error;
pub mod policy;

pub use canonical::{fingerprint, stable_stringify, ArgArray, ArgObject, ArgValue};
pub use error::{PolicyError, Result};
pub use policy::{
    ApprovalMode, PolicyDecision, PolicyEngine, PolicyEngineConfig, PolicyRule, PolicySettings,
    PolicyVerdict, RuleSettings, ToolCall,
};
