//! Subcommand implementations.
//!
//! Each command writes to a caller-supplied writer so it can be driven from
//! tests without touching stdout.

use anyhow::{Context, Result};
use callgate_core::{
    fingerprint, stable_stringify, ArgValue, PolicyDecision, PolicyEngine, PolicySettings,
    PolicyVerdict, ToolCall,
};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

/// Exit status for each decision of `check`.
pub fn exit_code(decision: PolicyDecision) -> u8 {
    match decision {
        PolicyDecision::Allow => 0,
        PolicyDecision::Deny => 2,
        PolicyDecision::AskUser => 3,
    }
}

/// Build the engine from an optional settings file.
///
/// The `--non-interactive` flag can only tighten the loaded settings.
pub fn load_engine(policy: Option<&Path>, non_interactive: bool) -> Result<PolicyEngine> {
    let mut settings = match policy {
        Some(path) => PolicySettings::from_file(path)
            .with_context(|| format!("failed to load policy from {}", path.display()))?,
        None => PolicySettings::default(),
    };
    settings.non_interactive |= non_interactive;

    let engine = settings
        .build_engine()
        .context("failed to build policy engine")?;
    tracing::info!(
        rules = engine.len(),
        default = %engine.default_decision(),
        non_interactive = engine.is_non_interactive(),
        "policy engine ready"
    );
    Ok(engine)
}

/// Parse tool arguments from an inline string or a file. A JSON `null`
/// means no arguments.
pub fn read_args(inline: Option<&str>, file: Option<&Path>) -> Result<Option<ArgValue>> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read arguments from {}", path.display()))?,
        (None, None) => return Ok(None),
    };
    let value: serde_json::Value =
        serde_json::from_str(&text).context("tool arguments are not valid JSON")?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(value.into()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    tool: &'a str,
    #[serde(flatten)]
    verdict: &'a PolicyVerdict,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    args_fingerprint: Option<String>,
}

/// Evaluate one call and print the outcome.
pub fn check(
    engine: &PolicyEngine,
    call: &ToolCall,
    json: bool,
    out: &mut impl Write,
) -> Result<PolicyDecision> {
    let verdict = engine.evaluate(call);

    if json {
        let report = CheckReport {
            tool: &call.name,
            verdict: &verdict,
            reason: verdict.reason(),
            args_fingerprint: call.args.as_ref().map(fingerprint),
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}: {}", verdict.decision, verdict.reason())?;
    }

    Ok(verdict.decision)
}

/// Print the rules in evaluation order.
pub fn rules(engine: &PolicyEngine, json: bool, out: &mut impl Write) -> Result<()> {
    let rules = engine.rules();

    if json {
        serde_json::to_writer_pretty(&mut *out, &*rules)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "default: {}{}",
        engine.default_decision(),
        if engine.is_non_interactive() {
            " (non-interactive)"
        } else {
            ""
        }
    )?;
    if rules.is_empty() {
        writeln!(out, "no rules")?;
        return Ok(());
    }

    writeln!(out, "{:>8}  {:<9} {:<20} PATTERN", "PRIORITY", "DECISION", "TOOL")?;
    for rule in rules.iter() {
        writeln!(
            out,
            "{:>8}  {:<9} {:<20} {}",
            rule.priority,
            rule.decision.as_str(),
            rule.tool_name.as_deref().unwrap_or("*"),
            rule.args_pattern.as_ref().map(|p| p.as_str()).unwrap_or("-"),
        )?;
    }
    Ok(())
}

/// Print the canonical form (or fingerprint) of a JSON document.
pub fn canonicalize(
    input: Option<&str>,
    print_fingerprint: bool,
    stdin: &mut impl Read,
    out: &mut impl Write,
) -> Result<()> {
    let text = match input {
        Some(text) => text.to_string(),
        None => {
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("failed to read JSON from stdin")?;
            buf
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&text).context("input is not valid JSON")?;
    let value = ArgValue::from(value);

    if print_fingerprint {
        writeln!(out, "{}", fingerprint(&value))?;
    } else {
        writeln!(out, "{}", stable_stringify(&value))?;
    }
    Ok(())
}
