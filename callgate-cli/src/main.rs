//! `callgate` - evaluate tool calls against a policy from the command line.

mod commands;

use anyhow::Result;
use callgate_core::ToolCall;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "callgate", version, about, long_about = None)]
struct Cli {
    /// Policy settings file (JSON). Without one, every call asks the user.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// No human is available: calls that would ask the user are denied.
    #[arg(long, global = true, env = "CALLGATE_NON_INTERACTIVE")]
    non_interactive: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide a single tool call. Exits 0 for allow, 2 for deny, 3 for ask_user.
    Check {
        /// Tool name
        tool: String,

        /// Tool arguments as a JSON document
        #[arg(long, conflicts_with = "args_file")]
        args: Option<String>,

        /// Read tool arguments from a JSON file
        #[arg(long)]
        args_file: Option<PathBuf>,

        /// Print the full verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// List rules in evaluation order
    Rules {
        /// Print rules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical serialization of a JSON document
    Canonicalize {
        /// JSON document (read from stdin when omitted)
        input: Option<String>,

        /// Print the SHA-256 fingerprint instead
        #[arg(long)]
        fingerprint: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Check {
            tool,
            args,
            args_file,
            json,
        } => {
            let engine = commands::load_engine(cli.policy.as_deref(), cli.non_interactive)?;
            let mut call = ToolCall::new(tool);
            call.args = commands::read_args(args.as_deref(), args_file.as_deref())?;

            let decision = commands::check(&engine, &call, json, &mut stdout)?;
            Ok(ExitCode::from(commands::exit_code(decision)))
        }
        Command::Rules { json } => {
            let engine = commands::load_engine(cli.policy.as_deref(), cli.non_interactive)?;
            commands::rules(&engine, json, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Canonicalize { input, fingerprint } => {
            commands::canonicalize(
                input.as_deref(),
                fingerprint,
                &mut std::io::stdin().lock(),
                &mut stdout,
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "callgate",
            "--non-interactive",
            "-vv",
            "check",
            "shell",
            "--args",
            r#"{"cmd":"ls"}"#,
            "--json",
        ])
        .unwrap();

        assert!(cli.non_interactive);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Check {
                tool, args, json, ..
            } => {
                assert_eq!(tool, "shell");
                assert_eq!(args.as_deref(), Some(r#"{"cmd":"ls"}"#));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_and_args_file_conflict() {
        let result = Cli::try_parse_from([
            "callgate",
            "check",
            "shell",
            "--args",
            "{}",
            "--args-file",
            "args.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_after_subcommand() {
        let cli =
            Cli::try_parse_from(["callgate", "rules", "--policy", "policy.json"]).unwrap();
        assert_eq!(cli.policy, Some(PathBuf::from("policy.json")));
    }
}
