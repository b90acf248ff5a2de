//! Command-line argument parsing

use lox_core::InterpreterConfig;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: lox [options] [script]
       lox [options] run <script>
       lox tokens <script>
       lox parse <script>

With no script, starts an interactive session.

Options:
  --max-call-depth=N   Limit nested function calls (default 4096)
  -h, --help           Print this help

Set LOX_LOG (e.g. LOX_LOG=lox_core=debug) to enable diagnostic logging.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Repl,
    Run(PathBuf),
    Tokens(PathBuf),
    Parse(PathBuf),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: Command,
    pub config: InterpreterConfig,
}

/// Parse arguments (without the program name)
pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config = InterpreterConfig::default();
    let mut positional = Vec::new();

    for arg in args {
        if arg == "-h" || arg == "--help" {
            return Ok(CliArgs {
                command: Command::Help,
                config,
            });
        } else if let Some(value) = arg.strip_prefix("--max-call-depth=") {
            let depth = InterpreterConfig::parse_call_depth(value)
                .ok_or_else(|| format!("Invalid call depth '{}'", value))?;
            config = config.with_max_call_depth(depth);
        } else if arg.starts_with("--") {
            return Err(format!("Unknown option '{}'", arg));
        } else {
            positional.push(arg);
        }
    }

    let command = match positional.as_slice() {
        [] => Command::Repl,
        [sub, path] if sub == "run" => Command::Run(PathBuf::from(path)),
        [sub, path] if sub == "tokens" => Command::Tokens(PathBuf::from(path)),
        [sub, path] if sub == "parse" => Command::Parse(PathBuf::from(path)),
        [sub] if sub == "run" || sub == "tokens" || sub == "parse" => {
            return Err(format!("'{}' expects a script path", sub));
        }
        [path] => Command::Run(PathBuf::from(path)),
        _ => return Err("Too many arguments".to_string()),
    };

    Ok(CliArgs { command, config })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_arguments_starts_repl() {
        assert_eq!(parse(&[]).unwrap().command, Command::Repl);
    }

    #[test]
    fn test_script_path() {
        assert_eq!(
            parse(&["hello.lox"]).unwrap().command,
            Command::Run(PathBuf::from("hello.lox"))
        );
        assert_eq!(
            parse(&["run", "hello.lox"]).unwrap().command,
            Command::Run(PathBuf::from("hello.lox"))
        );
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(
            parse(&["tokens", "a.lox"]).unwrap().command,
            Command::Tokens(PathBuf::from("a.lox"))
        );
        assert_eq!(
            parse(&["parse", "a.lox"]).unwrap().command,
            Command::Parse(PathBuf::from("a.lox"))
        );
    }

    #[test]
    fn test_max_call_depth() {
        let args = parse(&["--max-call-depth=64", "a.lox"]).unwrap();
        assert_eq!(args.config.max_call_depth, 64);
        assert!(parse(&["--max-call-depth=zero"]).is_err());
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse(&["a.lox", "b.lox"]).is_err());
        assert!(parse(&["tokens"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&["run", "-h"]).unwrap().command, Command::Help);
    }
}
