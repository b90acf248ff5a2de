//! General REPL commands (help, quit, env, reset, load, watch, unwatch)

use crate::commands::{CommandContext, CommandResult};
use crate::runner::read_source;
use colored::*;
use lox_core::parser::builtins::get_registry;
use std::path::Path;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `env`: list global bindings with their types
pub fn cmd_env(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let lines: Vec<String> = ctx
        .session
        .interpreter()
        .global_bindings()
        .into_iter()
        .map(|(name, value)| {
            format!(
                "  {} = {} {}",
                name.cyan(),
                value,
                format!("({})", value.type_name()).dimmed()
            )
        })
        .collect();

    CommandResult::Message(lines.join("\n"))
}

/// Handle `reset`: start over with an empty session
pub fn cmd_reset(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.reset();
    CommandResult::Message("Session reset.".bright_green().to_string())
}

/// Handle `load <file>`: run a script into the current session
pub fn cmd_load(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: load <file>".to_string());
    }

    let source = match read_source(Path::new(args)) {
        Ok(source) => source,
        Err(e) => return CommandResult::Error(format!("{:#}", e)),
    };

    match ctx.session.run(&source) {
        Ok(()) => CommandResult::Message(format!("{} Loaded {}", "✓".bright_green(), args)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `watch <file>`; a bare `watch` lists watched files
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::ListWatched;
    }
    CommandResult::Watch(args.to_string())
}

/// Handle `unwatch <file>` command
pub fn cmd_unwatch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: unwatch <file>".to_string());
    }
    CommandResult::Unwatch(args.to_string())
}

/// Print help information
fn print_help() {
    println!("{}", "Lox Language Help".bold());
    println!("{}", "=================".bold());
    println!();
    println!("{}", "Statements:".green());
    println!("  {}            - Declare a variable", "var a = 1;".cyan());
    println!("  {}           - Print a value", "print a + 2;".cyan());
    println!("  {}       - Block with its own scope", "{ var b = a; }".cyan());
    println!("  {}  - Conditional", "if (a > 1) print a; else print 0;".cyan());
    println!("  {}       - Loop", "while (a < 5) a = a + 1;".cyan());
    println!(
        "  {} - Counted loop",
        "for (var i = 0; i < 3; i = i + 1) print i;".cyan()
    );
    println!();
    println!("{}", "Functions:".green());
    println!(
        "  {} - Declare a function",
        "fun add(a, b) { return a + b; }".cyan()
    );
    println!("  {}                   - Call it", "add(1, 2);".cyan());
    println!();
    println!("{}", "Built-in Functions:".green());
    for doc in get_registry().get_documentation() {
        println!(
            "  {:<20} - {} [{}]",
            doc.signature.cyan(),
            doc.description,
            doc.category
        );
    }
    println!();
    println!("{}", "Commands:".green());
    println!("  {}         - Show this help", "help".cyan());
    println!("  {}          - List global bindings", "env".cyan());
    println!("  {}        - Discard all bindings", "reset".cyan());
    println!("  {}  - Run a script in this session", "load <file>".cyan());
    println!("  {} - Re-run a script whenever it changes", "watch <file>".cyan());
    println!("  {}        - List watched scripts", "watch".cyan());
    println!("  {} - Stop watching a script", "unwatch <file>".cyan());
    println!("  {}  - Leave the REPL", "quit / exit".cyan());
}
