use colored::*;
use lox::cli::{parse_args, Command, USAGE};
use lox::logging::init_tracing;
use lox::runner::{self, EXIT_USAGE};
use std::process::ExitCode;

fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{} {}", "Error:".bright_red().bold(), message);
            eprintln!("{}", USAGE);
            return exit_code(EXIT_USAGE);
        }
    };

    let status = match args.command {
        Command::Help => {
            println!("{}", USAGE);
            0
        }
        Command::Run(path) => runner::run_file(&path, args.config),
        Command::Tokens(path) => runner::print_tokens(&path),
        Command::Parse(path) => runner::print_tree(&path),
        Command::Repl => match lox::repl::start(args.config) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{} {:#}", "Error:".bright_red().bold(), err);
                1
            }
        },
    };

    exit_code(status)
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}
