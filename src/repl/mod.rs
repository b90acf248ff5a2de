//! REPL (Read-Eval-Print Loop) for the Lox language

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::repl::watcher::FileWatcher;
use crate::runner::{read_source, report_run_error};
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use lox_core::InterpreterConfig;
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::Path;
use std::thread;

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// What the loop should do after handling one line
#[derive(Debug, PartialEq)]
enum LineOutcome {
    Continue,
    Exit,
}

/// Interactive REPL for the Lox language
pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    // File watcher
    watcher: Option<FileWatcher>,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(config: InterpreterConfig) -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            registry: create_registry(),
            ctx: CommandContext::new(config),
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        })
    }

    /// Handle one line of input: a command or Lox source
    fn handle_line(&mut self, line: &str) -> LineOutcome {
        if line.is_empty() {
            return LineOutcome::Continue;
        }

        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => {
                if !msg.is_empty() {
                    println!("{}", msg);
                }
            }
            CommandResult::Exit => return LineOutcome::Exit,
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::Watch(path) => self.watch(&path),
            CommandResult::Unwatch(path) => self.unwatch(&path),
            CommandResult::ListWatched => self.list_watched(),
            CommandResult::NotACommand => {
                if let Err(err) = self.ctx.session.run(line) {
                    report_run_error(&err);
                }
            }
        }

        LineOutcome::Continue
    }

    fn watch(&mut self, path: &str) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{} Failed to create watcher: {}", "Error:".red(), e);
                    return;
                }
            }
        }

        if let Some(w) = &mut self.watcher {
            match w.watch(path) {
                Ok(()) => {
                    println!("{} Watching {} for changes...", "👀", path.bright_green());
                    // Run once now so the session reflects the current contents
                    self.reload(Path::new(path));
                }
                Err(e) => println!("{} Failed to watch {}: {}", "Error:".red(), path, e),
            }
        }
    }

    fn unwatch(&mut self, path: &str) {
        let result = match &mut self.watcher {
            Some(w) => w.unwatch(path),
            None => {
                println!("{} Not watching {}", "Error:".red(), path);
                return;
            }
        };

        match result {
            Ok(()) => println!("Stopped watching {}", path.bright_green()),
            Err(e) => println!("{} Failed to unwatch {}: {}", "Error:".red(), path, e),
        }
    }

    fn list_watched(&self) {
        let watched: Vec<_> = self
            .watcher
            .iter()
            .flat_map(|w| w.watched())
            .collect();

        if watched.is_empty() {
            println!("No scripts are being watched.");
        }
        for path in watched {
            println!("  {}", path.display().to_string().bright_green());
        }
    }

    /// Re-run a watched script into the current session
    fn reload(&mut self, path: &Path) {
        let source = match read_source(path) {
            Ok(source) => source,
            Err(e) => {
                println!("{} {:#}", "Error:".red(), e);
                return;
            }
        };

        tracing::debug!(path = %path.display(), "reloading watched script");
        match self.ctx.session.run(&source) {
            Ok(()) => println!("{} Reloaded {}", "✓".bright_green(), path.display()),
            Err(err) => report_run_error(&err),
        }
    }

    fn handle_watch_event(&mut self, event: Event) {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }

        for path in event.paths {
            println!("{} File changed: {}", "⚡".bright_yellow(), path.display());
            self.reload(&path);
        }
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Lox".bright_cyan().bold());
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+D".bright_red()
        );

        // Move editor to thread
        let Some(mut editor) = self.editor.take() else {
            anyhow::bail!("REPL is already running");
        };
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", ">".bright_magenta().bold());
            let readline = editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if self.handle_line(&line) == LineOutcome::Exit {
                            println!("{}", "Goodbye!".bright_cyan());
                            break;
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted | ReadlineError::Eof))) => {
                        println!("{}", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break, // Channel closed
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_watch_event(event),
                    Ok(Err(e)) => println!("{} Watch error: {}", "Error:".red(), e),
                    Err(_) => break, // Channel closed
                }
            }
        }

        Ok(())
    }
}

/// Convenience function to start the REPL
pub fn start(config: InterpreterConfig) -> Result<()> {
    crate::logging::init_tracing();
    let mut repl =
        Repl::new(config).map_err(|e| anyhow::anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_core::{Interpreter, OutputBuffer, Session};

    fn repl_with_output() -> (Repl, OutputBuffer) {
        let output = OutputBuffer::new();
        let mut repl = Repl::new(InterpreterConfig::default()).unwrap();
        let session = Session::with_interpreter(Interpreter::new().with_output(output.clone()));
        repl.ctx = CommandContext::with_session(session);
        (repl, output)
    }

    #[test]
    fn test_lines_share_one_session() {
        let (mut repl, output) = repl_with_output();

        assert_eq!(repl.handle_line("var a = 1;"), LineOutcome::Continue);
        assert_eq!(repl.handle_line("fun bump() { a = a + 1; }"), LineOutcome::Continue);
        assert_eq!(repl.handle_line("bump(); print a;"), LineOutcome::Continue);
        assert_eq!(output.contents(), "2\n");
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let (mut repl, output) = repl_with_output();

        assert_eq!(repl.handle_line("print ;"), LineOutcome::Continue);
        assert_eq!(repl.handle_line("print nope;"), LineOutcome::Continue);
        assert_eq!(repl.handle_line("print \"still here\";"), LineOutcome::Continue);
        assert_eq!(output.contents(), "still here\n");
    }

    #[test]
    fn test_watch_and_unwatch_lines() {
        let (mut repl, output) = repl_with_output();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"var watched = 7;").unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert_eq!(repl.handle_line(&format!("watch {}", path)), LineOutcome::Continue);
        let watched: Vec<_> = repl.watcher.iter().flat_map(|w| w.watched()).collect();
        assert_eq!(watched, vec![file.path()]);

        repl.handle_line("print watched;");
        assert_eq!(output.contents(), "7\n");

        assert_eq!(repl.handle_line(&format!("unwatch {}", path)), LineOutcome::Continue);
        assert_eq!(repl.watcher.iter().flat_map(|w| w.watched()).count(), 0);
    }

    #[test]
    fn test_quit_ends_the_loop() {
        let (mut repl, _) = repl_with_output();
        assert_eq!(repl.handle_line("quit"), LineOutcome::Exit);
    }
}
