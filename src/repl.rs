// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL (Read-Eval-Print Loop) for Keystone.
//!
//! Input is evaluated in one long-lived session: `let` bindings persist
//! between lines and relative requires resolve against the working
//! directory.

use keystone_modules::{ModuleLoader, ModuleState, Value};
use keystone_script::Engine;
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::warn;

/// REPL configuration constants
const HISTORY_FILE: &str = ".keystone_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &["let", "export", "print", "assert", "raise"];
const LITERALS: &[&str] = &["true", "false", "nil"];
const BUILTINS: &[&str] = &[
    "require",
    "require_resolve",
    "require_cache",
    "exports",
    "__file__",
    "__dir__",
];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Cache,
    Reload,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;

        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "cache" => Some((ReplCommand::Cache, arg)),
            "reload" | "r" => Some((ReplCommand::Reload, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <file>", "Evaluate a file in this session"),
            (".cache", "List cached modules"),
            (".reload <id>", "Re-evaluate a module and replace its cache entry"),
        ]
    }
}

/// Helper struct for rustyline that provides completion, hints, and validation
struct KeystoneHelper {
    /// Keywords, builtins and native module names for completion
    words: Vec<String>,
}

impl KeystoneHelper {
    fn new<'a>(natives: impl Iterator<Item = &'a str>) -> Self {
        let mut words: Vec<String> = KEYWORDS
            .iter()
            .chain(LITERALS)
            .chain(BUILTINS)
            .map(|w| w.to_string())
            .collect();
        words.extend(natives.map(|name| format!("require(\"{}\")", name)));
        words.extend(ReplCommand::all_commands().iter().map(|(cmd, _)| {
            cmd.split_whitespace().next().unwrap_or(cmd).to_string()
        }));

        Self { words }
    }

    fn candidates<'w>(&'w self, word: &'w str) -> impl Iterator<Item = &'w String> {
        self.words
            .iter()
            .filter(move |w| w.starts_with(word) && w.len() > word.len())
    }
}

/// Start of the word ending at `pos`
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl Completer for KeystoneHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[word_start(line, pos)..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches = self
            .candidates(word)
            .map(|w| Pair {
                display: w.clone(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for KeystoneHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.candidates(word)
            .next()
            .map(|w| (&w[word.len()..]).dimmed().to_string())
    }
}

impl Highlighter for KeystoneHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut current_word = String::new();
        let mut in_string: Option<char> = None;

        for c in line.chars() {
            if let Some(quote) = in_string {
                result.push_str(&c.to_string().green().to_string());
                if c == quote {
                    in_string = None;
                }
                continue;
            }

            if c.is_alphanumeric() || c == '_' {
                current_word.push(c);
                continue;
            }

            if !current_word.is_empty() {
                result.push_str(&highlight_word(&current_word));
                current_word.clear();
            }

            let colored = match c {
                '(' | ')' | '[' | ']' => c.to_string().yellow().to_string(),
                '=' | '!' | '-' => c.to_string().cyan().to_string(),
                '"' | '\'' => {
                    in_string = Some(c);
                    c.to_string().green().to_string()
                }
                '.' if line.starts_with('.') => c.to_string().magenta().to_string(),
                _ => c.to_string(),
            };
            result.push_str(&colored);
        }

        if !current_word.is_empty() {
            result.push_str(&highlight_word(&current_word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn highlight_word(word: &str) -> String {
    if KEYWORDS.contains(&word) {
        word.magenta().bold().to_string()
    } else if LITERALS.contains(&word) {
        word.blue().to_string()
    } else if BUILTINS.contains(&word) {
        word.cyan().to_string()
    } else if word.starts_with(|c: char| c.is_ascii_digit()) {
        word.yellow().to_string()
    } else {
        word.to_string()
    }
}

impl Validator for KeystoneHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        // A trailing operator or separator expects more input
        let trimmed = input.trim();
        if ["=", "==", "!=", ",", "(", "[", "."]
            .iter()
            .any(|suffix| trimmed.ends_with(suffix))
            && !trimmed.starts_with('.')
        {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Check if brackets and parentheses are balanced
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = None;
    let mut escape_next = false;
    let mut in_comment = false;

    for c in input.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }

        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string.is_some() {
            escape_next = true;
            continue;
        }

        match in_string {
            Some(quote) if c == quote => in_string = None,
            Some(_) => {}
            None => match c {
                '#' => in_comment = true,
                '"' | '\'' => in_string = Some(c),
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                ')' | ']' => {
                    if stack.pop() != Some(c) {
                        // Unbalanced; let the parser report it
                        return true;
                    }
                }
                _ => {}
            },
        }
    }

    stack.is_empty() && in_string.is_none()
}

impl Helper for KeystoneHelper {}

/// The interactive REPL
pub struct Repl {
    engine: Engine,
    loader: ModuleLoader,
    editor: Editor<KeystoneHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance over `loader`
    pub fn new(loader: ModuleLoader) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(KeystoneHelper::new(loader.native_names())));

        // Determine history file path
        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keystone")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Cannot create history directory {}: {}", parent.display(), e);
            }
        }

        // A missing history file is normal on first start
        let _ = editor.load_history(&history_path);

        Ok(Self {
            engine: Engine::new(),
            loader,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "keystone>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        if let Err(e) = self.editor.save_history(&self.history_path) {
            warn!("Cannot save history to {}: {}", self.history_path.display(), e);
        }

        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "Keystone".white().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => self.print_version(),
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(Path::new(path)),
                None => missing_argument(".load", "a file path"),
            },
            ReplCommand::Cache => self.print_cache(),
            ReplCommand::Reload => match arg {
                Some(identifier) => self.reload(identifier),
                None => missing_argument(".reload", "a module identifier"),
            },
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:16} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:16} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:16} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:16} {}", "Tab".yellow(), "Autocomplete".dimmed());
        println!();
    }

    fn print_version(&self) {
        println!();
        println!("{}: {}", "Keystone".bright_cyan().bold(), env!("CARGO_PKG_VERSION").yellow());
        println!(
            "{}: {}-{}",
            "Platform".dimmed(),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        println!();
    }

    fn print_cache(&self) {
        let keys = self.loader.cache().keys();
        if keys.is_empty() {
            println!("{}", "(no modules loaded)".dimmed());
            return;
        }

        for key in keys {
            let Some(record) = self.loader.cache().get(&key) else {
                continue;
            };
            let state = match record.state() {
                ModuleState::Loading => "loading".yellow().to_string(),
                ModuleState::Loaded => "loaded".green().to_string(),
                ModuleState::Failed => "failed".red().to_string(),
            };
            println!("  {:8} {}", state, key);
        }
    }

    fn load_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(source) => self.eval_and_print(&source),
            Err(e) => eprintln!(
                "{}: cannot read '{}': {}",
                "Error".red().bold(),
                path.display().cyan(),
                e
            ),
        }
    }

    fn reload(&mut self, identifier: &str) {
        match self.loader.require(&mut self.engine, identifier, true) {
            Ok(exports) => println!("{}", format_value(&Value::Module(exports))),
            Err(e) => print_error(&e),
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.engine.eval(&mut self.loader, input) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(e) => print_error(&e),
        }
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

fn missing_argument(command: &str, what: &str) {
    eprintln!(
        "{}: {} {}",
        "Error".red().bold(),
        command.cyan(),
        format!("requires {}", what).dimmed()
    );
}

/// Format a value for display with syntax coloring
fn format_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".blue().dimmed().to_string(),
        Value::Bool(b) => b.to_string().yellow().to_string(),
        Value::Number(_) => value.to_string().yellow().to_string(),
        Value::String(s) => format!("{:?}", s).green().to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Module(_) | Value::Function(_) => value.to_string().cyan().to_string(),
    }
}

/// Print a formatted error message
pub fn print_error(error: &dyn std::error::Error) {
    let error_str = error.to_string();

    // Split error type from message
    match error_str.find(':') {
        Some(colon_pos) => {
            let (error_type, message) = error_str.split_at(colon_pos);
            eprintln!("{}{}", error_type.red().bold(), message);
        }
        None => eprintln!("{}", error_str.red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_modules::Exports;

    #[test]
    fn test_repl_command_parse() {
        assert_eq!(ReplCommand::parse(".help"), Some((ReplCommand::Help, None)));
        assert_eq!(ReplCommand::parse(".exit"), Some((ReplCommand::Exit, None)));
        assert_eq!(
            ReplCommand::parse(".load  main.ks "),
            Some((ReplCommand::Load, Some("main.ks")))
        );
        assert_eq!(
            ReplCommand::parse(".reload ./util"),
            Some((ReplCommand::Reload, Some("./util")))
        );
        assert_eq!(ReplCommand::parse(".cache"), Some((ReplCommand::Cache, None)));
        assert!(ReplCommand::parse(".bogus").is_none());
        assert!(ReplCommand::parse("print 1").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("require(\"util\")"));
        assert!(is_balanced("[1, [2]]"));
        assert!(!is_balanced("require(\"util\""));
        assert!(!is_balanced("[1, 2"));
        assert!(is_balanced("'string with (unbalanced'"));
        assert!(is_balanced("print 1 # comment with ("));
    }

    #[test]
    fn test_completion_candidates() {
        let helper = KeystoneHelper::new(["sys", "text"].into_iter());
        let found: Vec<&String> = helper.candidates("req").collect();
        assert!(found.iter().any(|w| *w == "require"));
        assert!(found.iter().any(|w| *w == "require(\"sys\")"));
        assert!(helper.candidates(".rel").any(|w| w == ".reload"));
    }

    #[test]
    fn test_format_value_plain_parts() {
        let exports = Exports::new();
        exports.set("a", 1.0);
        assert!(format_value(&Value::Module(exports)).contains("[module {a}]"));
        assert!(format_value(&Value::from("hi")).contains("\"hi\""));
    }
}
