// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # keystone-script
//!
//! A small scripting language whose modules are loaded by
//! [`keystone_modules`].
//!
//! ## Overview
//!
//! ```text
//! # util.ks
//! let text = require("text")
//! export shout = text.upper
//!
//! # main.ks
//! let util = require("./util")
//! print util.shout("hello"), __file__
//! assert util == require("./util"), "modules are cached"
//! ```
//!
//! Statements: `let`, `export`, `print`, `assert`, `raise` and expression
//! statements. Expressions: literals, lists, names, field access, calls,
//! `==` and `!=`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keystone_script::Engine;
//!
//! let mut loader = keystone_script::loader_from_config(&LoaderConfig::load()?);
//! let mut engine = Engine::new();
//! engine.run_file(&mut loader, Path::new("main.ks"))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod lexer;
pub mod parser;

use interpreter::{Frame, Interpreter};
use keystone_modules::{
    LoaderConfig, ModuleError, ModuleLoader, ModuleRecord, ScriptEvaluator, SearchPath, Value,
};
use parking_lot::Mutex;
use parser::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Build a loader from configuration with the default native modules
pub fn loader_from_config(config: &LoaderConfig) -> ModuleLoader {
    let search_path = SearchPath::from_environment(config);
    let natives = builtins::native_modules(&search_path);
    ModuleLoader::new(search_path)
        .with_probes(config.probes())
        .with_natives(natives)
}

/// Where `print` writes
#[derive(Debug, Clone, Default)]
pub struct Output {
    captured: Option<Arc<Mutex<String>>>,
}

impl Output {
    /// Write to standard output
    pub fn stdout() -> Self {
        Self::default()
    }

    /// Collect output in memory
    pub fn captured() -> Self {
        Self {
            captured: Some(Arc::new(Mutex::new(String::new()))),
        }
    }

    /// Write one line
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match &self.captured {
            Some(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(line);
                buffer.push('\n');
                Ok(())
            }
            None => writeln!(io::stdout().lock(), "{}", line),
        }
    }

    /// Take everything captured so far
    pub fn take(&self) -> String {
        self.captured
            .as_ref()
            .map(|buffer| std::mem::take(&mut *buffer.lock()))
            .unwrap_or_default()
    }
}

/// The Keystone script engine.
///
/// The engine holds the interactive session (bindings made by
/// [`eval`](Engine::eval)) and the output sink. Modules get a fresh frame
/// each, so nothing leaks between them and the session.
#[derive(Debug, Default)]
pub struct Engine {
    output: Output,
    session: Frame,
}

impl Engine {
    /// Creates an engine printing to standard output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given output sink.
    pub fn with_output(output: Output) -> Self {
        Self {
            output,
            session: Frame::default(),
        }
    }

    /// The output sink
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Evaluates source in the interactive session and returns the value of
    /// its trailing expression statement.
    ///
    /// Relative requires resolve against the working directory.
    pub fn eval(&mut self, loader: &mut ModuleLoader, source: &str) -> Result<Value, Error> {
        let program = Parser::new(source).parse_program()?;

        // The interpreter needs the engine mutably for nested requires, so
        // the session frame is moved out for the duration of the run.
        let mut frame = std::mem::take(&mut self.session);
        let result = Interpreter::new(self, loader, &mut frame).run(&program);
        self.session = frame;
        result
    }

    /// Runs a file as the entry module.
    pub fn run_file(&mut self, loader: &mut ModuleLoader, path: &Path) -> Result<ModuleRecord, Error> {
        Ok(loader.run_main(self, path)?)
    }

    /// The interactive session's bindings
    pub fn session(&self) -> &Frame {
        &self.session
    }

    /// Drops all session bindings and exports.
    pub fn reset_session(&mut self) {
        self.session = Frame::default();
    }
}

impl ScriptEvaluator for Engine {
    fn evaluate(
        &mut self,
        loader: &mut ModuleLoader,
        source: &str,
        module: &ModuleRecord,
    ) -> keystone_modules::Result<()> {
        debug!("Evaluating module {}", module.key());
        let program = Parser::new(source)
            .parse_program()
            .map_err(Error::into_module_error)?;
        let mut frame = Frame::for_module(module);
        Interpreter::new(self, loader, &mut frame)
            .run(&program)
            .map(drop)
            .map_err(Error::into_module_error)
    }
}

/// Errors raised while running Keystone code.
#[derive(Debug, Error)]
pub enum Error {
    /// Syntax error during parsing
    #[error("SyntaxError: {message} (line {line})")]
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based source line
        line: usize,
    },

    /// Reference to an unbound name
    #[error("NameError: '{0}' is not defined")]
    Name(String),

    /// Operation applied to the wrong kind of value
    #[error("TypeError: {0}")]
    Type(String),

    /// Failed `assert`
    #[error("AssertionError: {0}")]
    Assertion(String),

    /// Value passed to `raise`
    #[error("Error: {0}")]
    Raised(String),

    /// Error from the module system, including errors raised by nested
    /// module bodies
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Failed to write output
    #[error("IOError: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Convert for the loader, passing module errors through untouched so a
    /// nested failure reaches the outermost caller unchanged
    pub fn into_module_error(self) -> ModuleError {
        match self {
            Error::Module(err) => err,
            other => ModuleError::evaluation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_modules::ErrorKind;

    fn engine() -> (Engine, ModuleLoader) {
        let loader = ModuleLoader::default()
            .with_natives(builtins::native_modules(&SearchPath::new()));
        (Engine::with_output(Output::captured()), loader)
    }

    #[test]
    fn test_eval_returns_trailing_expression() {
        let (mut engine, mut loader) = engine();
        assert_eq!(engine.eval(&mut loader, "let a = 1\na").unwrap(), Value::Number(1.0));
        assert_eq!(engine.eval(&mut loader, "let b = 2").unwrap(), Value::Nil);
        // Session bindings persist across evaluations
        assert_eq!(engine.eval(&mut loader, "a == 1").unwrap(), Value::Bool(true));
        assert!(engine.session().local("b").is_some());
    }

    #[test]
    fn test_print_and_natives() {
        let (mut engine, mut loader) = engine();
        engine
            .eval(&mut loader, "let text = require(\"text\")\nprint text.upper(\"hi\"), [1, nil]")
            .unwrap();
        assert_eq!(engine.output().take(), "HI [1, nil]\n");
    }

    #[test]
    fn test_runtime_errors() {
        let (mut engine, mut loader) = engine();
        let err = engine.eval(&mut loader, "missing").unwrap_err();
        assert_eq!(err.to_string(), "NameError: 'missing' is not defined");

        let err = engine.eval(&mut loader, "assert 1 == 2").unwrap_err();
        assert_eq!(err.to_string(), "AssertionError: assertion failed on line 1");

        let err = engine.eval(&mut loader, "raise \"boom\"").unwrap_err();
        assert_eq!(err.to_string(), "Error: boom");

        let err = engine.eval(&mut loader, "let r = require\n").unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_require_argument_errors() {
        let (mut engine, mut loader) = engine();
        let err = engine.eval(&mut loader, "require(42)").unwrap_err();
        match err {
            Error::Module(err) => assert_eq!(err.kind(), ErrorKind::Type),
            other => panic!("expected a module error, got {:?}", other),
        }

        let err = engine.eval(&mut loader, "require(\"\")").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: identifier must contain at least one character"
        );
    }

    #[test]
    fn test_script_errors_become_evaluation_errors() {
        let err = Error::Raised("boom".into()).into_module_error();
        assert_eq!(err.kind(), ErrorKind::Evaluation);
        assert_eq!(err.to_string(), "Error: boom");

        let err = Error::Module(ModuleError::not_found("x")).into_module_error();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
