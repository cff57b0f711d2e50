// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree-walking interpreter
//!
//! Each module body runs in its own [`Frame`]. Module-level names that are
//! not bound by `let` fall back to the builtins: `exports`, `__file__`,
//! `__dir__` and the require family.

use crate::ast::*;
use crate::{Engine, Error};
use keystone_modules::{require, Exports, ModuleLoader, ModuleRecord, Value};
use std::collections::HashMap;

/// Builtins that need the loader and therefore can only be called directly
const REQUIRE: &str = "require";
const REQUIRE_RESOLVE: &str = "require_resolve";
const REQUIRE_CACHE: &str = "require_cache";

/// Variables and module context of one running body
#[derive(Debug, Default)]
pub struct Frame {
    locals: HashMap<String, Value>,
    exports: Exports,
    file: Value,
    dir: Value,
}

impl Frame {
    /// Frame for a module body: `exports` is the record's exports object
    pub fn for_module(module: &ModuleRecord) -> Self {
        let to_value = |p: &std::path::Path| Value::String(p.display().to_string());
        Self {
            locals: HashMap::new(),
            exports: module.exports().clone(),
            file: module.path().map(to_value).unwrap_or_default(),
            dir: module.directory().map(to_value).unwrap_or_default(),
        }
    }

    /// Look up a `let` binding
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// The exports this frame writes to
    pub fn exports(&self) -> &Exports {
        &self.exports
    }
}

/// Executes a program against a frame
pub(crate) struct Interpreter<'a> {
    engine: &'a mut Engine,
    loader: &'a mut ModuleLoader,
    frame: &'a mut Frame,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(engine: &'a mut Engine, loader: &'a mut ModuleLoader, frame: &'a mut Frame) -> Self {
        Self {
            engine,
            loader,
            frame,
        }
    }

    /// Run every statement; the value of a trailing expression statement is
    /// the program's value
    pub(crate) fn run(&mut self, program: &Program) -> Result<Value, Error> {
        let mut last = Value::Nil;
        for statement in &program.body {
            last = self.execute(statement)?;
        }
        Ok(last)
    }

    fn execute(&mut self, statement: &Statement) -> Result<Value, Error> {
        match statement {
            Statement::Let { name, value } => {
                let value = self.evaluate(value)?;
                self.frame.locals.insert(name.clone(), value);
            }
            Statement::Export { name, value } => {
                let value = self.evaluate(value)?;
                self.frame.exports.set(name.clone(), value);
            }
            Statement::Print(values) => {
                let mut line = Vec::with_capacity(values.len());
                for value in values {
                    line.push(self.evaluate(value)?.to_string());
                }
                self.engine.output().write_line(&line.join(" "))?;
            }
            Statement::Assert {
                condition,
                message,
                line,
            } => {
                if !self.evaluate(condition)?.is_truthy() {
                    let message = match message {
                        Some(message) => self.evaluate(message)?.to_string(),
                        None => format!("assertion failed on line {}", line),
                    };
                    return Err(Error::Assertion(message));
                }
            }
            Statement::Raise(value) => {
                let value = self.evaluate(value)?;
                return Err(Error::Raised(value.to_string()));
            }
            Statement::Expression(expr) => return self.evaluate(expr),
        }
        Ok(Value::Nil)
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value, Error> {
        match expr {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Nil => Value::Nil,
                Literal::Boolean(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expression::Identifier(name) => self.lookup(name),
            Expression::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(items))
            }
            Expression::Field { object, name } => match self.evaluate(object)? {
                // Missing properties read as nil; a module still loading may
                // not have set them yet
                Value::Module(exports) => Ok(exports.get(name).unwrap_or_default()),
                other => Err(Error::Type(format!(
                    "cannot read property '{}' of {}",
                    name,
                    other.type_name()
                ))),
            },
            Expression::Call { callee, arguments } => self.call(callee, arguments),
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(Value::Bool(match operator {
                    BinaryOperator::Equal => left == right,
                    BinaryOperator::NotEqual => left != right,
                }))
            }
            Expression::Negate(operand) => match self.evaluate(operand)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(Error::Type(format!("cannot negate {}", other.type_name()))),
            },
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, Error> {
        if let Some(value) = self.frame.locals.get(name) {
            return Ok(value.clone());
        }

        match name {
            "exports" => Ok(Value::Module(self.frame.exports.clone())),
            "__file__" => Ok(self.frame.file.clone()),
            "__dir__" => Ok(self.frame.dir.clone()),
            REQUIRE | REQUIRE_RESOLVE | REQUIRE_CACHE => Err(Error::Type(format!(
                "'{}' can only be called directly",
                name
            ))),
            _ => Err(Error::Name(name.to_string())),
        }
    }

    fn call(&mut self, callee: &Expression, arguments: &[Expression]) -> Result<Value, Error> {
        if let Expression::Identifier(name) = callee {
            if !self.frame.locals.contains_key(name) {
                match name.as_str() {
                    REQUIRE => {
                        let args = self.arguments(arguments)?;
                        return Ok(require::require(self.loader, &mut *self.engine, &args)?);
                    }
                    REQUIRE_RESOLVE => {
                        let args = self.arguments(arguments)?;
                        return Ok(require::require_resolve(self.loader, &args)?);
                    }
                    REQUIRE_CACHE => return Ok(require::require_cache(self.loader)),
                    _ => {}
                }
            }
        }

        let function = match self.evaluate(callee)? {
            Value::Function(function) => function,
            other => {
                return Err(Error::Type(format!("{} is not a function", other.type_name())));
            }
        };
        let args = self.arguments(arguments)?;
        function.call(&args).map_err(Error::Type)
    }

    fn arguments(&mut self, arguments: &[Expression]) -> Result<Vec<Value>, Error> {
        arguments.iter().map(|arg| self.evaluate(arg)).collect()
    }
}
