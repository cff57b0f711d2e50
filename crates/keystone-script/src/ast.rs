// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions for Keystone.

/// A complete script or module body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// A Keystone statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let name = value`
    Let {
        /// Binding name
        name: String,
        /// Initializer
        value: Expression,
    },
    /// `export name = value`, sets a property on the module's exports
    Export {
        /// Export name
        name: String,
        /// Exported value
        value: Expression,
    },
    /// `print a, b, ...`
    Print(Vec<Expression>),
    /// `assert condition [, message]`
    Assert {
        /// Condition that must be truthy
        condition: Expression,
        /// Message used when the assertion fails
        message: Option<Expression>,
        /// Source line, for the default message
        line: usize,
    },
    /// `raise value`
    Raise(Expression),
    /// Expression statement
    Expression(Expression),
}

/// A Keystone expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Variable or builtin reference
    Identifier(String),
    /// `[a, b, c]`
    List(Vec<Expression>),
    /// `object.name`
    Field {
        /// Object being read
        object: Box<Expression>,
        /// Property name
        name: String,
    },
    /// `callee(arguments)`
    Call {
        /// Function being called
        callee: Box<Expression>,
        /// Arguments, in order
        arguments: Vec<Expression>,
    },
    /// `left op right`
    Binary {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `-operand`
    Negate(Box<Expression>),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// nil
    Nil,
    /// true / false
    Boolean(bool),
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// ==
    Equal,
    /// !=
    NotEqual,
}
