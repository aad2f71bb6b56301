//! Typed syntax tree handed to the backend. Declared types live on function
//! definitions, parameters and local declarations; expression types are
//! derived from those during lowering.

use crate::{frontend::lexer::Span, middle::ty::Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub function_definitions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub span: Span,
    pub return_type: Type,
    pub name: Identifier,
    pub parameters: Vec<FunctionParameter>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub span: Span,
    pub ty: Type,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub span: Span,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `e;`
    Expression(Expression),
    /// `int x, y, z;`
    Declarations { ty: Type, names: Vec<Identifier> },
    /// `int x = e;`
    Initialization {
        ty: Type,
        name: Identifier,
        initializer: Expression,
    },
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `return e;` or `return;`
    Return(Option<Expression>),
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    IfElse {
        condition: Expression,
        positive: Box<Statement>,
        negative: Box<Statement>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(Identifier),
    FunctionCall {
        target: Identifier,
        arguments: Vec<Expression>,
    },
    Increment {
        kind: IncrementKind,
        target: Identifier,
    },
    Binary {
        lhs: Box<Expression>,
        operator: BinaryOperatorKind,
        rhs: Box<Expression>,
    },
    Assignment {
        target: Identifier,
        value: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Integer(i32),
    Double(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementKind {
    PreIncrement,  // ++x
    PreDecrement,  // --x
    PostIncrement, // x++
    PostDecrement, // x--
}

impl IncrementKind {
    pub fn delta(self) -> i32 {
        match self {
            Self::PreIncrement | Self::PostIncrement => 1,
            Self::PreDecrement | Self::PostDecrement => -1,
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, Self::PreIncrement | Self::PreDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorKind {
    Add,                  // +
    Subtract,             // -
    Multiply,             // *
    Divide,               // /
    Equals,               // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=
    LogicalAnd,           // &&
    LogicalOr,            // ||
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorClass {
    Arithmetic,
    Comparison,
    Logical,
}

impl BinaryOperatorKind {
    pub fn class(self) -> BinaryOperatorClass {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                BinaryOperatorClass::Arithmetic
            }
            Self::Equals
            | Self::NotEquals
            | Self::LessThan
            | Self::LessThanOrEqualTo
            | Self::GreaterThan
            | Self::GreaterThanOrEqualTo => BinaryOperatorClass::Comparison,
            Self::LogicalAnd | Self::LogicalOr => BinaryOperatorClass::Logical,
        }
    }
}

impl core::fmt::Display for BinaryOperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Subtract => write!(f, "-"),
            Self::Multiply => write!(f, "*"),
            Self::Divide => write!(f, "/"),
            Self::Equals => write!(f, "=="),
            Self::NotEquals => write!(f, "!="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqualTo => write!(f, "<="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqualTo => write!(f, ">="),
            Self::LogicalAnd => write!(f, "&&"),
            Self::LogicalOr => write!(f, "||"),
        }
    }
}
