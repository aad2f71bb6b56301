use thiserror::Error;

use crate::{backend::ir::LabelId, frontend::lexer::Span};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoweringError {
    #[error("Cannot find variable `{name}` in this scope")]
    UnresolvedIdentifier { name: String, span: Span },
    #[error("Cannot find function `{name}`")]
    UnresolvedFunction { name: String, span: Span },
    #[error("{feature} is not supported by the JVM backend")]
    UnsupportedFeature { feature: String, span: Span },
    #[error("Variable `{name}` is already declared in this block")]
    Redeclaration { name: String, span: Span },
    #[error("Function `{name}` is defined more than once")]
    DuplicateFunction { name: String, span: Span },
    #[error("No entry point function `{name}` found")]
    MissingEntryPoint { name: String },
    #[error("Entry point `{name}` must take no arguments and not return a double, found `{signature}`")]
    InvalidEntryPoint {
        name: String,
        signature: String,
        span: Span,
    },

    #[error("internal error: operand stack underflow in `{function}`")]
    StackUnderflow { function: String },
    #[error(
        "internal error: operand stack depth at {label} is {found} but {expected} was recorded in `{function}`"
    )]
    StackMismatch {
        function: String,
        label: LabelId,
        expected: u32,
        found: u32,
    },
    #[error("internal error: {label} is referenced but never placed in `{function}`")]
    UnplacedLabel { function: String, label: LabelId },
    #[error("internal error: {label} is placed more than once in `{function}`")]
    DuplicateLabel { function: String, label: LabelId },
}

impl LoweringError {
    /// Source location the error points at, internal errors have none
    pub fn span(&self) -> Option<Span> {
        match self {
            LoweringError::UnresolvedIdentifier { span, .. }
            | LoweringError::UnresolvedFunction { span, .. }
            | LoweringError::UnsupportedFeature { span, .. }
            | LoweringError::Redeclaration { span, .. }
            | LoweringError::DuplicateFunction { span, .. }
            | LoweringError::InvalidEntryPoint { span, .. } => Some(*span),
            LoweringError::MissingEntryPoint { .. }
            | LoweringError::StackUnderflow { .. }
            | LoweringError::StackMismatch { .. }
            | LoweringError::UnplacedLabel { .. }
            | LoweringError::DuplicateLabel { .. } => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            LoweringError::StackUnderflow { .. }
                | LoweringError::StackMismatch { .. }
                | LoweringError::UnplacedLabel { .. }
                | LoweringError::DuplicateLabel { .. }
        )
    }
}
