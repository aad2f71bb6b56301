use thiserror::Error;

use crate::{
    backend::error::LoweringError,
    frontend::{SourceFile, lexer::Span, parser::ParseError},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Lowering(#[from] LoweringError),
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parse(error) => Some(error.span),
            CompileError::Lowering(error) => error.span(),
        }
    }

    /// `origin:row:column` of the error, when it points into the source
    pub fn location(&self, source: &SourceFile) -> Option<String> {
        self.span().map(|span| {
            format!(
                "{}:{}:{}",
                source.origin,
                source.row_for_position(span.start),
                source.column_for_position(span.start)
            )
        })
    }
}
