//! A compiler from C--, a small subset of C with `int`, `bool`, `double` and
//! `void`, to Jasmin assembly for the JVM.
//!
//! ```text
//! source -> frontend (lexer, parser) -> backend::lowering -> backend::emitter
//!        -> backend::targets (Jasmin text) -> java -jar jasmin.jar
//! ```

pub mod backend;
pub mod error;
pub mod frontend;
pub mod index;
pub mod middle;

use crate::{
    backend::{
        ClassUnit, CodegenOptions, compile_program,
        targets::{CodeGenerator, Target},
    },
    error::CompileError,
    frontend::{SourceFile, parser::Parser},
};

/// Parses and lowers `source` into a class named after it
pub fn lower_source(source: &SourceFile, options: &CodegenOptions) -> Result<ClassUnit, CompileError> {
    let program = Parser::parse_program(source)?;

    Ok(compile_program(&program, &source.class_name(), options)?)
}

/// Compiles `source` all the way to Jasmin text
pub fn compile_source(source: &SourceFile, options: &CodegenOptions) -> Result<String, CompileError> {
    let unit = lower_source(source, options)?;

    Ok(Target::Jasmin
        .get_code_generator()
        .translate_to_asm(&unit, options))
}
