//! The backend lowers a parsed program into stack machine instructions, one
//! [`EmittedFunction`] per function definition, and hands the resulting
//! [`ClassUnit`] to a [`targets::CodeGenerator`] for encoding.
//!
//! Lowering a class happens in two passes:
//! 1. Collect the signature of every function, so calls can refer to
//!    functions defined later in the file.
//! 2. Lower each function body in declaration order, with fresh scopes,
//!    labels and stack accounting per function.

use std::path::PathBuf;

use crate::{
    backend::{
        emitter::{EmittedFunction, finish_function},
        error::LoweringError,
        lowering::{ClassContext, FunctionLowering},
    },
    frontend::ast::Program,
    middle::{
        signature::SignatureTable,
        ty::{FunctionType, Type},
    },
};

pub mod emitter;
pub mod error;
pub mod ir;
pub mod lowering;
pub mod pretty_print;
pub mod stack;
pub mod targets;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Function the generated `main([Ljava/lang/String;)V` wrapper calls
    pub entry_point: String,
    /// Class providing `printInt` and `readInt`
    pub runtime_class: String,
    pub assembler_jar: PathBuf,
    /// Emit the IR of every instruction as a comment next to it
    pub annotate: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            entry_point: String::from("main"),
            runtime_class: String::from("Runtime"),
            assembler_jar: PathBuf::from("jasmin.jar"),
            annotate: false,
        }
    }
}

/// Every function of one source file, lowered into one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassUnit {
    pub class_name: String,
    pub entry_point: String,
    pub entry_signature: FunctionType,
    pub functions: Vec<EmittedFunction>,
}

impl ClassUnit {
    pub fn function(&self, name: &str) -> Option<&EmittedFunction> {
        self.functions.iter().find(|function| function.name == name)
    }
}

pub fn compile_program(
    program: &Program,
    class_name: &str,
    options: &CodegenOptions,
) -> Result<ClassUnit, LoweringError> {
    let signatures = SignatureTable::from_program(program)?;

    let entry_definition = program
        .function_definitions
        .iter()
        .find(|definition| definition.name.name == options.entry_point)
        .ok_or_else(|| LoweringError::MissingEntryPoint {
            name: options.entry_point.clone(),
        })?;

    let entry_signature = FunctionType::new(
        entry_definition.parameters.iter().map(|parameter| parameter.ty),
        entry_definition.return_type,
    );

    // The generated JVM `main` pushes no arguments and discards at most one
    // slot of result
    if !entry_signature.parameters.is_empty() || entry_signature.return_type == Type::Double {
        return Err(LoweringError::InvalidEntryPoint {
            name: options.entry_point.clone(),
            signature: entry_signature.descriptor(),
            span: entry_definition.name.span,
        });
    }

    let context = ClassContext {
        class_name,
        signatures: &signatures,
        entry_point: &options.entry_point,
    };

    let functions = program
        .function_definitions
        .iter()
        .map(|definition| {
            let mut lowering = FunctionLowering::new(context, definition)?;
            lowering.lower_body(&definition.body)?;
            finish_function(lowering)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassUnit {
        class_name: class_name.to_owned(),
        entry_point: options.entry_point.clone(),
        entry_signature,
        functions,
    })
}
