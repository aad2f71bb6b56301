use std::{path::Path, process::Command};

use crate::backend::{ClassUnit, CodegenOptions};

mod jasmin;

pub trait CodeGenerator {
    /// File extension of the assembly this generator writes
    fn asm_extension(&self) -> &'static str;
    fn translate_to_asm(&self, unit: &ClassUnit, options: &CodegenOptions) -> String;
    fn create_assembler_command(
        &self,
        input_file: &Path,
        output_directory: &Path,
        options: &CodegenOptions,
    ) -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Jasmin,
}

impl Target {
    pub fn get_code_generator(self) -> impl CodeGenerator {
        match self {
            Target::Jasmin => jasmin::CodeGeneratorJasmin,
        }
    }
}
