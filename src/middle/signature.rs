use std::str::FromStr;

use hashbrown::HashMap;
use strum::{Display, EnumString};

use crate::{
    backend::error::LoweringError,
    frontend::ast::Program,
    middle::ty::{FunctionType, Type},
};

/// Functions provided by the runtime class rather than the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Builtin {
    PrintInt,
    ReadInt,
}

impl Builtin {
    pub fn signature(self) -> FunctionType {
        match self {
            Builtin::PrintInt => FunctionType::new([Type::Int], Type::Void),
            Builtin::ReadInt => FunctionType::new([], Type::Int),
        }
    }
}

/// What a call expression resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Callee<'table> {
    Builtin(Builtin),
    User(&'table FunctionType),
}

impl Callee<'_> {
    pub fn signature(&self) -> FunctionType {
        match self {
            Callee::Builtin(builtin) => builtin.signature(),
            Callee::User(signature) => (*signature).clone(),
        }
    }
}

/// Every user function of a class, keyed by name. Built in one pass over the
/// whole program before any body is lowered, so calls may refer to functions
/// defined further down.
#[derive(Debug, Default)]
pub struct SignatureTable {
    functions: HashMap<String, FunctionType>,
}

impl SignatureTable {
    pub fn from_program(program: &Program) -> Result<Self, LoweringError> {
        let mut functions = HashMap::new();

        for definition in &program.function_definitions {
            let name = &definition.name.name;

            if Builtin::from_str(name).is_ok() || functions.contains_key(name) {
                return Err(LoweringError::DuplicateFunction {
                    name: name.clone(),
                    span: definition.name.span,
                });
            }

            functions.insert(
                name.clone(),
                FunctionType::new(
                    definition.parameters.iter().map(|parameter| parameter.ty),
                    definition.return_type,
                ),
            );
        }

        Ok(Self { functions })
    }

    /// Built-ins take precedence over the table
    pub fn lookup(&self, name: &str) -> Option<Callee<'_>> {
        if let Ok(builtin) = Builtin::from_str(name) {
            return Some(Callee::Builtin(builtin));
        }

        self.functions.get(name).map(Callee::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{SourceFile, parser::Parser};

    fn table(source: &str) -> Result<SignatureTable, LoweringError> {
        let program = Parser::parse_program(&SourceFile::from_memory(source)).unwrap();
        SignatureTable::from_program(&program)
    }

    #[test]
    fn records_every_function() {
        let table = table("int main() { return f(1); } bool f(int x) { return true; }").unwrap();

        assert_eq!(table.lookup("main").unwrap().signature().descriptor(), "()I");
        assert_eq!(table.lookup("f").unwrap().signature().descriptor(), "(I)Z");
        assert!(table.lookup("g").is_none());
    }

    #[test]
    fn builtins_bypass_the_table() {
        let table = table("int main() { return 0; }").unwrap();

        assert_eq!(
            table.lookup("printInt"),
            Some(Callee::Builtin(Builtin::PrintInt))
        );
        assert_eq!(
            table.lookup("readInt").unwrap().signature().descriptor(),
            "()I"
        );
    }

    #[test]
    fn rejects_duplicate_functions() {
        let error = table("int f() { return 0; } void f() {}").unwrap_err();

        assert!(matches!(error, LoweringError::DuplicateFunction { ref name, .. } if name == "f"));
    }

    #[test]
    fn rejects_redefining_a_builtin() {
        assert!(table("void printInt(int x) {}").is_err());
    }
}
