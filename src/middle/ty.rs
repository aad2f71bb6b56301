use itertools::Itertools;
use strum::{Display, EnumIter};

/// The primitive types of the source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    Bool,
    Int,
    Double,
    Void,
}

impl Type {
    /// Number of JVM slots (local variable or operand stack) a value occupies
    pub fn size(self) -> u32 {
        match self {
            Type::Bool | Type::Int => 1,
            Type::Double => 2,
            Type::Void => 0,
        }
    }

    pub fn descriptor_code(self) -> char {
        match self {
            Type::Bool => 'Z',
            Type::Int => 'I',
            Type::Double => 'D',
            Type::Void => 'V',
        }
    }

    /// Whether values of this type are represented as a JVM int
    pub fn is_int_class(self) -> bool {
        matches!(self, Type::Bool | Type::Int)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl FunctionType {
    pub fn new(parameters: impl IntoIterator<Item = Type>, return_type: Type) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
            return_type,
        }
    }

    /// `(IZ)V`
    pub fn descriptor(&self) -> String {
        format!(
            "({}){}",
            self.parameters.iter().map(|ty| ty.descriptor_code()).join(""),
            self.return_type.descriptor_code()
        )
    }

    pub fn parameter_slots(&self) -> u32 {
        self.parameters.iter().map(|ty| ty.size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn descriptors_use_single_letter_codes() {
        let ty = FunctionType::new([Type::Int, Type::Bool, Type::Double], Type::Void);

        assert_eq!(ty.descriptor(), "(IZD)V");
        assert_eq!(FunctionType::new([], Type::Int).descriptor(), "()I");
    }

    #[test]
    fn double_occupies_two_slots() {
        let ty = FunctionType::new([Type::Double, Type::Int], Type::Bool);

        assert_eq!(ty.parameter_slots(), 3);
    }

    #[test]
    fn only_bool_and_int_are_int_class() {
        let int_class = Type::iter().filter(|ty| ty.is_int_class()).collect::<Vec<_>>();

        assert_eq!(int_class, vec![Type::Bool, Type::Int]);
        assert_eq!(Type::Void.size(), 0);
    }
}
