//! The instruction set the lowering emits. Instructions map one to one onto
//! JVM opcodes but keep their operands typed, so the stack effect and the
//! final mnemonic can both be derived from the instruction alone.

use crate::{
    index::simple_index,
    middle::{
        signature::Builtin,
        ty::{FunctionType, Type},
    },
};

simple_index! {
    /// A branch target, unique within one function
    pub struct LabelId;
}

impl core::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    /// Lower-case suffix shared by `if<cmp>` and `if_icmp<cmp>`
    pub fn suffix(self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Lt => "lt",
            Comparison::Gt => "gt",
            Comparison::Le => "le",
            Comparison::Ge => "ge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    User {
        class_name: String,
        function_name: String,
        signature: FunctionType,
    },
    Builtin(Builtin),
}

impl CallTarget {
    pub fn signature(&self) -> FunctionType {
        match self {
            CallTarget::User { signature, .. } => signature.clone(),
            CallTarget::Builtin(builtin) => builtin.signature(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Store { ty: Type, address: u32 },
    Load { ty: Type, address: u32 },
    IConst(i32),
    DConst(f64),
    Dup(Type),
    Pop(Type),
    Return(Type),
    Call(CallTarget),
    Label(LabelId),
    Goto(LabelId),
    /// Branch when the int on top of the stack is zero
    IfZ(LabelId),
    /// Branch when the int on top of the stack is not zero
    IfNZ(LabelId),
    /// Typed conditional branch. `Bool` compares the single operand against
    /// true, `Int` compares two operands and `Double` tests the result of a
    /// preceding double comparison.
    IfCmp {
        comparison: Comparison,
        ty: Type,
        target: LabelId,
    },
    DoubleCompareGreater,
    DoubleCompareLess,
    Inc { ty: Type, address: u32, delta: i32 },
    Arithmetic { operator: ArithmeticOperator, ty: Type },
}

impl Instruction {
    /// `(pops, pushes)` measured in stack slots
    pub fn stack_effect(&self) -> (u32, u32) {
        match self {
            Instruction::Store { ty, .. } => (ty.size(), 0),
            Instruction::Load { ty, .. } => (0, ty.size()),
            Instruction::IConst(_) => (0, 1),
            Instruction::DConst(_) => (0, 2),
            Instruction::Dup(ty) => (ty.size(), 2 * ty.size()),
            Instruction::Pop(ty) => (ty.size(), 0),
            Instruction::Return(ty) => (ty.size(), 0),
            Instruction::Call(target) => {
                let signature = target.signature();
                (signature.parameter_slots(), signature.return_type.size())
            }
            Instruction::Label(_) | Instruction::Goto(_) => (0, 0),
            Instruction::IfZ(_) | Instruction::IfNZ(_) => (1, 0),
            Instruction::IfCmp { ty, .. } => match ty {
                Type::Int => (2, 0),
                _ => (1, 0),
            },
            Instruction::DoubleCompareGreater | Instruction::DoubleCompareLess => (4, 1),
            Instruction::Inc { .. } => (0, 0),
            Instruction::Arithmetic { ty, .. } => (2 * ty.size(), ty.size()),
        }
    }

    /// The label this instruction may jump to
    pub fn branch_target(&self) -> Option<LabelId> {
        match self {
            Instruction::Goto(target)
            | Instruction::IfZ(target)
            | Instruction::IfNZ(target)
            | Instruction::IfCmp { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Whether control never falls through to the next instruction
    pub fn ends_flow(&self) -> bool {
        matches!(self, Instruction::Goto(_) | Instruction::Return(_))
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instruction::Return(_))
    }

    pub fn is_int_class_return(&self) -> bool {
        matches!(self, Instruction::Return(ty) if ty.is_int_class())
    }
}
