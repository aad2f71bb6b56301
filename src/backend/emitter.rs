use crate::{
    backend::{
        error::LoweringError,
        ir::{Instruction, LabelId},
        lowering::FunctionLowering,
    },
    index::IndexVec,
    middle::ty::{FunctionType, Type},
};

/// A fully lowered function, ready to be encoded for a target
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFunction {
    pub name: String,
    pub signature: FunctionType,
    pub limit_locals: u32,
    pub limit_stack: u32,
    pub instructions: Vec<Instruction>,
    /// Index into `instructions` of every label
    pub label_positions: IndexVec<LabelId, usize>,
}

impl EmittedFunction {
    pub fn position_of(&self, label: LabelId) -> usize {
        self.label_positions[label]
    }
}

/// Appends the return a function may fall off the end without, then checks
/// that every label was placed exactly where a branch can find it.
pub fn finish_function(mut lowering: FunctionLowering<'_>) -> Result<EmittedFunction, LoweringError> {
    let last = lowering.instructions.last();

    // A void entry point gets the same fixup as any other void function
    if lowering.is_entry_point() && lowering.signature.return_type.is_int_class() {
        if !last.is_some_and(Instruction::is_int_class_return) {
            lowering.emit(Instruction::IConst(0))?;
            lowering.emit(Instruction::Return(Type::Int))?;
        }
    } else if !last.is_some_and(Instruction::is_return) {
        lowering.emit(Instruction::Return(Type::Void))?;
    }

    let label_positions = lowering
        .labels
        .iter_enumerated()
        .map(|(label, position)| {
            position.ok_or_else(|| LoweringError::UnplacedLabel {
                function: lowering.name.clone(),
                label,
            })
        })
        .collect::<Result<IndexVec<LabelId, usize>, _>>()?;

    Ok(EmittedFunction {
        limit_locals: lowering.scopes.limit_locals(),
        limit_stack: lowering.stack.max(),
        name: lowering.name,
        signature: lowering.signature,
        instructions: lowering.instructions,
        label_positions,
    })
}
