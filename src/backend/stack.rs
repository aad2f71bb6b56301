use hashbrown::HashMap;

use crate::backend::{
    error::LoweringError,
    ir::{Instruction, LabelId},
};

/// Tracks the operand stack depth of a function as its instructions are
/// appended, and the deepest point reached.
///
/// The body is a straight list but its control flow is not. The depth at
/// every branch is recorded against the target label and restored when that
/// label is placed, so the arms of a diamond are not counted twice.
#[derive(Debug, Clone)]
pub struct StackAccountant {
    function: String,
    current: u32,
    max: u32,
    label_depths: HashMap<LabelId, u32>,
    /// Whether the next instruction can be reached by falling through
    reachable: bool,
}

impl StackAccountant {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            current: 0,
            max: 0,
            label_depths: HashMap::new(),
            reachable: true,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn record(&mut self, instruction: &Instruction) -> Result<(), LoweringError> {
        if let Instruction::Label(label) = instruction {
            self.place_label(*label)?;
            return Ok(());
        }

        let (pops, pushes) = instruction.stack_effect();

        self.current = self
            .current
            .checked_sub(pops)
            .ok_or_else(|| LoweringError::StackUnderflow {
                function: self.function.clone(),
            })?;
        self.current += pushes;
        self.max = self.max.max(self.current);

        if let Some(target) = instruction.branch_target() {
            self.branch_to(target)?;
        }

        if instruction.ends_flow() {
            self.reachable = false;
        }

        Ok(())
    }

    fn branch_to(&mut self, label: LabelId) -> Result<(), LoweringError> {
        match self.label_depths.get(&label) {
            Some(&expected) if expected != self.current => Err(LoweringError::StackMismatch {
                function: self.function.clone(),
                label,
                expected,
                found: self.current,
            }),
            Some(_) => Ok(()),
            None => {
                self.label_depths.insert(label, self.current);
                Ok(())
            }
        }
    }

    fn place_label(&mut self, label: LabelId) -> Result<(), LoweringError> {
        match self.label_depths.get(&label) {
            Some(&expected) => {
                if self.reachable && expected != self.current {
                    return Err(LoweringError::StackMismatch {
                        function: self.function.clone(),
                        label,
                        expected,
                        found: self.current,
                    });
                }

                self.current = expected;
            }
            None => {
                self.label_depths.insert(label, self.current);
            }
        }

        self.reachable = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::ir::Comparison,
        index::Index,
        middle::ty::Type,
    };

    fn run(instructions: &[Instruction]) -> Result<StackAccountant, LoweringError> {
        let mut accountant = StackAccountant::new("test");

        for instruction in instructions {
            accountant.record(instruction)?;
            assert!(accountant.max() >= accountant.current());
        }

        Ok(accountant)
    }

    #[test]
    fn diamond_arms_are_not_double_counted() {
        let (t, f, out) = (LabelId::new(0), LabelId::new(1), LabelId::new(2));

        let accountant = run(&[
            Instruction::IConst(1),
            Instruction::IConst(2),
            Instruction::IfCmp {
                comparison: Comparison::Lt,
                ty: Type::Int,
                target: t,
            },
            Instruction::Goto(f),
            Instruction::Label(t),
            Instruction::IConst(1),
            Instruction::Goto(out),
            Instruction::Label(f),
            Instruction::IConst(0),
            Instruction::Goto(out),
            Instruction::Label(out),
        ])
        .unwrap();

        assert_eq!(accountant.current(), 1);
        assert_eq!(accountant.max(), 2);
    }

    #[test]
    fn underflow_is_an_error() {
        let error = run(&[Instruction::Pop(Type::Int)]).unwrap_err();

        assert!(matches!(error, LoweringError::StackUnderflow { .. }));
    }

    #[test]
    fn inconsistent_depth_at_label_is_an_error() {
        let out = LabelId::new(0);

        let error = run(&[
            Instruction::Goto(out),
            Instruction::Label(LabelId::new(1)),
            Instruction::IConst(1),
            Instruction::Goto(out),
        ])
        .unwrap_err();

        assert!(matches!(
            error,
            LoweringError::StackMismatch {
                expected: 0,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn fall_through_into_label_must_agree() {
        let label = LabelId::new(0);

        let error = run(&[
            Instruction::IConst(0),
            Instruction::IfZ(label),
            Instruction::IConst(1),
            Instruction::Label(label),
        ])
        .unwrap_err();

        assert!(matches!(error, LoweringError::StackMismatch { .. }));
    }

    #[test]
    fn doubles_count_two_slots() {
        let accountant = run(&[
            Instruction::DConst(1.0),
            Instruction::DConst(2.0),
            Instruction::DoubleCompareGreater,
        ])
        .unwrap();

        assert_eq!(accountant.max(), 4);
        assert_eq!(accountant.current(), 1);
    }
}
