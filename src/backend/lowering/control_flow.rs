//! Branching recipes. Every boolean produced here is the canonical int 0 or 1,
//! built from a `true`/`false` diamond that converges on an `out` label.

use crate::{
    backend::{
        error::LoweringError,
        ir::{Comparison, Instruction, LabelId},
        lowering::FunctionLowering,
    },
    frontend::ast::{BinaryOperatorKind, Expression, Statement},
    middle::ty::Type,
};

/// Branch taken when the bool on top of the stack is false
fn branch_if_false(target: LabelId) -> Instruction {
    Instruction::IfCmp {
        comparison: Comparison::Ne,
        ty: Type::Bool,
        target,
    }
}

/// Branch taken when the bool on top of the stack is true
fn branch_if_true(target: LabelId) -> Instruction {
    Instruction::IfCmp {
        comparison: Comparison::Eq,
        ty: Type::Bool,
        target,
    }
}

impl FunctionLowering<'_> {
    /// Converges two paths on a single pushed 0/1:
    ///
    /// ```text
    /// [through:]     push <through_value>
    ///                goto out
    /// branched:      push <branched_value>
    ///                goto out
    /// out:
    /// ```
    fn push_boolean_result(
        &mut self,
        through: Option<LabelId>,
        through_value: bool,
        branched: LabelId,
        branched_value: bool,
    ) -> Result<(), LoweringError> {
        let out = self.new_label();

        if let Some(through) = through {
            self.place_label(through)?;
        }

        self.emit(Instruction::IConst(i32::from(through_value)))?;
        self.emit(Instruction::Goto(out))?;
        self.place_label(branched)?;
        self.emit(Instruction::IConst(i32::from(branched_value)))?;
        self.emit(Instruction::Goto(out))?;
        self.place_label(out)
    }

    pub(super) fn lower_comparison(
        &mut self,
        lhs: &Expression,
        operator: BinaryOperatorKind,
        rhs: &Expression,
    ) -> Result<Type, LoweringError> {
        // Operands are ints or bools here, doubles never get past
        // `lower_expression`. Two bools are compared as the ints they are.
        self.lower_expression(lhs)?;
        self.lower_expression(rhs)?;

        let comparison = match operator {
            BinaryOperatorKind::Equals => Comparison::Eq,
            BinaryOperatorKind::NotEquals => Comparison::Ne,
            BinaryOperatorKind::LessThan => Comparison::Lt,
            BinaryOperatorKind::LessThanOrEqualTo => Comparison::Le,
            BinaryOperatorKind::GreaterThan => Comparison::Gt,
            _ => Comparison::Ge,
        };

        let on_true = self.new_label();
        let on_false = self.new_label();

        self.emit(Instruction::IfCmp {
            comparison,
            ty: Type::Int,
            target: on_true,
        })?;
        self.emit(Instruction::Goto(on_false))?;
        self.push_boolean_result(Some(on_true), true, on_false, false)?;

        Ok(Type::Bool)
    }

    /// `&&` and `||`. The right operand is only evaluated when the left one
    /// does not decide the result.
    pub(super) fn lower_logical(
        &mut self,
        lhs: &Expression,
        operator: BinaryOperatorKind,
        rhs: &Expression,
    ) -> Result<Type, LoweringError> {
        // Both operands branch to the same label, which holds the result
        // that short-circuits the operator
        let decided = self.new_label();
        let short_circuit_value = operator == BinaryOperatorKind::LogicalOr;

        let branch = if short_circuit_value {
            branch_if_true
        } else {
            branch_if_false
        };

        self.lower_expression(lhs)?;
        self.emit(branch(decided))?;
        self.lower_expression(rhs)?;
        self.emit(branch(decided))?;

        self.push_boolean_result(None, !short_circuit_value, decided, short_circuit_value)?;

        Ok(Type::Bool)
    }

    /// Rebuilds the canonical 0/1 shape around the result of a call to a
    /// function returning `bool`.
    pub(super) fn normalize_boolean_call(&mut self) -> Result<(), LoweringError> {
        let on_true = self.new_label();
        let on_false = self.new_label();

        self.emit(Instruction::IfNZ(on_true))?;
        self.emit(Instruction::Goto(on_false))?;
        self.push_boolean_result(Some(on_true), true, on_false, false)
    }

    pub(super) fn lower_while(
        &mut self,
        condition: &Expression,
        body: &Statement,
    ) -> Result<(), LoweringError> {
        let head = self.new_label();
        let out = self.new_label();

        self.place_label(head)?;
        self.lower_expression(condition)?;
        self.emit(branch_if_false(out))?;

        let depth_before = self.stack.current();
        self.lower_statement(body)?;
        self.discard_unused_increment(depth_before)?;

        self.emit(Instruction::Goto(head))?;
        self.place_label(out)
    }

    pub(super) fn lower_if_else(
        &mut self,
        condition: &Expression,
        positive: &Statement,
        negative: &Statement,
    ) -> Result<(), LoweringError> {
        let on_false = self.new_label();
        let out = self.new_label();

        self.lower_expression(condition)?;
        self.emit(branch_if_false(on_false))?;

        let depth_before = self.stack.current();
        self.lower_statement(positive)?;
        self.discard_unused_increment(depth_before)?;
        self.emit(Instruction::Goto(out))?;

        self.place_label(on_false)?;
        self.lower_statement(negative)?;
        self.discard_unused_increment(depth_before)?;
        self.emit(Instruction::Goto(out))?;

        self.place_label(out)
    }

    /// Pops the value an increment loaded back when nothing consumed it: the
    /// last two instructions are an increment and a load of the same slot (in
    /// either order) and the stack is deeper than it was at `depth_before`.
    pub(super) fn discard_unused_increment(&mut self, depth_before: u32) -> Result<(), LoweringError> {
        if self.stack.current() <= depth_before {
            return Ok(());
        }

        let [.., first, second] = self.instructions.as_slice() else {
            return Ok(());
        };

        let leftover = match (first, second) {
            (
                Instruction::Inc { address: a, .. },
                Instruction::Load { ty, address: b },
            )
            | (
                Instruction::Load { ty, address: b },
                Instruction::Inc { address: a, .. },
            ) if a == b => Some(*ty),
            _ => None,
        };

        match leftover {
            Some(ty) => self.emit(Instruction::Pop(ty)),
            None => Ok(()),
        }
    }
}
