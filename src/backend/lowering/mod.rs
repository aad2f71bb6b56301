//! Lowers the statements and expressions of one function into a flat list of
//! [`Instruction`]s. All state of a function in progress lives in a
//! [`FunctionLowering`], so nothing leaks from one function into the next.

use crate::{
    backend::{
        error::LoweringError,
        ir::{ArithmeticOperator, CallTarget, Instruction, LabelId},
        stack::StackAccountant,
    },
    frontend::{
        ast::{
            BinaryOperatorClass, BinaryOperatorKind, Expression, ExpressionKind,
            FunctionDefinition, Identifier, Literal, Statement, StatementKind,
        },
        lexer::Span,
    },
    index::IndexVec,
    middle::{
        scope::{Binding, ScopeStack},
        signature::{Callee, SignatureTable},
        ty::{FunctionType, Type},
    },
};

mod control_flow;

/// Facts shared by every function of a class. Read only while lowering.
#[derive(Debug, Clone, Copy)]
pub struct ClassContext<'class> {
    pub class_name: &'class str,
    pub signatures: &'class SignatureTable,
    pub entry_point: &'class str,
}

#[derive(Debug)]
pub struct FunctionLowering<'class> {
    pub(crate) context: ClassContext<'class>,
    pub(crate) name: String,
    pub(crate) signature: FunctionType,
    pub(crate) scopes: ScopeStack,
    pub(crate) stack: StackAccountant,
    /// Position of each label in `instructions`, once placed
    pub(crate) labels: IndexVec<LabelId, Option<usize>>,
    pub(crate) instructions: Vec<Instruction>,
}

fn unsupported(feature: impl Into<String>, span: Span) -> LoweringError {
    LoweringError::UnsupportedFeature {
        feature: feature.into(),
        span,
    }
}

impl<'class> FunctionLowering<'class> {
    /// Sets up the scopes of `definition` with its parameters in slots
    /// `0..n`, without lowering the body yet.
    pub fn new(
        context: ClassContext<'class>,
        definition: &FunctionDefinition,
    ) -> Result<Self, LoweringError> {
        if definition.return_type == Type::Double {
            return Err(unsupported("returning a double", definition.name.span));
        }

        let name = definition.name.name.clone();
        let signature = FunctionType::new(
            definition.parameters.iter().map(|parameter| parameter.ty),
            definition.return_type,
        );

        let mut scopes = ScopeStack::new();

        for parameter in &definition.parameters {
            scopes.declare(&parameter.name.name, parameter.ty, parameter.name.span)?;
        }

        Ok(Self {
            context,
            stack: StackAccountant::new(name.clone()),
            name,
            signature,
            scopes,
            labels: IndexVec::new(),
            instructions: Vec::new(),
        })
    }

    pub fn is_entry_point(&self) -> bool {
        self.name == self.context.entry_point
    }

    pub fn lower_body(&mut self, body: &[Statement]) -> Result<(), LoweringError> {
        for statement in body {
            self.lower_statement(statement)?;
        }

        Ok(())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn stack(&self) -> &StackAccountant {
        &self.stack
    }

    /// Appends one instruction, keeping the stack accounting and the label
    /// table in step with the instruction list.
    pub(crate) fn emit(&mut self, instruction: Instruction) -> Result<(), LoweringError> {
        if let Instruction::Label(label) = instruction {
            if self.labels[label].is_some() {
                return Err(LoweringError::DuplicateLabel {
                    function: self.name.clone(),
                    label,
                });
            }

            self.labels[label] = Some(self.instructions.len());
        }

        self.stack.record(&instruction)?;

        self.instructions.push(instruction);
        Ok(())
    }

    pub(crate) fn new_label(&mut self) -> LabelId {
        self.labels.push(None)
    }

    pub(crate) fn place_label(&mut self, label: LabelId) -> Result<(), LoweringError> {
        self.emit(Instruction::Label(label))
    }

    fn resolve(&self, identifier: &Identifier) -> Result<Binding, LoweringError> {
        self.scopes
            .resolve(&identifier.name)
            .ok_or_else(|| LoweringError::UnresolvedIdentifier {
                name: identifier.name.clone(),
                span: identifier.span,
            })
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), LoweringError> {
        match &statement.kind {
            StatementKind::Expression(expression) => self.lower_expression_statement(expression),
            StatementKind::Declarations { ty, names } => {
                for name in names {
                    self.scopes.declare(&name.name, *ty, name.span)?;
                }

                Ok(())
            }
            StatementKind::Initialization {
                ty,
                name,
                initializer,
            } => {
                if *ty == Type::Double {
                    return Err(unsupported("double variable initialization", statement.span));
                }

                // The initializer cannot see the variable it initializes
                self.lower_expression(initializer)?;
                let address = self.scopes.declare(&name.name, *ty, name.span)?;

                self.emit(Instruction::Store { ty: *ty, address })
            }
            StatementKind::Block(statements) => {
                self.scopes.enter_block();

                for statement in statements {
                    self.lower_statement(statement)?;
                }

                self.scopes.exit_block();
                Ok(())
            }
            StatementKind::Return(value) => {
                let return_type = self.signature.return_type;

                match value {
                    Some(value) => {
                        self.lower_expression(value)?;
                        self.emit(Instruction::Return(return_type))
                    }
                    None => self.emit(Instruction::Return(Type::Void)),
                }
            }
            StatementKind::While { condition, body } => self.lower_while(condition, body),
            StatementKind::IfElse {
                condition,
                positive,
                negative,
            } => self.lower_if_else(condition, positive, negative),
        }
    }

    /// Lowers `expression` for its side effects only. Nothing it computes is
    /// left on the stack afterwards.
    fn lower_expression_statement(&mut self, expression: &Expression) -> Result<(), LoweringError> {
        match &expression.kind {
            ExpressionKind::Assignment { target, value } => {
                self.lower_assignment(target, value, false)?;
                Ok(())
            }
            ExpressionKind::Increment { .. } => {
                let depth_before = self.stack.current();
                self.lower_expression(expression)?;
                self.discard_unused_increment(depth_before)
            }
            _ => {
                let ty = self.lower_expression(expression)?;

                if ty != Type::Void {
                    self.emit(Instruction::Pop(ty))?;
                }

                Ok(())
            }
        }
    }

    /// Lowers `expression` so that its value ends up on top of the stack and
    /// returns the type of that value. Void calls leave nothing behind.
    pub(crate) fn lower_expression(&mut self, expression: &Expression) -> Result<Type, LoweringError> {
        match &expression.kind {
            ExpressionKind::Literal(literal) => match literal {
                Literal::Boolean(value) => {
                    self.emit(Instruction::IConst(i32::from(*value)))?;
                    Ok(Type::Bool)
                }
                Literal::Integer(value) => {
                    self.emit(Instruction::IConst(*value))?;
                    Ok(Type::Int)
                }
                Literal::Double(_) => Err(unsupported("double literal", expression.span)),
            },
            ExpressionKind::Identifier(identifier) => {
                let Binding { ty, address } = self.resolve(identifier)?;

                if ty == Type::Double {
                    return Err(unsupported("loading a double variable", expression.span));
                }

                self.emit(Instruction::Load { ty, address })?;
                Ok(ty)
            }
            ExpressionKind::FunctionCall { target, arguments } => {
                self.lower_call(target, arguments, expression.span)
            }
            ExpressionKind::Increment { kind, target } => {
                let Binding { ty, address } = self.resolve(target)?;

                if ty == Type::Double {
                    return Err(unsupported("incrementing a double", expression.span));
                }

                let increment = Instruction::Inc {
                    ty,
                    address,
                    delta: kind.delta(),
                };
                let load = Instruction::Load { ty, address };

                if kind.is_prefix() {
                    self.emit(increment)?;
                    self.emit(load)?;
                } else {
                    self.emit(load)?;
                    self.emit(increment)?;
                }

                Ok(ty)
            }
            ExpressionKind::Binary { lhs, operator, rhs } => match operator.class() {
                BinaryOperatorClass::Arithmetic => {
                    self.lower_arithmetic(lhs, *operator, rhs, expression.span)
                }
                BinaryOperatorClass::Comparison => self.lower_comparison(lhs, *operator, rhs),
                BinaryOperatorClass::Logical => self.lower_logical(lhs, *operator, rhs),
            },
            ExpressionKind::Assignment { target, value } => {
                self.lower_assignment(target, value, true)
            }
        }
    }

    fn lower_arithmetic(
        &mut self,
        lhs: &Expression,
        operator: BinaryOperatorKind,
        rhs: &Expression,
        span: Span,
    ) -> Result<Type, LoweringError> {
        let ty = self.lower_expression(lhs)?;
        self.lower_expression(rhs)?;

        if ty == Type::Double {
            return Err(unsupported(format!("double arithmetic (`{operator}`)"), span));
        }

        let operator = match operator {
            BinaryOperatorKind::Add => ArithmeticOperator::Add,
            BinaryOperatorKind::Subtract => ArithmeticOperator::Sub,
            BinaryOperatorKind::Multiply => ArithmeticOperator::Mul,
            _ => ArithmeticOperator::Div,
        };

        self.emit(Instruction::Arithmetic {
            operator,
            ty: Type::Int,
        })?;

        Ok(Type::Int)
    }

    /// `keep_value` leaves a copy of the stored value on the stack, for
    /// assignments used as values.
    fn lower_assignment(
        &mut self,
        target: &Identifier,
        value: &Expression,
        keep_value: bool,
    ) -> Result<Type, LoweringError> {
        let Binding { ty, address } = self.resolve(target)?;

        if ty == Type::Double {
            return Err(unsupported("storing a double", target.span));
        }

        self.lower_expression(value)?;

        if keep_value {
            self.emit(Instruction::Dup(ty))?;
        }

        self.emit(Instruction::Store { ty, address })?;

        Ok(if keep_value { ty } else { Type::Void })
    }

    fn lower_call(
        &mut self,
        target: &Identifier,
        arguments: &[Expression],
        span: Span,
    ) -> Result<Type, LoweringError> {
        let signatures = self.context.signatures;
        let callee = signatures
            .lookup(&target.name)
            .ok_or_else(|| LoweringError::UnresolvedFunction {
                name: target.name.clone(),
                span: target.span,
            })?;

        let signature = callee.signature();

        if signature.return_type == Type::Double || signature.parameters.contains(&Type::Double) {
            return Err(unsupported(
                format!("calling `{}` with double values", target.name),
                span,
            ));
        }

        for argument in arguments {
            self.lower_expression(argument)?;
        }

        let call_target = match callee {
            Callee::Builtin(builtin) => CallTarget::Builtin(builtin),
            Callee::User(_) => CallTarget::User {
                class_name: self.context.class_name.to_owned(),
                function_name: target.name.clone(),
                signature: signature.clone(),
            },
        };

        self.emit(Instruction::Call(call_target))?;

        if signature.return_type == Type::Bool {
            self.normalize_boolean_call()?;
        }

        Ok(signature.return_type)
    }
}
