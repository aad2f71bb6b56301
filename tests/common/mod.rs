//! A small interpreter for lowered classes. It runs the instructions the way
//! the JVM would run the encoded class and checks the computed stack limit
//! on every step.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};

use cmmc::{
    backend::{
        ClassUnit, CodegenOptions,
        emitter::EmittedFunction,
        ir::{ArithmeticOperator, CallTarget, Comparison, Instruction},
    },
    frontend::SourceFile,
    lower_source,
    middle::{signature::Builtin, ty::Type},
};

/// Steps after which a run is considered stuck in a loop
const FUEL: usize = 1_000_000;

pub fn lower(source: &str) -> ClassUnit {
    lower_source(&SourceFile::from_memory(source), &CodegenOptions::default())
        .unwrap_or_else(|error| panic!("failed to lower `{source}`: {error}"))
}

pub struct Machine<'unit> {
    unit: &'unit ClassUnit,
    input: VecDeque<i32>,
    pub output: Vec<i32>,
    /// Positions executed in each function
    pub executed: HashMap<String, HashSet<usize>>,
    fuel: usize,
}

impl<'unit> Machine<'unit> {
    pub fn new(unit: &'unit ClassUnit) -> Self {
        Self {
            unit,
            input: VecDeque::new(),
            output: Vec::new(),
            executed: HashMap::new(),
            fuel: FUEL,
        }
    }

    pub fn with_input(mut self, input: impl IntoIterator<Item = i32>) -> Self {
        self.input = input.into_iter().collect();
        self
    }

    pub fn run_entry(&mut self) -> Option<i32> {
        let entry = self.unit.entry_point.clone();
        self.run(&entry, &[])
    }

    pub fn run(&mut self, name: &str, arguments: &[i32]) -> Option<i32> {
        let unit = self.unit;
        let function = unit
            .function(name)
            .unwrap_or_else(|| panic!("no function `{name}`"));

        self.call(function, arguments)
    }

    fn call(&mut self, function: &'unit EmittedFunction, arguments: &[i32]) -> Option<i32> {
        let mut locals = vec![0; function.limit_locals as usize];
        locals[..arguments.len()].copy_from_slice(arguments);

        let mut stack: Vec<i32> = Vec::new();
        let mut position = 0;

        loop {
            self.fuel = self.fuel.checked_sub(1).expect("out of fuel");

            let instruction = function
                .instructions
                .get(position)
                .unwrap_or_else(|| panic!("fell off the end of `{}`", function.name));

            self.executed
                .entry(function.name.clone())
                .or_default()
                .insert(position);

            position += 1;

            let pop = |stack: &mut Vec<i32>| {
                stack
                    .pop()
                    .unwrap_or_else(|| panic!("stack underflow in `{}`", function.name))
            };

            match instruction {
                Instruction::Store { address, .. } => {
                    locals[*address as usize] = pop(&mut stack);
                }
                Instruction::Load { address, .. } => stack.push(locals[*address as usize]),
                Instruction::IConst(value) => stack.push(*value),
                Instruction::Dup(_) => {
                    let top = pop(&mut stack);
                    stack.extend([top, top]);
                }
                Instruction::Pop(_) => {
                    pop(&mut stack);
                }
                Instruction::Return(ty) => {
                    return ty.is_int_class().then(|| pop(&mut stack));
                }
                Instruction::Call(target) => {
                    let parameters = target.signature().parameters.len();
                    let arguments = stack.split_off(stack.len() - parameters);

                    let result = match target {
                        CallTarget::User { function_name, .. } => {
                            let unit = self.unit;
                            let callee = unit
                                .function(function_name)
                                .unwrap_or_else(|| panic!("no function `{function_name}`"));
                            self.call(callee, &arguments)
                        }
                        CallTarget::Builtin(Builtin::PrintInt) => {
                            self.output.push(arguments[0]);
                            None
                        }
                        CallTarget::Builtin(Builtin::ReadInt) => {
                            Some(self.input.pop_front().expect("input exhausted"))
                        }
                    };

                    stack.extend(result);
                }
                Instruction::Label(_) => {}
                Instruction::Goto(label) => position = function.position_of(*label),
                Instruction::IfZ(label) => {
                    if pop(&mut stack) == 0 {
                        position = function.position_of(*label);
                    }
                }
                Instruction::IfNZ(label) => {
                    if pop(&mut stack) != 0 {
                        position = function.position_of(*label);
                    }
                }
                Instruction::IfCmp {
                    comparison,
                    ty,
                    target,
                } => {
                    let taken = match ty {
                        Type::Int => {
                            let rhs = pop(&mut stack);
                            let lhs = pop(&mut stack);
                            compare(*comparison, lhs, rhs)
                        }
                        // A bool `eq` tests against true, `ne` against false
                        Type::Bool => match comparison {
                            Comparison::Eq => pop(&mut stack) != 0,
                            Comparison::Ne => pop(&mut stack) == 0,
                            other => compare(*other, pop(&mut stack), 0),
                        },
                        other => panic!("unexpected {other} comparison"),
                    };

                    if taken {
                        position = function.position_of(*target);
                    }
                }
                Instruction::Inc { address, delta, .. } => {
                    let slot = &mut locals[*address as usize];
                    *slot = slot.wrapping_add(*delta);
                }
                Instruction::Arithmetic { operator, .. } => {
                    let rhs = pop(&mut stack);
                    let lhs = pop(&mut stack);

                    stack.push(match operator {
                        ArithmeticOperator::Add => lhs.wrapping_add(rhs),
                        ArithmeticOperator::Sub => lhs.wrapping_sub(rhs),
                        ArithmeticOperator::Mul => lhs.wrapping_mul(rhs),
                        ArithmeticOperator::Div => lhs.wrapping_div(rhs),
                    });
                }
                other @ (Instruction::DConst(_)
                | Instruction::DoubleCompareGreater
                | Instruction::DoubleCompareLess) => panic!("unexpected {other:?}"),
            }

            assert!(
                stack.len() <= function.limit_stack as usize,
                "stack of `{}` grew to {} past its limit of {}",
                function.name,
                stack.len(),
                function.limit_stack
            );
        }
    }
}

fn compare(comparison: Comparison, lhs: i32, rhs: i32) -> bool {
    match comparison {
        Comparison::Eq => lhs == rhs,
        Comparison::Ne => lhs != rhs,
        Comparison::Lt => lhs < rhs,
        Comparison::Gt => lhs > rhs,
        Comparison::Le => lhs <= rhs,
        Comparison::Ge => lhs >= rhs,
    }
}

/// Positions of `function` reachable from `start` by following branches and
/// fall through
pub fn reachable_from(function: &EmittedFunction, start: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut pending = vec![start];

    while let Some(position) = pending.pop() {
        if position >= function.instructions.len() || !seen.insert(position) {
            continue;
        }

        let instruction = &function.instructions[position];

        if let Some(target) = instruction.branch_target() {
            pending.push(function.position_of(target));
        }

        if !instruction.ends_flow() {
            pending.push(position + 1);
        }
    }

    seen
}
