mod common;

use cmmc::{
    backend::ir::{ArithmeticOperator, Comparison, Instruction},
    middle::ty::Type,
};
use common::{Machine, lower, reachable_from};

#[test]
fn counting_loop() {
    let unit = lower("int main() { int x = 0; while (x < 3) { x = x + 1; } return x; }");
    let main = unit.function("main").unwrap();
    let instructions = &main.instructions;

    let Instruction::Label(head) = instructions[2] else {
        panic!("loop does not start with its condition label");
    };

    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::IfCmp {
            comparison: Comparison::Ne,
            ty: Type::Bool,
            ..
        }
    )));
    assert!(instructions.windows(2).any(|pair| pair
        == [
            Instruction::Arithmetic {
                operator: ArithmeticOperator::Add,
                ty: Type::Int
            },
            Instruction::Store {
                ty: Type::Int,
                address: 0
            },
        ]));
    assert!(instructions.contains(&Instruction::Goto(head)));
    assert_eq!(
        &instructions[instructions.len() - 2..],
        &[
            Instruction::Load {
                ty: Type::Int,
                address: 0
            },
            Instruction::Return(Type::Int),
        ]
    );

    assert_eq!(Machine::new(&unit).run_entry(), Some(3));
}

#[test]
fn relational_return() {
    let unit = lower("int main() { return 1 < 2; }");
    let instructions = &unit.function("main").unwrap().instructions;

    let branches = instructions
        .iter()
        .filter(|i| matches!(i, Instruction::IfCmp { .. }))
        .count();
    assert_eq!(branches, 1);

    let branch = instructions
        .iter()
        .position(|i| matches!(i, Instruction::IfCmp { .. }))
        .unwrap();
    let pushes = instructions[branch..]
        .iter()
        .filter_map(|i| match i {
            Instruction::IConst(value) => Some(*value),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(pushes, vec![1, 0]);
    assert_eq!(instructions.last(), Some(&Instruction::Return(Type::Int)));
    assert_eq!(Machine::new(&unit).run_entry(), Some(1));
}

#[test]
fn right_operand_of_and_is_only_reached_through_the_left_true_path() {
    let unit = lower("int main() { return (1 < 2) && (3 > 4); }");
    let main = unit.function("main").unwrap();
    let instructions = &main.instructions;

    let right_branch = instructions
        .iter()
        .position(|i| {
            matches!(
                i,
                Instruction::IfCmp {
                    comparison: Comparison::Gt,
                    ..
                }
            )
        })
        .unwrap();

    // Where the left comparison lands when it is false
    let left_false = instructions
        .iter()
        .find_map(|i| match i {
            Instruction::IfCmp {
                comparison: Comparison::Ne,
                ty: Type::Bool,
                target,
            } => Some(main.position_of(*target)),
            _ => None,
        })
        .unwrap();

    assert!(!reachable_from(main, left_false).contains(&right_branch));
    assert!(reachable_from(main, 0).contains(&right_branch));
    assert_eq!(Machine::new(&unit).run_entry(), Some(0));
}

#[test]
fn entry_point_without_return() {
    let unit = lower("int main() { int x = 0; x = x + 1; }");
    let instructions = &unit.function("main").unwrap().instructions;

    assert_eq!(
        &instructions[instructions.len() - 2..],
        &[Instruction::IConst(0), Instruction::Return(Type::Int)]
    );
    assert_eq!(Machine::new(&unit).run_entry(), Some(0));
}

#[test]
fn short_circuit_skips_the_right_call() {
    let unit = lower(
        "bool side(int n) { printInt(n); return true; }
         int main() {
             bool a = false && side(1);
             bool b = true || side(2);
             bool c = true && side(3);
             bool d = false || side(4);
             return 0;
         }",
    );

    let mut machine = Machine::new(&unit);
    machine.run_entry();

    assert_eq!(machine.output, vec![3, 4]);
}

#[test]
fn assignment_in_a_condition_keeps_its_value() {
    let unit = lower(
        "int main() {
             int n;
             int total = 0;
             while ((n = readInt()) > 0) total = total + n;
             return total;
         }",
    );

    let mut machine = Machine::new(&unit).with_input([4, 5, 6, 0]);

    assert_eq!(machine.run_entry(), Some(15));
}

#[test]
fn increments_as_values_and_statements() {
    let unit = lower(
        "int main() {
             int x = 5;
             int a = x++;
             int b = ++x;
             x--;
             --x;
             printInt(a);
             printInt(b);
             return x;
         }",
    );

    let mut machine = Machine::new(&unit);

    assert_eq!(machine.run_entry(), Some(5));
    assert_eq!(machine.output, vec![5, 7]);
}

#[test]
fn shadowing_in_nested_blocks() {
    let unit = lower(
        "int main() {
             int x = 1;
             {
                 int x = 2;
                 { bool x = true; if (x) printInt(1); else printInt(0); }
                 printInt(x);
             }
             return x;
         }",
    );

    let mut machine = Machine::new(&unit);

    assert_eq!(machine.run_entry(), Some(1));
    assert_eq!(machine.output, vec![1, 2]);
    assert_eq!(unit.function("main").unwrap().limit_locals, 3);
}

#[test]
fn recursion_and_bool_functions() {
    let unit = lower(
        "int fac(int n) { if (n <= 1) return 1; else return n * fac(n - 1); }
         bool even(int n) { if (n == 0) return true; else return odd(n - 1); }
         bool odd(int n) { if (n == 0) return false; else return even(n - 1); }
         int main() {
             printInt(fac(5));
             if (even(10) && odd(7)) printInt(1); else printInt(0);
             return 0;
         }",
    );

    let mut machine = Machine::new(&unit);
    machine.run_entry();

    assert_eq!(machine.output, vec![120, 1]);
}
