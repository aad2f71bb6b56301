use colored::Colorize;
use itertools::Itertools;

use crate::{
    backend::{
        ClassUnit,
        emitter::EmittedFunction,
        ir::{ArithmeticOperator, CallTarget, Instruction},
    },
    middle::ty::Type,
};

pub fn pretty_print_class(unit: &ClassUnit) {
    println!("{} {}", "class".magenta(), unit.class_name.blue());

    for function in &unit.functions {
        println!();
        pretty_print_function(function);
    }
}

pub fn pretty_print_function(function: &EmittedFunction) {
    print!(
        "{} {}{}",
        "fn".magenta(),
        function.name.blue(),
        "(".white()
    );

    print!(
        "{}",
        function
            .signature
            .parameters
            .iter()
            .map(|ty| ty.to_string())
            .join(", ")
            .white()
    );

    println!(
        "{} {} {}",
        ") ->".white(),
        function.signature.return_type.to_string().white(),
        format!(
            "[locals {}, stack {}]",
            function.limit_locals, function.limit_stack
        )
        .bright_black()
    );

    for instruction in &function.instructions {
        if let Instruction::Label(label) = instruction {
            println!("{}", format!("{label}:").bright_red());
        } else {
            println!("    {instruction}");
        }
    }
}

fn type_tag(ty: &Type) -> String {
    ty.to_string().yellow().to_string()
}

impl core::fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticOperator::Add => write!(f, "add"),
            ArithmeticOperator::Sub => write!(f, "sub"),
            ArithmeticOperator::Mul => write!(f, "mul"),
            ArithmeticOperator::Div => write!(f, "div"),
        }
    }
}

impl core::fmt::Display for CallTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallTarget::User {
                class_name,
                function_name,
                signature,
            } => write!(
                f,
                "{}.{}{}",
                class_name,
                function_name.blue(),
                signature.descriptor().white()
            ),
            CallTarget::Builtin(builtin) => {
                write!(f, "{}{}", builtin.to_string().blue(), " (builtin)".white())
            }
        }
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Store { ty, address } => {
                write!(f, "{} {} {}", "store".cyan(), type_tag(ty), address.to_string().purple())
            }
            Instruction::Load { ty, address } => {
                write!(f, "{} {} {}", "load".cyan(), type_tag(ty), address.to_string().purple())
            }
            Instruction::IConst(value) => {
                write!(f, "{} {}", "const".cyan(), value.to_string().purple())
            }
            Instruction::DConst(value) => write!(
                f,
                "{} {} {}",
                "const".cyan(),
                type_tag(&Type::Double),
                value.to_string().purple()
            ),
            Instruction::Dup(ty) => write!(f, "{} {}", "dup".cyan(), type_tag(ty)),
            Instruction::Pop(ty) => write!(f, "{} {}", "pop".cyan(), type_tag(ty)),
            Instruction::Return(ty) => write!(f, "{} {}", "return".magenta(), type_tag(ty)),
            Instruction::Call(target) => write!(f, "{} {target}", "call".magenta()),
            Instruction::Label(label) => write!(f, "{}", format!("{label}:").bright_red()),
            Instruction::Goto(label) => {
                write!(f, "{} {}", "goto".magenta(), label.to_string().bright_red())
            }
            Instruction::IfZ(label) => {
                write!(f, "{} {}", "if_zero".magenta(), label.to_string().bright_red())
            }
            Instruction::IfNZ(label) => write!(
                f,
                "{} {}",
                "if_nonzero".magenta(),
                label.to_string().bright_red()
            ),
            Instruction::IfCmp {
                comparison,
                ty,
                target,
            } => write!(
                f,
                "{} {} {}",
                format!("if_{}", comparison.suffix()).magenta(),
                type_tag(ty),
                target.to_string().bright_red()
            ),
            Instruction::DoubleCompareGreater => write!(f, "{}", "cmp_g".cyan()),
            Instruction::DoubleCompareLess => write!(f, "{}", "cmp_l".cyan()),
            Instruction::Inc { ty, address, delta } => write!(
                f,
                "{} {} {} {}",
                "inc".cyan(),
                type_tag(ty),
                address.to_string().purple(),
                delta.to_string().purple()
            ),
            Instruction::Arithmetic { operator, ty } => {
                write!(f, "{} {}", operator.to_string().cyan(), type_tag(ty))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::ir::LabelId, index::Index};

    fn plain(instruction: &Instruction) -> String {
        strip_ansi_escapes::strip_str(instruction.to_string())
    }

    #[test]
    fn listing_reads_without_colors() {
        assert_eq!(
            plain(&Instruction::Load {
                ty: Type::Bool,
                address: 4
            }),
            "load bool 4"
        );
        assert_eq!(
            plain(&Instruction::IfCmp {
                comparison: crate::backend::ir::Comparison::Le,
                ty: Type::Int,
                target: LabelId::new(7),
            }),
            "if_le int L7"
        );
        assert_eq!(
            plain(&Instruction::Inc {
                ty: Type::Int,
                address: 0,
                delta: -1
            }),
            "inc int 0 -1"
        );
    }
}
