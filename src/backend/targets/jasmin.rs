use std::{path::Path, process::Command};

use itertools::Itertools;

use crate::{
    backend::{
        ClassUnit, CodegenOptions,
        emitter::EmittedFunction,
        ir::{ArithmeticOperator, CallTarget, Comparison, Instruction},
        targets::CodeGenerator,
    },
    middle::ty::Type,
};

pub struct CodeGeneratorJasmin;

impl CodeGenerator for CodeGeneratorJasmin {
    fn asm_extension(&self) -> &'static str {
        "j"
    }

    fn translate_to_asm(&self, unit: &ClassUnit, options: &CodegenOptions) -> String {
        let function_bodies = unit
            .functions
            .iter()
            .map(|f| codegen_function(f, options))
            .join("\n");

        // The JVM entry point discards whatever the program's entry returns
        let (wrapper_stack, discard_result) = match unit.entry_signature.return_type.size() {
            0 => (0, ""),
            size => (size, "\n  pop"),
        };

        format!(
            indoc::indoc! {r#"
            .class public {0}
            .super java/lang/Object

            .method public <init>()V
              aload_0
              invokespecial java/lang/Object/<init>()V
              return
            .end method

            .method public static main([Ljava/lang/String;)V
              .limit locals 1
              .limit stack {1}
              invokestatic {0}/{2}{3}{4}
              return
            .end method

            {5}"#
            },
            unit.class_name,
            wrapper_stack,
            unit.entry_point,
            unit.entry_signature.descriptor(),
            discard_result,
            function_bodies,
        )
    }

    fn create_assembler_command(
        &self,
        input_file: &Path,
        output_directory: &Path,
        options: &CodegenOptions,
    ) -> Command {
        let mut cmd = Command::new("java");

        cmd.arg("-jar")
            .arg(&options.assembler_jar)
            .arg("-d")
            .arg(output_directory)
            .arg(input_file);

        cmd
    }
}

fn codegen_function(function: &EmittedFunction, options: &CodegenOptions) -> String {
    let body = function
        .instructions
        .iter()
        .map(|instruction| {
            let line = encode_instruction(instruction, options);

            if options.annotate && !matches!(instruction, Instruction::Label(_)) {
                format!(
                    "  {line:<32}; {}",
                    strip_ansi_escapes::strip_str(instruction.to_string())
                )
            } else {
                format!("  {line}")
            }
        })
        .join("\n");

    format!(
        ".method public static {}{}\n  .limit locals {}\n  .limit stack {}\n\n{}\n\n.end method\n",
        function.name,
        function.signature.descriptor(),
        function.limit_locals,
        function.limit_stack,
        body
    )
}

/// `i` for everything the JVM keeps in an int, `d` for doubles
fn type_prefix(ty: Type) -> &'static str {
    match ty {
        Type::Double => "d",
        Type::Bool | Type::Int | Type::Void => "i",
    }
}

/// Slots 0 to 3 have dedicated one byte opcodes
fn encode_local(operation: &str, ty: Type, address: u32) -> String {
    if address <= 3 {
        format!("{}{operation}_{address}", type_prefix(ty))
    } else {
        format!("{}{operation} {address}", type_prefix(ty))
    }
}

fn encode_int_constant(value: i32) -> String {
    match value {
        -1 => String::from("iconst_m1"),
        0..=5 => format!("iconst_{value}"),
        -128..=127 => format!("bipush {value}"),
        _ => format!("ldc {value}"),
    }
}

fn encode_double_constant(value: f64) -> String {
    if value.to_bits() == 0f64.to_bits() {
        String::from("dconst_0")
    } else if value == 1.0 {
        String::from("dconst_1")
    } else {
        // Debug keeps the decimal point, so the assembler never reads a long
        format!("ldc2_w {value:?}")
    }
}

fn encode_branch(comparison: Comparison, ty: Type) -> String {
    match (ty, comparison) {
        // A bool is tested against true, not against zero
        (Type::Bool, Comparison::Eq) => String::from("ifne"),
        (Type::Bool, Comparison::Ne) => String::from("ifeq"),
        (Type::Bool | Type::Double, _) => format!("if{}", comparison.suffix()),
        (Type::Int | Type::Void, _) => format!("if_icmp{}", comparison.suffix()),
    }
}

pub fn encode_instruction(instruction: &Instruction, options: &CodegenOptions) -> String {
    match instruction {
        Instruction::Store { ty, address } => encode_local("store", *ty, *address),
        Instruction::Load { ty, address } => encode_local("load", *ty, *address),
        Instruction::IConst(value) => encode_int_constant(*value),
        Instruction::DConst(value) => encode_double_constant(*value),
        Instruction::Dup(ty) => match ty {
            Type::Double => String::from("dup2"),
            _ => String::from("dup"),
        },
        Instruction::Pop(ty) => match ty {
            Type::Double => String::from("pop2"),
            _ => String::from("pop"),
        },
        Instruction::Return(ty) if ty.is_int_class() => String::from("ireturn"),
        Instruction::Return(_) => String::from("return"),
        Instruction::Call(CallTarget::User {
            class_name,
            function_name,
            signature,
        }) => format!(
            "invokestatic {class_name}/{function_name}{}",
            signature.descriptor()
        ),
        Instruction::Call(CallTarget::Builtin(builtin)) => format!(
            "invokestatic {}/{builtin}{}",
            options.runtime_class,
            builtin.signature().descriptor()
        ),
        Instruction::Label(label) => format!("{label}:"),
        Instruction::Goto(label) => format!("goto {label}"),
        Instruction::IfZ(label) => format!("ifeq {label}"),
        Instruction::IfNZ(label) => format!("ifne {label}"),
        Instruction::IfCmp {
            comparison,
            ty,
            target,
        } => format!("{} {target}", encode_branch(*comparison, *ty)),
        Instruction::DoubleCompareGreater => String::from("dcmpg"),
        Instruction::DoubleCompareLess => String::from("dcmpl"),
        Instruction::Inc { address, delta, .. } => format!("iinc {address} {delta}"),
        Instruction::Arithmetic { operator, ty } => {
            let operation = match operator {
                ArithmeticOperator::Add => "add",
                ArithmeticOperator::Sub => "sub",
                ArithmeticOperator::Mul => "mul",
                ArithmeticOperator::Div => "div",
            };

            format!("{}{operation}", type_prefix(*ty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::ir::LabelId,
        index::Index,
        middle::{signature::Builtin, ty::FunctionType},
    };

    fn encode(instruction: Instruction) -> String {
        encode_instruction(&instruction, &CodegenOptions::default())
    }

    #[test]
    fn int_constants_pick_the_shortest_form() {
        let encoded = [-129, -128, -1, 0, 5, 6, 127, 128, 40000]
            .map(|value| encode(Instruction::IConst(value)));

        assert_eq!(
            encoded,
            [
                "ldc -129",
                "bipush -128",
                "iconst_m1",
                "iconst_0",
                "iconst_5",
                "bipush 6",
                "bipush 127",
                "ldc 128",
                "ldc 40000",
            ]
        );
    }

    #[test]
    fn double_constants() {
        assert_eq!(encode(Instruction::DConst(0.0)), "dconst_0");
        assert_eq!(encode(Instruction::DConst(1.0)), "dconst_1");
        assert_eq!(encode(Instruction::DConst(3.0)), "ldc2_w 3.0");
        assert_eq!(encode(Instruction::DConst(-0.0)), "ldc2_w -0.0");
    }

    #[test]
    fn locals_use_short_forms_up_to_slot_three() {
        assert_eq!(
            encode(Instruction::Load {
                ty: Type::Bool,
                address: 3
            }),
            "iload_3"
        );
        assert_eq!(
            encode(Instruction::Store {
                ty: Type::Int,
                address: 4
            }),
            "istore 4"
        );
        assert_eq!(
            encode(Instruction::Load {
                ty: Type::Double,
                address: 6
            }),
            "dload 6"
        );
    }

    #[test]
    fn bool_comparisons_test_against_true() {
        let target = LabelId::new(2);
        let branch = |comparison, ty| Instruction::IfCmp {
            comparison,
            ty,
            target,
        };

        assert_eq!(encode(branch(Comparison::Eq, Type::Bool)), "ifne L2");
        assert_eq!(encode(branch(Comparison::Ne, Type::Bool)), "ifeq L2");
        assert_eq!(encode(branch(Comparison::Eq, Type::Int)), "if_icmpeq L2");
        assert_eq!(encode(branch(Comparison::Ge, Type::Int)), "if_icmpge L2");
        assert_eq!(encode(branch(Comparison::Lt, Type::Double)), "iflt L2");
        assert_eq!(encode(Instruction::IfZ(target)), "ifeq L2");
        assert_eq!(encode(Instruction::IfNZ(target)), "ifne L2");
    }

    #[test]
    fn returns_by_type() {
        assert_eq!(encode(Instruction::Return(Type::Bool)), "ireturn");
        assert_eq!(encode(Instruction::Return(Type::Int)), "ireturn");
        assert_eq!(encode(Instruction::Return(Type::Void)), "return");
        assert_eq!(encode(Instruction::Return(Type::Double)), "return");
    }

    #[test]
    fn calls() {
        assert_eq!(
            encode(Instruction::Call(CallTarget::User {
                class_name: String::from("core001"),
                function_name: String::from("fac"),
                signature: FunctionType::new([Type::Int, Type::Bool], Type::Int),
            })),
            "invokestatic core001/fac(IZ)I"
        );
        assert_eq!(
            encode(Instruction::Call(CallTarget::Builtin(Builtin::PrintInt))),
            "invokestatic Runtime/printInt(I)V"
        );

        let options = CodegenOptions {
            runtime_class: String::from("lib/Io"),
            ..Default::default()
        };

        assert_eq!(
            encode_instruction(
                &Instruction::Call(CallTarget::Builtin(Builtin::ReadInt)),
                &options
            ),
            "invokestatic lib/Io/readInt()I"
        );
    }

    #[test]
    fn arithmetic_and_misc() {
        assert_eq!(
            encode(Instruction::Arithmetic {
                operator: ArithmeticOperator::Div,
                ty: Type::Int
            }),
            "idiv"
        );
        assert_eq!(
            encode(Instruction::Arithmetic {
                operator: ArithmeticOperator::Mul,
                ty: Type::Double
            }),
            "dmul"
        );
        assert_eq!(
            encode(Instruction::Inc {
                ty: Type::Int,
                address: 2,
                delta: -1
            }),
            "iinc 2 -1"
        );
        assert_eq!(encode(Instruction::Dup(Type::Double)), "dup2");
        assert_eq!(encode(Instruction::DoubleCompareGreater), "dcmpg");
        assert_eq!(encode(Instruction::Label(LabelId::new(0))), "L0:");
        assert_eq!(encode(Instruction::Goto(LabelId::new(11))), "goto L11");
    }
}
