mod common;

use bcd_decompiler::DecompileError;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::{ArithOp, Insn, ValueKind};
use bcd_ir::stmt::Stmt;
use common::*;

fn returned(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::Return(Some(e)) => e,
        other => panic!("expected a value return, got {other:?}"),
    }
}

#[test]
fn constructor_call_fuses_with_new() {
    let stmts = decompile(vec![
        Insn::New("java/util/ArrayList".to_string()),
        Insn::Dup,
        invokespecial("java/util/ArrayList", "<init>", "()V"),
        astore(1),
        vreturn(),
    ]);
    match &stmts[0] {
        Stmt::LocalAssign { value, .. } => {
            assert!(matches!(**value, Expr::New { .. }));
            assert_eq!(value.to_string(), "new java.util.ArrayList()");
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn discarded_construction_is_kept() {
    let stmts = decompile(vec![
        Insn::New("Foo".to_string()),
        Insn::Dup,
        iconst(3),
        invokespecial("Foo", "<init>", "(I)V"),
        Insn::Pop,
        vreturn(),
    ]);
    assert_eq!(stmts.len(), 2);
    assert_eq!(invoked(&stmts[0]), "new Foo(3)");
}

#[test]
fn string_builder_chain_collapses() {
    let sb = "java/lang/StringBuilder";
    let stmts = decompile(vec![
        Insn::New(sb.to_string()),
        Insn::Dup,
        invokespecial(sb, "<init>", "()V"),
        ldc("n="),
        invokevirtual(sb, "append", "(Ljava/lang/String;)Ljava/lang/StringBuilder;"),
        iload(1),
        invokevirtual(sb, "append", "(I)Ljava/lang/StringBuilder;"),
        invokevirtual(sb, "toString", "()Ljava/lang/String;"),
        Insn::Return(Some(ValueKind::Reference)),
    ]);
    let value = returned(&stmts[0]);
    assert!(matches!(value, Expr::StringConcat(parts) if parts.len() == 2));
    assert_eq!(value.to_string(), "\"n=\" + local1");
}

#[test]
fn arithmetic_keeps_operand_order() {
    let stmts = decompile(vec![
        iload(1),
        iload(2),
        Insn::Arith(ArithOp::Sub, ValueKind::Int),
        iconst(2),
        Insn::Arith(ArithOp::Mul, ValueKind::Int),
        Insn::Return(Some(ValueKind::Int)),
    ]);
    assert_eq!(returned(&stmts[0]).to_string(), "((local1 - local2) * 2)");
}

#[test]
fn constant_array_initializer_folds() {
    let stmts = decompile(vec![
        iconst(2),
        Insn::NewArray("I".to_string()),
        Insn::Dup,
        iconst(0),
        iconst(7),
        Insn::ArrayStore(ValueKind::Int),
        Insn::Dup,
        iconst(1),
        iconst(9),
        Insn::ArrayStore(ValueKind::Int),
        astore(1),
        vreturn(),
    ]);
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        Stmt::LocalAssign { value, .. } => assert_eq!(value.to_string(), "new int[] {7, 9}"),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn swap_reorders_operands() {
    let stmts = decompile(vec![
        iload(1),
        iload(2),
        Insn::Swap,
        Insn::Arith(ArithOp::Sub, ValueKind::Int),
        Insn::Return(Some(ValueKind::Int)),
    ]);
    assert_eq!(returned(&stmts[0]).to_string(), "(local2 - local1)");
}

#[test]
fn pop_on_empty_stack_underflows() {
    let err = try_decompile(vec![Insn::Pop, vreturn()]).unwrap_err();
    assert!(matches!(err, DecompileError::StackUnderflow { index: 0 }), "got {err}");
}

#[test]
fn monitors_are_rejected() {
    let err = try_decompile(vec![aload(0), Insn::MonitorEnter, vreturn()]).unwrap_err();
    assert!(
        matches!(
            err,
            DecompileError::UnsupportedInstruction {
                index: 1,
                mnemonic: "monitorenter"
            }
        ),
        "got {err}"
    );
}
