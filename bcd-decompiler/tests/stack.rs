mod common;

use bcd_decompiler::DecompilerOptions;
use bcd_decompiler::stack::{BlockRecovery, recover_block};
use bcd_ir::instruction::{Insn, ValueKind};
use bcd_ir::locals::Locals;
use common::*;

fn lload(slot: u16) -> Insn {
    Insn::Load {
        kind: ValueKind::Long,
        slot,
    }
}

fn run(insns: Vec<Insn>) -> BlockRecovery {
    init_logger();
    let code = code(insns);
    let range = 0..code.instructions.len();
    recover_block(
        &code,
        range,
        &Locals::default(),
        &DecompilerOptions::default(),
        Vec::new(),
    )
    .unwrap()
}

/// Operand stack after running `insns`, bottom first.
fn stack_after(insns: Vec<Insn>) -> Vec<String> {
    run(insns).stack.iter().map(|e| e.to_string()).collect()
}

#[test]
fn dup_x1_copies_under_second() {
    let stack = stack_after(vec![iload(1), iload(2), Insn::DupX1]);
    assert_eq!(stack, ["local2", "local1", "local2"]);
}

#[test]
fn dup_x2_over_narrow_values() {
    let stack = stack_after(vec![iload(1), iload(2), iload(3), Insn::DupX2]);
    assert_eq!(stack, ["local3", "local1", "local2", "local3"]);
}

#[test]
fn dup_x2_over_wide_value() {
    let stack = stack_after(vec![lload(1), iload(3), Insn::DupX2]);
    assert_eq!(stack, ["local3", "local1", "local3"]);
}

#[test]
fn dup2_narrow_pair() {
    let stack = stack_after(vec![iload(1), iload(2), Insn::Dup2]);
    assert_eq!(stack, ["local1", "local2", "local1", "local2"]);
}

#[test]
fn dup2_wide_value() {
    let stack = stack_after(vec![iload(5), lload(1), Insn::Dup2]);
    assert_eq!(stack, ["local5", "local1", "local1"]);
}

#[test]
fn dup2_x1_narrow_pair() {
    let stack = stack_after(vec![iload(1), iload(2), iload(3), Insn::Dup2X1]);
    assert_eq!(stack, ["local2", "local3", "local1", "local2", "local3"]);
}

#[test]
fn dup2_x1_wide_value() {
    let stack = stack_after(vec![iload(1), lload(2), Insn::Dup2X1]);
    assert_eq!(stack, ["local2", "local1", "local2"]);
}

#[test]
fn dup2_x2_all_forms() {
    // wide over wide
    let stack = stack_after(vec![lload(1), lload(3), Insn::Dup2X2]);
    assert_eq!(stack, ["local3", "local1", "local3"]);
    // wide over two narrow
    let stack = stack_after(vec![iload(1), iload(2), lload(3), Insn::Dup2X2]);
    assert_eq!(stack, ["local3", "local1", "local2", "local3"]);
    // narrow pair over wide
    let stack = stack_after(vec![lload(1), iload(3), iload(4), Insn::Dup2X2]);
    assert_eq!(stack, ["local3", "local4", "local1", "local3", "local4"]);
    // narrow pair over narrow pair
    let stack = stack_after(vec![iload(1), iload(2), iload(3), iload(4), Insn::Dup2X2]);
    assert_eq!(stack, ["local3", "local4", "local1", "local2", "local3", "local4"]);
}

#[test]
fn pop2_discards_two_narrow_calls() {
    let rec = run(vec![
        invokestatic("C", "f", "()I"),
        invokestatic("C", "g", "()I"),
        Insn::Pop2,
    ]);
    assert!(rec.stack.is_empty());
    assert_eq!(invoked_all(&rec.stmts), ["C.f()", "C.g()"]);
}

#[test]
fn pop2_discards_one_wide_call() {
    let rec = run(vec![iload(1), invokestatic("C", "l", "()J"), Insn::Pop2]);
    assert_eq!(invoked_all(&rec.stmts), ["C.l()"]);
    let left: Vec<String> = rec.stack.iter().map(|e| e.to_string()).collect();
    assert_eq!(left, ["local1"]);
}

#[test]
fn dup_on_empty_stack_underflows() {
    init_logger();
    let code = code(vec![Insn::DupX1]);
    let err = recover_block(
        &code,
        0..1,
        &Locals::default(),
        &DecompilerOptions::default(),
        Vec::new(),
    )
    .unwrap_err();
    assert!(
        matches!(err, bcd_decompiler::DecompileError::StackUnderflow { index: 0 }),
        "got {err}"
    );
}
