#![allow(dead_code)]

use bcd_decompiler::{DecompileError, decompile_method};
use bcd_ir::instruction::*;
use bcd_ir::locals::Locals;
use bcd_ir::stmt::Stmt;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn label(n: u32) -> Insn {
    Insn::Label(Label(n))
}

pub fn iconst(v: i32) -> Insn {
    Insn::Push(Constant::Int(v))
}

pub fn ldc(s: &str) -> Insn {
    Insn::Push(Constant::Str(s.to_string()))
}

pub fn iload(slot: u16) -> Insn {
    Insn::Load {
        kind: ValueKind::Int,
        slot,
    }
}

pub fn istore(slot: u16) -> Insn {
    Insn::Store {
        kind: ValueKind::Int,
        slot,
    }
}

pub fn aload(slot: u16) -> Insn {
    Insn::Load {
        kind: ValueKind::Reference,
        slot,
    }
}

pub fn astore(slot: u16) -> Insn {
    Insn::Store {
        kind: ValueKind::Reference,
        slot,
    }
}

pub fn invokestatic(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::Invoke {
        kind: InvokeKind::Static,
        method: MethodRef::new(owner, name, desc),
    }
}

pub fn invokevirtual(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::Invoke {
        kind: InvokeKind::Virtual,
        method: MethodRef::new(owner, name, desc),
    }
}

pub fn invokespecial(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::Invoke {
        kind: InvokeKind::Special,
        method: MethodRef::new(owner, name, desc),
    }
}

/// `C.name()Z`, a boolean test with no operands.
pub fn check(name: &str) -> Insn {
    invokestatic("C", name, "()Z")
}

/// `C.name()V`, a statement with no operands.
pub fn call(name: &str) -> Insn {
    invokestatic("C", name, "()V")
}

pub fn ifeq(l: u32) -> Insn {
    Insn::IfZero(CmpOp::Eq, Label(l))
}

pub fn ifne(l: u32) -> Insn {
    Insn::IfZero(CmpOp::Ne, Label(l))
}

pub fn goto(l: u32) -> Insn {
    Insn::Goto(Label(l))
}

pub fn vreturn() -> Insn {
    Insn::Return(None)
}

pub fn code(insns: Vec<Insn>) -> MethodCode {
    MethodCode::new(insns, vec![]).unwrap()
}

pub fn try_decompile(insns: Vec<Insn>) -> Result<Vec<Stmt>, DecompileError> {
    init_logger();
    decompile_method(&code(insns), &Locals::default())
}

pub fn decompile(insns: Vec<Insn>) -> Vec<Stmt> {
    try_decompile(insns).unwrap()
}

/// Display form of the call in an expression statement.
pub fn invoked(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Invoke(e) => e.to_string(),
        other => panic!("expected a call statement, got {other:?}"),
    }
}

pub fn invoked_all(stmts: &[Stmt]) -> Vec<String> {
    stmts.iter().map(invoked).collect()
}
