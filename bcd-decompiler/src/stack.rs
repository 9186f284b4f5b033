use std::ops::Range;
use std::rc::Rc;

use bcd_ir::descriptor::MethodDescriptor;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::{Constant, Insn, InvokeKind, MethodCode, ValueKind};
use bcd_ir::locals::{LocalInstance, LocalsResolver};
use bcd_ir::stmt::Stmt;

use crate::error::{DecompileError, Result};
use crate::options::DecompilerOptions;
use crate::patterns;

/// Result of recovering expressions from a basic block.
#[derive(Debug)]
pub struct BlockRecovery {
    pub stmts: Vec<Stmt>,
    /// Values left on the operand stack, bottom first.
    pub stack: Vec<Rc<Expr>>,
}

/// Recover statements from the instructions in `range`, starting with
/// `entry` on the operand stack.
pub fn recover_block(
    code: &MethodCode,
    range: Range<usize>,
    locals: &dyn LocalsResolver,
    options: &DecompilerOptions,
    entry: Vec<Rc<Expr>>,
) -> Result<BlockRecovery> {
    let mut state = ExprState {
        locals,
        options,
        stack: entry,
        stmts: Vec::new(),
    };
    for idx in range {
        state.process_insn(idx, &code.instructions[idx])?;
    }
    Ok(BlockRecovery {
        stmts: state.stmts,
        stack: state.stack,
    })
}

struct ExprState<'a> {
    locals: &'a dyn LocalsResolver,
    options: &'a DecompilerOptions,
    stack: Vec<Rc<Expr>>,
    stmts: Vec<Stmt>,
}

fn constant_expr(c: &Constant) -> Expr {
    match c {
        Constant::Int(v) => Expr::Int(*v),
        Constant::Long(v) => Expr::Long(*v),
        Constant::Float(v) => Expr::Float(*v),
        Constant::Double(v) => Expr::Double(*v),
        Constant::Str(s) => Expr::Str(s.clone()),
        Constant::Class(c) => Expr::Class(c.clone()),
    }
}

/// `checkcast`/`instanceof` operand (internal name or array descriptor) as a
/// field descriptor.
fn type_operand(ty: &str) -> String {
    if ty.starts_with('[') {
        ty.to_string()
    } else {
        format!("L{ty};")
    }
}

/// New array expression with `value` appended to its initializer, if the
/// store at `index` continues filling a fresh constant-size array in order.
fn fold_initializer(array: &Expr, index: &Expr, value: &Rc<Expr>) -> Option<Rc<Expr>> {
    let Expr::NewArray {
        component,
        size,
        init,
    } = array
    else {
        return None;
    };
    let (Expr::Int(n), Expr::Int(k)) = (&**size, index) else {
        return None;
    };
    let filled = init.as_ref().map_or(0, Vec::len);
    if *k < 0 || *k as usize != filled || *k >= *n {
        return None;
    }
    let mut values = init.clone().unwrap_or_default();
    values.push(value.clone());
    Some(Rc::new(Expr::NewArray {
        component: component.clone(),
        size: size.clone(),
        init: Some(values),
    }))
}

impl ExprState<'_> {
    /// Local at `slot`; without debug info the access kind supplies a
    /// primitive descriptor.
    fn local(&self, slot: u16, kind: ValueKind, idx: usize) -> LocalInstance {
        let mut local = self.locals.resolve(slot, idx);
        if local.descriptor.is_none() && kind != ValueKind::Reference {
            local.descriptor = Some(kind.descriptor().to_string());
        }
        local
    }

    fn push(&mut self, e: Expr) {
        self.stack.push(Rc::new(e));
    }

    fn pop(&mut self, idx: usize) -> Result<Rc<Expr>> {
        self.stack
            .pop()
            .ok_or(DecompileError::StackUnderflow { index: idx })
    }

    /// Pop `n` values, returned in push order.
    fn pop_n(&mut self, n: usize, idx: usize) -> Result<Vec<Rc<Expr>>> {
        if self.stack.len() < n {
            return Err(DecompileError::StackUnderflow { index: idx });
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    /// Point every stack reference to `old` at `new`.
    fn replace_all(&mut self, old: &Rc<Expr>, new: &Rc<Expr>) -> bool {
        let mut found = false;
        for e in &mut self.stack {
            if Rc::ptr_eq(e, old) {
                *e = new.clone();
                found = true;
            }
        }
        found
    }

    /// Keep a discarded value only if evaluating it does something.
    fn discard(&mut self, value: Rc<Expr>) {
        if value.is_invocation() {
            self.stmts.push(Stmt::Invoke(value));
        }
    }

    fn push_or_emit(&mut self, call: Expr, returns_void: bool) {
        if returns_void {
            self.stmts.push(Stmt::Invoke(Rc::new(call)));
        } else {
            self.push(call);
        }
    }

    fn process_insn(&mut self, idx: usize, insn: &Insn) -> Result<()> {
        log::trace!("{idx}: {} (stack {})", insn.mnemonic(), self.stack.len());
        match insn {
            Insn::Label(_) | Insn::LineNumber(_) | Insn::Frame | Insn::Nop => {}

            Insn::AConstNull => self.push(Expr::Null),
            Insn::Push(c) => self.push(constant_expr(c)),
            Insn::Load { kind, slot } => {
                let local = self.local(*slot, *kind, idx);
                self.push(Expr::Local(local));
            }
            Insn::Store { kind, slot } => {
                let value = self.pop(idx)?;
                let local = self.local(*slot, *kind, idx);
                self.stmts.push(Stmt::LocalAssign { local, value });
            }
            Insn::ArrayLoad(kind) => {
                let index = self.pop(idx)?;
                let array = self.pop(idx)?;
                self.push(Expr::ArrayElement {
                    array,
                    index,
                    kind: *kind,
                });
            }
            Insn::ArrayStore(_) => {
                let value = self.pop(idx)?;
                let index = self.pop(idx)?;
                let array = self.pop(idx)?;
                if self.options.fold_array_initializers {
                    if let Some(folded) = fold_initializer(&array, &index, &value) {
                        if self.replace_all(&array, &folded) {
                            return Ok(());
                        }
                    }
                }
                self.stmts.push(Stmt::ArrayAssign {
                    array,
                    index,
                    value,
                });
            }

            Insn::Pop => {
                let v = self.pop(idx)?;
                self.discard(v);
            }
            Insn::Pop2 => {
                let v = self.pop(idx)?;
                if !v.is_wide() {
                    let below = self.pop(idx)?;
                    self.discard(below);
                }
                self.discard(v);
            }
            Insn::Dup => {
                let v = self
                    .stack
                    .last()
                    .cloned()
                    .ok_or(DecompileError::StackUnderflow { index: idx })?;
                self.stack.push(v);
            }
            Insn::DupX1 => {
                let [v2, v1] = self.pop_array(idx)?;
                self.stack.extend([v1.clone(), v2, v1]);
            }
            Insn::DupX2 => {
                let v1 = self.pop(idx)?;
                let v2 = self.pop(idx)?;
                if v2.is_wide() {
                    self.stack.extend([v1.clone(), v2, v1]);
                } else {
                    let v3 = self.pop(idx)?;
                    self.stack.extend([v1.clone(), v3, v2, v1]);
                }
            }
            Insn::Dup2 => {
                let v1 = self.pop(idx)?;
                if v1.is_wide() {
                    self.stack.extend([v1.clone(), v1]);
                } else {
                    let v2 = self.pop(idx)?;
                    self.stack.extend([v2.clone(), v1.clone(), v2, v1]);
                }
            }
            Insn::Dup2X1 => {
                let v1 = self.pop(idx)?;
                if v1.is_wide() {
                    let v2 = self.pop(idx)?;
                    self.stack.extend([v1.clone(), v2, v1]);
                } else {
                    let v2 = self.pop(idx)?;
                    let v3 = self.pop(idx)?;
                    self.stack.extend([v2.clone(), v1.clone(), v3, v2, v1]);
                }
            }
            Insn::Dup2X2 => self.dup2_x2(idx)?,
            Insn::Swap => {
                let [v2, v1] = self.pop_array(idx)?;
                self.stack.extend([v1, v2]);
            }

            Insn::Arith(op, kind) => {
                let [lhs, rhs] = self.pop_array(idx)?;
                self.push(Expr::Binary {
                    op: *op,
                    kind: *kind,
                    lhs,
                    rhs,
                });
            }
            Insn::Neg(kind) => {
                let operand = self.pop(idx)?;
                self.push(Expr::Neg {
                    kind: *kind,
                    operand,
                });
            }
            Insn::Iinc { slot, delta } => {
                let local = self.local(*slot, ValueKind::Int, idx);
                self.stmts.push(Stmt::Increment {
                    local,
                    delta: *delta,
                });
            }
            Insn::Convert { to, .. } => {
                let value = self.pop(idx)?;
                self.push(Expr::Cast {
                    ty: to.descriptor().to_string(),
                    value,
                });
            }
            Insn::Compare(kind) => {
                let [lhs, rhs] = self.pop_array(idx)?;
                self.push(Expr::NumberCompare {
                    kind: *kind,
                    lhs,
                    rhs,
                });
            }

            Insn::Return(kind) => {
                let value = match kind {
                    Some(_) => Some(self.pop(idx)?),
                    None => None,
                };
                self.stmts.push(Stmt::Return(value));
            }
            Insn::Throw => {
                let value = self.pop(idx)?;
                self.stmts.push(Stmt::Throw(value));
            }

            Insn::GetStatic(field) => self.push(Expr::StaticField(field.clone())),
            Insn::PutStatic(field) => {
                let value = self.pop(idx)?;
                self.stmts.push(Stmt::StaticFieldAssign {
                    field: field.clone(),
                    value,
                });
            }
            Insn::GetField(field) => {
                let object = self.pop(idx)?;
                self.push(Expr::InstanceField {
                    object,
                    field: field.clone(),
                });
            }
            Insn::PutField(field) => {
                let [object, value] = self.pop_array(idx)?;
                self.stmts.push(Stmt::InstanceFieldAssign {
                    object,
                    field: field.clone(),
                    value,
                });
            }
            Insn::Invoke { kind, method } => {
                let desc = MethodDescriptor::parse(&method.desc)?;
                let args = self.pop_n(desc.params.len(), idx)?;
                if *kind == InvokeKind::Static {
                    let call = Expr::InvokeStatic {
                        method: method.clone(),
                        args,
                    };
                    self.push_or_emit(call, desc.returns_void());
                    return Ok(());
                }
                let receiver = self.pop(idx)?;
                if method.is_constructor() {
                    if let Expr::PendingNew(class) = &*receiver {
                        let constructed = Rc::new(Expr::New {
                            class: class.clone(),
                            desc: method.desc.clone(),
                            args,
                        });
                        if !self.replace_all(&receiver, &constructed) {
                            // `new T()` whose result is never used
                            self.stmts.push(Stmt::Invoke(constructed));
                        }
                        return Ok(());
                    }
                }
                let mut call = Expr::InvokeInstance {
                    kind: *kind,
                    receiver,
                    method: method.clone(),
                    args,
                };
                if self.options.collapse_string_concat {
                    if let Some(concat) = patterns::collapse_string_concat(&call) {
                        call = concat;
                    }
                }
                self.push_or_emit(call, desc.returns_void());
            }
            Insn::InvokeDynamic { name, desc } => {
                let parsed = MethodDescriptor::parse(desc)?;
                let args = self.pop_n(parsed.params.len(), idx)?;
                let call = Expr::InvokeDynamic {
                    name: name.clone(),
                    desc: desc.clone(),
                    args,
                };
                self.push_or_emit(call, parsed.returns_void());
            }

            Insn::New(class) => self.push(Expr::PendingNew(class.clone())),
            Insn::NewArray(component) => {
                let size = self.pop(idx)?;
                self.push(Expr::NewArray {
                    component: component.clone(),
                    size,
                    init: None,
                });
            }
            Insn::ArrayLength => {
                let array = self.pop(idx)?;
                self.push(Expr::ArrayLength(array));
            }
            Insn::CheckCast(ty) => {
                let value = self.pop(idx)?;
                self.push(Expr::Cast {
                    ty: type_operand(ty),
                    value,
                });
            }
            Insn::InstanceOf(ty) => {
                let value = self.pop(idx)?;
                self.push(Expr::InstanceOf {
                    value,
                    ty: type_operand(ty),
                });
            }
            Insn::MultiANewArray { desc, dims } => {
                let dims = self.pop_n(usize::from(*dims), idx)?;
                self.push(Expr::NewMultiArray {
                    desc: desc.clone(),
                    dims,
                });
            }

            Insn::MonitorEnter
            | Insn::MonitorExit
            | Insn::IfZero(..)
            | Insn::IfICmp(..)
            | Insn::IfACmp(..)
            | Insn::IfNull(_)
            | Insn::IfNonNull(_)
            | Insn::Goto(_)
            | Insn::TableSwitch { .. }
            | Insn::LookupSwitch { .. } => {
                return Err(DecompileError::UnsupportedInstruction {
                    index: idx,
                    mnemonic: insn.mnemonic(),
                });
            }
        }
        Ok(())
    }

    /// Pop `N` values, returned in push order.
    fn pop_array<const N: usize>(&mut self, idx: usize) -> Result<[Rc<Expr>; N]> {
        let values = self.pop_n(N, idx)?;
        values
            .try_into()
            .map_err(|_| DecompileError::StackUnderflow { index: idx })
    }

    fn dup2_x2(&mut self, idx: usize) -> Result<()> {
        let v1 = self.pop(idx)?;
        let v2 = self.pop(idx)?;
        match (v1.is_wide(), v2.is_wide()) {
            (true, true) => self.stack.extend([v1.clone(), v2, v1]),
            (true, false) => {
                let v3 = self.pop(idx)?;
                self.stack.extend([v1.clone(), v3, v2, v1]);
            }
            (false, _) => {
                let v3 = self.pop(idx)?;
                if v3.is_wide() {
                    self.stack.extend([v2.clone(), v1.clone(), v3, v2, v1]);
                } else {
                    let v4 = self.pop(idx)?;
                    self.stack.extend([v2.clone(), v1.clone(), v4, v3, v2, v1]);
                }
            }
        }
        Ok(())
    }
}
