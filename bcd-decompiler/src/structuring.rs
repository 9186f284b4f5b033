use std::rc::Rc;

use bcd_ir::condition::Condition;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::MethodCode;
use bcd_ir::locals::{LocalInstance, LocalsResolver};
use bcd_ir::stmt::{CatchClause, Elif, Stmt, SwitchCase};

use crate::cfg::{BlockId, CFG};
use crate::error::{DecompileError, Result};
use crate::options::DecompilerOptions;
use crate::patterns;
use crate::region::{CaseSection, CatchSection, Section};
use crate::stack::{self, BlockRecovery};

/// Turn partitioned sections into statements.
pub fn structure_method(
    cfg: &CFG,
    code: &MethodCode,
    locals: &dyn LocalsResolver,
    options: &DecompilerOptions,
    sections: Vec<Section>,
) -> Result<Vec<Stmt>> {
    let ctx = StructCtx {
        cfg,
        code,
        locals,
        options,
    };
    ctx.stmts(sections)
}

struct StructCtx<'a> {
    cfg: &'a CFG,
    code: &'a MethodCode,
    locals: &'a dyn LocalsResolver,
    options: &'a DecompilerOptions,
}

impl StructCtx<'_> {
    /// Simulate a block. Handler entries start with the caught exception on
    /// the stack.
    fn recover(&self, id: BlockId) -> Result<BlockRecovery> {
        let block = &self.cfg.blocks[id];
        let entry = if block.is_catch_handler {
            vec![Rc::new(Expr::CaughtException(block.caught_type.clone()))]
        } else {
            Vec::new()
        };
        stack::recover_block(self.code, block.body.clone(), self.locals, self.options, entry)
    }

    fn stmts(&self, sections: Vec<Section>) -> Result<Vec<Stmt>> {
        let mut out = Vec::new();
        for section in sections {
            self.emit(section, &mut out)?;
        }
        Ok(out)
    }

    fn emit(&self, section: Section, out: &mut Vec<Stmt>) -> Result<()> {
        match section {
            Section::Inline(id) => {
                let block = &self.cfg.blocks[id];
                if block.is_conditional() || block.is_switch() {
                    return Err(DecompileError::UnresolvedConditional {
                        break_point: block.break_point,
                    });
                }
                let rec = self.recover(id)?;
                if !rec.stack.is_empty() {
                    log::warn!(
                        "block {id} leaves {} value(s) on the stack, dropping them",
                        rec.stack.len()
                    );
                }
                out.extend(rec.stmts);
            }
            Section::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                let body = self.stmts(body)?;
                let elifs = elifs
                    .into_iter()
                    .map(|e| -> Result<Elif> {
                        Ok(Elif {
                            cond: e.cond,
                            body: self.stmts(e.body)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let else_body = else_body.map(|b| self.stmts(b)).transpose()?;
                out.push(Stmt::If {
                    cond,
                    body,
                    elifs,
                    else_body,
                });
            }
            Section::While { cond, body } => {
                let body = self.stmts(body)?;
                if self.options.recover_for_loops {
                    if let Some(stmt) = make_for(out, &cond, &body) {
                        out.push(stmt);
                        return Ok(());
                    }
                }
                out.push(Stmt::While { cond, body });
            }
            Section::DoWhile { cond, body } => {
                let body = self.stmts(body)?;
                out.push(Stmt::DoWhile { cond, body });
            }
            Section::Switch { selector, cases } => {
                let stmt = self.switch(selector, cases, out)?;
                out.push(stmt);
            }
            Section::TryCatch { body, catches } => {
                let body = self.stmts(body)?;
                let catches = catches
                    .into_iter()
                    .map(|c| self.catch_clause(c))
                    .collect::<Result<Vec<_>>>()?;
                out.push(Stmt::TryCatch { body, catches });
            }
        }
        Ok(())
    }

    fn switch(
        &self,
        selector: BlockId,
        cases: Vec<CaseSection>,
        out: &mut Vec<Stmt>,
    ) -> Result<Stmt> {
        let block = &self.cfg.blocks[selector];
        let mut rec = self.recover(selector)?;
        let value = rec.stack.pop().ok_or(DecompileError::OperandShape {
            index: block.break_point,
            expected: "switch selector",
        })?;
        out.extend(rec.stmts);

        let (selector, enum_type) = match self
            .options
            .recover_enum_switches
            .then(|| patterns::enum_switch_selector(&value))
            .flatten()
        {
            Some((value, owner)) => (value, Some(owner)),
            None => (value, None),
        };
        let cases = cases
            .into_iter()
            .map(|c| -> Result<SwitchCase> {
                Ok(SwitchCase {
                    keys: c.keys,
                    is_default: c.is_default,
                    body: self.stmts(c.body)?,
                    breaks: c.breaks,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Stmt::Switch {
            selector,
            enum_type,
            cases,
        })
    }

    fn catch_clause(&self, c: CatchSection) -> Result<CatchClause> {
        let mut body = self.stmts(c.body)?;
        // `astore e` at handler entry names the exception
        let binding = match body.first() {
            Some(Stmt::LocalAssign { local, value })
                if matches!(**value, Expr::CaughtException(_)) =>
            {
                Some(local.clone())
            }
            _ => None,
        };
        if binding.is_some() {
            body.remove(0);
        }
        log::trace!("catch at block {} binds {binding:?}", c.handler);
        Ok(CatchClause {
            exception: c.exception,
            binding,
            body,
        })
    }
}

/// Whether `stmt` updates `local` in terms of itself.
fn is_update_of(stmt: &Stmt, local: &LocalInstance) -> bool {
    match stmt {
        Stmt::Increment { local: l, .. } => l == local,
        Stmt::LocalAssign { local: l, value } => l == local && value.references_local(local),
        _ => false,
    }
}

/// `init; while (cond) { ...; update }` as a `for` loop, taking `init` off
/// the end of `out`. The update is optional.
fn make_for(out: &mut Vec<Stmt>, cond: &Condition, body: &[Stmt]) -> Option<Stmt> {
    let Some(Stmt::LocalAssign { local, .. }) = out.last() else {
        return None;
    };
    if !cond.any_operand(&mut |e| e.references_local(local)) {
        return None;
    }
    let (update, rest) = match body.split_last() {
        Some((last, rest)) if is_update_of(last, local) => (Some(Box::new(last.clone())), rest),
        _ => (None, body),
    };
    let init = out.pop()?;
    Some(Stmt::For {
        init: Box::new(init),
        cond: cond.clone(),
        update,
        body: rest.to_vec(),
    })
}
