//! Boolean conditions from chains of conditional blocks.
//!
//! Each block in a chain tests one simple condition and sends control to
//! the guarded body, to the exit, or to another chain member. The chain is
//! read as a decision diagram: every path that reaches the body is a
//! conjunction of literals, and the disjunction of those paths is factored
//! back into nested `&&`/`||` one test at a time.

use std::rc::Rc;

use bcd_ir::condition::Condition;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::{CmpOp, Insn, MethodCode};
use bcd_ir::locals::LocalsResolver;

use crate::cfg::{BlockId, CFG};
use crate::error::{DecompileError, Result};
use crate::options::DecompilerOptions;
use crate::stack;

fn operands<const N: usize>(stack: Vec<Rc<Expr>>, break_point: usize) -> Result<[Rc<Expr>; N]> {
    stack.try_into().map_err(|_| DecompileError::ConditionShape {
        break_point,
        reason: "operand stack does not hold exactly the jump operands",
    })
}

/// The condition under which a single conditional block takes its jump.
pub fn simple_condition(
    cfg: &CFG,
    block: BlockId,
    code: &MethodCode,
    locals: &dyn LocalsResolver,
    options: &DecompilerOptions,
) -> Result<Condition> {
    let b = &cfg.blocks[block];
    let bp = b.break_point;
    let rec = stack::recover_block(code, b.body.clone(), locals, options, Vec::new())?;
    if !rec.stmts.is_empty() {
        return Err(DecompileError::ConditionShape {
            break_point: bp,
            reason: "statements before the comparison",
        });
    }

    let cond = match &code.instructions[bp] {
        Insn::IfZero(op, _) => {
            let [value] = operands(rec.stack, bp)?;
            match &*value {
                Expr::NumberCompare { lhs, rhs, .. } => Condition::Compare {
                    lhs: lhs.clone(),
                    op: *op,
                    rhs: rhs.clone(),
                },
                _ if matches!(op, CmpOp::Eq | CmpOp::Ne) && !value.is_int_like() => {
                    Condition::Bool {
                        value,
                        negated: *op == CmpOp::Eq,
                    }
                }
                _ => Condition::Compare {
                    lhs: value,
                    op: *op,
                    rhs: Rc::new(Expr::Int(0)),
                },
            }
        }
        Insn::IfICmp(op, _) | Insn::IfACmp(op, _) => {
            let [lhs, rhs] = operands(rec.stack, bp)?;
            Condition::Compare { lhs, op: *op, rhs }
        }
        Insn::IfNull(_) | Insn::IfNonNull(_) => {
            let [value] = operands(rec.stack, bp)?;
            let op = if matches!(code.instructions[bp], Insn::IfNull(_)) {
                CmpOp::Eq
            } else {
                CmpOp::Ne
            };
            Condition::Compare {
                lhs: value,
                op,
                rhs: Rc::new(Expr::Null),
            }
        }
        _ => {
            return Err(DecompileError::ConditionShape {
                break_point: bp,
                reason: "not a conditional jump",
            });
        }
    };
    Ok(cond)
}

#[derive(Debug, Clone, Copy)]
enum Dest {
    Node(usize),
    Body,
    Exit,
}

#[derive(Debug, Clone, Copy)]
struct Literal {
    node: usize,
    /// The jump was taken.
    taken: bool,
}

/// Condition under which control flows from `chain[0]` into `body`.
///
/// Edges leaving the chain must go to `body` or `ret`.
pub fn make_condition(
    cfg: &CFG,
    chain: &[BlockId],
    body: BlockId,
    ret: Option<BlockId>,
    code: &MethodCode,
    locals: &dyn LocalsResolver,
    options: &DecompilerOptions,
) -> Result<Condition> {
    let atoms = chain
        .iter()
        .map(|&b| simple_condition(cfg, b, code, locals, options))
        .collect::<Result<Vec<_>>>()?;

    let dest = |from: BlockId, to: Option<BlockId>| -> Result<Dest> {
        let escape = || DecompileError::ConditionEdgeEscapes {
            break_point: cfg.blocks[from].break_point,
        };
        let to = to.ok_or_else(escape)?;
        if to == body {
            Ok(Dest::Body)
        } else if Some(to) == ret {
            Ok(Dest::Exit)
        } else if let Some(p) = chain.iter().position(|&c| c == to) {
            Ok(Dest::Node(p))
        } else {
            Err(escape())
        }
    };
    let nodes = chain
        .iter()
        .map(|&b| -> Result<(Dest, Dest)> {
            let block = &cfg.blocks[b];
            Ok((dest(b, block.target)?, dest(b, block.else_target)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut paths = Vec::new();
    let mut walk = PathWalk {
        nodes: &nodes,
        on_path: vec![false; nodes.len()],
        path: Vec::new(),
        paths: &mut paths,
    };
    walk.visit(0).map_err(|node| DecompileError::ConditionEdgeEscapes {
        break_point: cfg.blocks[chain[node]].break_point,
    })?;

    let path_refs: Vec<&[Literal]> = paths.iter().map(Vec::as_slice).collect();
    let cond = simplify(factor(&path_refs, &atoms));
    log::trace!("condition over {chain:?} into block {body}: {cond}");
    Ok(cond)
}

struct PathWalk<'a> {
    nodes: &'a [(Dest, Dest)],
    on_path: Vec<bool>,
    path: Vec<Literal>,
    paths: &'a mut Vec<Vec<Literal>>,
}

impl PathWalk<'_> {
    /// Collects every literal path from `node` into the body. Errors with
    /// the node closing a cycle.
    fn visit(&mut self, node: usize) -> std::result::Result<(), usize> {
        if self.on_path[node] {
            return Err(node);
        }
        self.on_path[node] = true;
        let (on_taken, on_fallen) = self.nodes[node];
        for (dest, taken) in [(on_taken, true), (on_fallen, false)] {
            self.path.push(Literal { node, taken });
            match dest {
                Dest::Body => self.paths.push(self.path.clone()),
                Dest::Exit => {}
                Dest::Node(next) => self.visit(next)?,
            }
            self.path.pop();
        }
        self.on_path[node] = false;
        Ok(())
    }
}

fn literal(atoms: &[Condition], lit: Literal) -> Condition {
    if lit.taken {
        atoms[lit.node].clone()
    } else {
        atoms[lit.node].inverse()
    }
}

/// Factor a disjunction of literal paths by splitting on the leading test.
fn factor(paths: &[&[Literal]], atoms: &[Condition]) -> Condition {
    if paths.is_empty() {
        return Condition::Const(false);
    }
    if paths.iter().any(|p| p.is_empty()) {
        return Condition::Const(true);
    }
    let node = paths[0][0].node;
    if paths.iter().any(|p| p[0].node != node) {
        // Paths not sharing a root; keep them as a plain disjunction.
        return Condition::Or(
            paths
                .iter()
                .map(|p| Condition::And(p.iter().map(|&l| literal(atoms, l)).collect()))
                .collect(),
        );
    }
    let (taken, fallen): (Vec<&[Literal]>, Vec<&[Literal]>) =
        paths.iter().copied().partition(|p| p[0].taken);
    let t = factor(&tails(&taken), atoms);
    let f = factor(&tails(&fallen), atoms);
    combine(atoms[node].clone(), t, f)
}

fn tails<'a>(paths: &[&'a [Literal]]) -> Vec<&'a [Literal]> {
    paths.iter().map(|&p| &p[1..]).collect()
}

#[derive(Clone, Copy, PartialEq)]
enum Junction {
    And,
    Or,
}

fn members(c: &Condition, kind: Junction) -> Vec<Condition> {
    match (c, kind) {
        (Condition::And(xs), Junction::And) | (Condition::Or(xs), Junction::Or) => xs.clone(),
        _ => vec![c.clone()],
    }
}

fn join(kind: Junction, mut xs: Vec<Condition>) -> Condition {
    if xs.len() == 1 {
        return xs.remove(0);
    }
    match kind {
        Junction::And => Condition::And(xs),
        Junction::Or => Condition::Or(xs),
    }
}

fn and(a: Condition, b: Condition) -> Condition {
    let mut xs = members(&a, Junction::And);
    xs.extend(members(&b, Junction::And));
    join(Junction::And, xs)
}

fn or(a: Condition, b: Condition) -> Condition {
    let mut xs = members(&a, Junction::Or);
    xs.extend(members(&b, Junction::Or));
    join(Junction::Or, xs)
}

/// `c` with the trailing `kind`-members equal to `tail` removed, if `c`
/// ends in them and has something left.
fn strip_tail(c: &Condition, kind: Junction, tail: &Condition) -> Option<Condition> {
    let cm = members(c, kind);
    let tm = members(tail, kind);
    if cm.len() > tm.len() && cm.ends_with(&tm) {
        Some(join(kind, cm[..cm.len() - tm.len()].to_vec()))
    } else {
        None
    }
}

/// `p ? t : f` expressed with `&&` and `||`.
fn combine(p: Condition, t: Condition, f: Condition) -> Condition {
    if t == f {
        return t;
    }
    let not_p = p.inverse();
    match (&t, &f) {
        (Condition::Const(true), Condition::Const(false)) => return p,
        (Condition::Const(false), Condition::Const(true)) => return not_p,
        (Condition::Const(true), _) => return or(p, f),
        (_, Condition::Const(false)) => return and(p, t),
        (Condition::Const(false), _) => return and(not_p, f),
        (_, Condition::Const(true)) => return or(not_p, t),
        _ => {}
    }
    if let Some(x) = strip_tail(&f, Junction::Or, &t) {
        return or(and(not_p, x), t);
    }
    if let Some(x) = strip_tail(&t, Junction::Or, &f) {
        return or(and(p, x), f);
    }
    if let Some(x) = strip_tail(&f, Junction::And, &t) {
        return and(or(p, x), t);
    }
    if let Some(x) = strip_tail(&t, Junction::And, &f) {
        return and(or(not_p, x), f);
    }
    Condition::Or(vec![and(p, t), and(not_p, f)])
}

/// Flatten nested junctions and fold constants.
pub fn simplify(cond: Condition) -> Condition {
    match cond {
        Condition::And(xs) => simplify_junction(xs, Junction::And),
        Condition::Or(xs) => simplify_junction(xs, Junction::Or),
        other => other,
    }
}

fn simplify_junction(xs: Vec<Condition>, kind: Junction) -> Condition {
    // identity and absorbing constants
    let (unit, zero) = match kind {
        Junction::And => (true, false),
        Junction::Or => (false, true),
    };
    let mut out = Vec::with_capacity(xs.len());
    for x in xs {
        let x = simplify(x);
        if x.is_const(unit) {
            continue;
        }
        if x.is_const(zero) {
            return Condition::Const(zero);
        }
        out.extend(members(&x, kind));
    }
    if out.is_empty() {
        return Condition::Const(unit);
    }
    join(kind, out)
}
