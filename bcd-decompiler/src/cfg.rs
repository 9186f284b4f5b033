use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use bcd_ir::instruction::{Insn, InsnFlags, Label, MethodCode};

use crate::error::{DecompileError, Result};
use crate::region::Section;

/// Index of a basic block within the CFG.
pub type BlockId = usize;

/// How control leaves a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockExit {
    /// Ends at a label (or at a split point) and runs into `target`.
    Fallthrough,
    Goto,
    /// Two-way conditional: `target` when taken, `else_target` otherwise.
    Branch,
    Switch,
    Return,
    Throw,
}

/// Edge to one distinct switch target and the keys that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchEdge {
    pub keys: Vec<i32>,
    pub target: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchEdges {
    /// In table order of first appearance.
    pub cases: Vec<SwitchEdge>,
    pub default: BlockId,
}

/// A basic block: a run of instructions ending at a break point.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique block index.
    pub id: BlockId,
    /// Instruction index that ends the block: its terminal jump, switch,
    /// return or throw, or the label the next block starts after.
    pub break_point: usize,
    /// Instructions simulated for this block. Excludes a trailing jump or
    /// switch, includes a trailing return or throw.
    pub body: Range<usize>,
    pub exit: BlockExit,
    pub target: Option<BlockId>,
    pub else_target: Option<BlockId>,
    pub switch: Option<SwitchEdges>,
    /// Blocks with an edge to this one.
    pub targeted_by: BTreeSet<BlockId>,
    /// If this block is a catch handler entry.
    pub is_catch_handler: bool,
    /// Exception type caught at this handler entry, `None` for catch-all.
    pub caught_type: Option<String>,
    /// Structured section of the nested region this block heads, once the
    /// region has been collapsed.
    pub internal: Option<Box<Section>>,
}

impl BasicBlock {
    pub fn is_conditional(&self) -> bool {
        self.exit == BlockExit::Branch
    }

    pub fn is_goto(&self) -> bool {
        self.exit == BlockExit::Goto
    }

    pub fn is_switch(&self) -> bool {
        self.exit == BlockExit::Switch
    }

    /// Every outgoing edge, switch edges included. May repeat a block.
    pub fn successors(&self) -> Vec<BlockId> {
        let mut succs: Vec<BlockId> = self.target.into_iter().chain(self.else_target).collect();
        if let Some(sw) = &self.switch {
            succs.extend(sw.cases.iter().map(|c| c.target));
            succs.push(sw.default);
        }
        succs
    }

    /// Rewrite every edge with `f`.
    pub fn map_edges(&mut self, mut f: impl FnMut(BlockId) -> BlockId) {
        self.target = self.target.map(&mut f);
        self.else_target = self.else_target.map(&mut f);
        if let Some(sw) = &mut self.switch {
            for case in &mut sw.cases {
                case.target = f(case.target);
            }
            sw.default = f(sw.default);
        }
    }
}

/// Control flow graph for a single method.
#[derive(Debug)]
pub struct CFG {
    /// Basic blocks in physical order, indexed by BlockId.
    pub blocks: Vec<BasicBlock>,
    /// Block that starts right after each label that is a break point.
    pub label_blocks: HashMap<Label, BlockId>,
}

impl CFG {
    /// Block starting after `label`, if the label is a block boundary.
    pub fn block_at_label(&self, label: Label) -> Option<BlockId> {
        self.label_blocks.get(&label).copied()
    }

    /// Build a CFG from a method body.
    pub fn build(code: &MethodCode) -> Result<Self> {
        let instructions = &code.instructions;
        let label_index = |label: Label, index: usize| {
            code.label_index(label)
                .ok_or(DecompileError::UnresolvedLabel {
                    label: label.0,
                    index,
                })
        };

        // Step 1: Identify break points
        let mut breaks = BTreeSet::new();
        for (i, insn) in instructions.iter().enumerate() {
            let flags = insn.flags();
            if let Some(target) = insn.jump_target() {
                breaks.insert(i);
                breaks.insert(label_index(target, i)?);
            } else if let Some((pairs, default)) = insn.switch_targets() {
                breaks.insert(i);
                for (_, l) in pairs {
                    breaks.insert(label_index(l, i)?);
                }
                breaks.insert(label_index(default, i)?);
            } else if flags.intersects(InsnFlags::RETURN | InsnFlags::THROW) {
                breaks.insert(i);
            }
        }

        // Exception range boundaries are break points too
        for tc in &code.try_catch {
            for label in [tc.start, tc.end, tc.handler] {
                match code.label_index(label) {
                    Some(idx) => {
                        breaks.insert(idx);
                    }
                    None => log::warn!("try/catch range references missing label {label}"),
                }
            }
        }

        // Step 2: Create blocks between break points
        let mut blocks = Vec::new();
        let mut start = 0;
        for &brk in &breaks {
            let flags = instructions[brk].flags();
            let (body_end, exit) = if flags.contains(InsnFlags::CONDITIONAL) {
                (brk, BlockExit::Branch)
            } else if flags.contains(InsnFlags::JUMP) {
                (brk, BlockExit::Goto)
            } else if flags.contains(InsnFlags::SWITCH) {
                (brk, BlockExit::Switch)
            } else if flags.contains(InsnFlags::RETURN) {
                (brk + 1, BlockExit::Return)
            } else if flags.contains(InsnFlags::THROW) {
                (brk + 1, BlockExit::Throw)
            } else {
                (brk, BlockExit::Fallthrough)
            };
            blocks.push(BasicBlock {
                id: blocks.len(),
                break_point: brk,
                body: start..body_end,
                exit,
                target: None,
                else_target: None,
                switch: None,
                targeted_by: BTreeSet::new(),
                is_catch_handler: false,
                caught_type: None,
                internal: None,
            });
            start = brk + 1;
        }

        // Trailing instructions only form a block if they do something
        if instructions
            .get(start..)
            .is_some_and(|rest| rest.iter().any(|insn| !insn.is_pseudo()))
        {
            blocks.push(BasicBlock {
                id: blocks.len(),
                break_point: instructions.len(),
                body: start..instructions.len(),
                exit: BlockExit::Fallthrough,
                target: None,
                else_target: None,
                switch: None,
                targeted_by: BTreeSet::new(),
                is_catch_handler: false,
                caught_type: None,
                internal: None,
            });
        }

        let mut label_blocks = HashMap::new();
        for (bi, block) in blocks.iter().enumerate() {
            if let Some(Insn::Label(l)) = instructions.get(block.break_point) {
                if bi + 1 < blocks.len() {
                    label_blocks.insert(*l, bi + 1);
                }
            }
        }

        // Step 3: Add edges
        let block_at = |label: Label, index: usize| {
            label_blocks
                .get(&label)
                .copied()
                .ok_or(DecompileError::UnresolvedLabel {
                    label: label.0,
                    index,
                })
        };
        for bi in 0..blocks.len() {
            let brk = blocks[bi].break_point;
            let next = (bi + 1 < blocks.len()).then_some(bi + 1);
            match blocks[bi].exit {
                BlockExit::Fallthrough => blocks[bi].target = next,
                BlockExit::Goto | BlockExit::Branch => {
                    let insn = &instructions[brk];
                    if let Some(label) = insn.jump_target() {
                        blocks[bi].target = Some(block_at(label, brk)?);
                    }
                    if blocks[bi].exit == BlockExit::Branch {
                        blocks[bi].else_target = next;
                    }
                }
                BlockExit::Switch => {
                    if let Some((pairs, default)) = instructions[brk].switch_targets() {
                        let mut cases: Vec<SwitchEdge> = Vec::new();
                        for (key, label) in pairs {
                            let target = block_at(label, brk)?;
                            match cases.iter_mut().find(|c| c.target == target) {
                                Some(edge) => edge.keys.push(key),
                                None => cases.push(SwitchEdge {
                                    keys: vec![key],
                                    target,
                                }),
                            }
                        }
                        blocks[bi].switch = Some(SwitchEdges {
                            cases,
                            default: block_at(default, brk)?,
                        });
                    }
                }
                BlockExit::Return | BlockExit::Throw => {}
            }
        }

        // Catch handler entries
        for tc in &code.try_catch {
            if let Some(&handler) = label_blocks.get(&tc.handler) {
                blocks[handler].is_catch_handler = true;
                blocks[handler].caught_type = tc.exception.clone();
            }
        }

        let mut cfg = CFG {
            blocks,
            label_blocks,
        };
        cfg.compute_targeted_by();
        Ok(cfg)
    }

    /// Rebuild every block's `targeted_by` set from the current edges.
    pub fn compute_targeted_by(&mut self) {
        for block in &mut self.blocks {
            block.targeted_by.clear();
        }
        for bi in 0..self.blocks.len() {
            for succ in self.blocks[bi].successors() {
                self.blocks[succ].targeted_by.insert(bi);
            }
        }
    }

    /// One line per block, for debug logging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for b in &self.blocks {
            let edge = |t: Option<BlockId>| t.map_or("-".to_string(), |t| t.to_string());
            out.push_str(&format!(
                "block {} @{} body {:?} {:?} target {} else {}",
                b.id,
                b.break_point,
                b.body,
                b.exit,
                edge(b.target),
                edge(b.else_target),
            ));
            if let Some(sw) = &b.switch {
                for case in &sw.cases {
                    out.push_str(&format!(" case {:?}->{}", case.keys, case.target));
                }
                out.push_str(&format!(" default->{}", sw.default));
            }
            out.push('\n');
        }
        out
    }
}
