//! Graph cleanup between block building and region partitioning.
//!
//! Label-only blocks are dropped, and blocks ending in a jump or switch get
//! their leading statements split off into a separate block so the block
//! itself only evaluates the jump's operands. Re-running on the output
//! changes nothing.

use std::ops::Range;

use bcd_ir::instruction::MethodCode;

use crate::cfg::{BasicBlock, BlockExit, BlockId, CFG};
use crate::error::Result;

pub fn simplify(cfg: &mut CFG, code: &MethodCode) -> Result<()> {
    let mut removed = remove_empty_blocks(cfg, code);
    split_headers(cfg, code, &mut removed)?;
    compact(cfg, &removed);
    cfg.compute_targeted_by();
    Ok(())
}

fn has_logic(code: &MethodCode, range: Range<usize>) -> bool {
    code.instructions[range].iter().any(|insn| !insn.is_pseudo())
}

fn is_removable(block: &BasicBlock, code: &MethodCode) -> bool {
    block.exit == BlockExit::Fallthrough
        && block.target.is_some()
        && !block.is_catch_handler
        && !has_logic(code, block.body.clone())
}

/// Drop blocks with nothing but pseudo-instructions that just fall into the
/// next block. Returns the removal mask, indexed by block id.
fn remove_empty_blocks(cfg: &mut CFG, code: &MethodCode) -> Vec<bool> {
    let redirect: Vec<Option<BlockId>> = cfg
        .blocks
        .iter()
        .map(|b| if is_removable(b, code) { b.target } else { None })
        .collect();
    let resolve = |mut id: BlockId| {
        // Fallthrough edges only point forward, so this terminates
        while let Some(next) = redirect[id] {
            id = next;
        }
        id
    };

    for block in &mut cfg.blocks {
        block.map_edges(resolve);
    }
    for target in cfg.label_blocks.values_mut() {
        *target = resolve(*target);
    }
    redirect.iter().map(Option::is_some).collect()
}

/// First instruction of the suffix of `block` that computes the operands of
/// its terminal jump or switch. `None` when the operands can't be isolated.
fn operand_start(block: &BasicBlock, code: &MethodCode) -> Result<Option<usize>> {
    let (mut need, _) = code.instructions[block.break_point].stack_effect()?;
    for idx in block.body.clone().rev() {
        let insn = &code.instructions[idx];
        if insn.is_pseudo() {
            continue;
        }
        let (pops, pushes) = insn.stack_effect()?;
        if pushes == 0 || pushes > need {
            return Ok(None);
        }
        need = need - pushes + pops;
        if need == 0 {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

fn split_headers(cfg: &mut CFG, code: &MethodCode, removed: &mut Vec<bool>) -> Result<()> {
    for id in 0..cfg.blocks.len() {
        if removed[id] {
            continue;
        }
        let block = &cfg.blocks[id];
        let split_at = match block.exit {
            BlockExit::Goto => Some(block.body.end),
            BlockExit::Branch | BlockExit::Switch => operand_start(block, code)?,
            _ => None,
        };
        let Some(k) = split_at else {
            continue;
        };
        if !has_logic(code, block.body.start..k) {
            continue;
        }

        let header_id = cfg.blocks.len();
        log::trace!("splitting block {id} at instruction {k} into header {header_id}");
        let retarget = |t: BlockId| if t == id { header_id } else { t };
        for other in &mut cfg.blocks {
            other.map_edges(retarget);
        }
        for target in cfg.label_blocks.values_mut() {
            *target = retarget(*target);
        }

        let block = &mut cfg.blocks[id];
        let header = BasicBlock {
            id: header_id,
            break_point: k,
            body: block.body.start..k,
            exit: BlockExit::Fallthrough,
            target: Some(id),
            else_target: None,
            switch: None,
            targeted_by: Default::default(),
            is_catch_handler: block.is_catch_handler,
            caught_type: block.caught_type.take(),
            internal: None,
        };
        block.body.start = k;
        block.is_catch_handler = false;
        cfg.blocks.push(header);
        removed.push(false);
    }
    Ok(())
}

/// Drop removed blocks and renumber the rest in physical order.
fn compact(cfg: &mut CFG, removed: &[bool]) {
    let mut live: Vec<BasicBlock> = std::mem::take(&mut cfg.blocks)
        .into_iter()
        .filter(|b| !removed[b.id])
        .collect();
    live.sort_by_key(|b| (b.body.start, b.break_point));

    let mut new_id = vec![usize::MAX; removed.len()];
    for (i, b) in live.iter().enumerate() {
        new_id[b.id] = i;
    }
    for (i, b) in live.iter_mut().enumerate() {
        b.id = i;
        b.map_edges(|t| new_id[t]);
    }
    for target in cfg.label_blocks.values_mut() {
        *target = new_id[*target];
    }
    cfg.blocks = live;
}
