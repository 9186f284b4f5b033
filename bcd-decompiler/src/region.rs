//! Region partitioning: carves the physically ordered block list into nested
//! if/while/do-while/switch/try sections.
//!
//! Every region is a contiguous run of the list it was found in. Nested
//! regions inside an if-region are collapsed first: their head block takes
//! the finished section in `internal` and falls through to the region's
//! continuation, and the member blocks leave the list.

use std::collections::HashMap;

use bcd_ir::condition::Condition;
use bcd_ir::instruction::MethodCode;
use bcd_ir::locals::LocalsResolver;

use crate::cfg::{BlockExit, BlockId, CFG};
use crate::condition;
use crate::error::{DecompileError, Result};
use crate::options::DecompilerOptions;

/// A structured piece of a method body, still in terms of blocks.
#[derive(Debug, Clone)]
pub enum Section {
    /// Straight-line code of one block.
    Inline(BlockId),
    If {
        cond: Condition,
        body: Vec<Section>,
        elifs: Vec<ElifSection>,
        else_body: Option<Vec<Section>>,
    },
    While {
        cond: Condition,
        body: Vec<Section>,
    },
    DoWhile {
        cond: Condition,
        body: Vec<Section>,
    },
    Switch {
        /// Block computing the selector and ending in the switch.
        selector: BlockId,
        cases: Vec<CaseSection>,
    },
    TryCatch {
        body: Vec<Section>,
        catches: Vec<CatchSection>,
    },
}

#[derive(Debug, Clone)]
pub struct ElifSection {
    pub cond: Condition,
    pub body: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct CaseSection {
    pub keys: Vec<i32>,
    pub is_default: bool,
    /// The trailing jump to the join point was dropped.
    pub breaks: bool,
    pub body: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct CatchSection {
    pub exception: Option<String>,
    /// Handler entry block; its stack starts with the exception.
    pub handler: BlockId,
    pub body: Vec<Section>,
}

/// Exception ranges sharing one protected block range.
#[derive(Debug)]
struct TryGroup {
    start: BlockId,
    end: BlockId,
    handlers: Vec<(BlockId, Option<String>)>,
}

/// Positions within the current list. `end` is exclusive.
#[derive(Debug)]
struct CaseLayout {
    keys: Vec<i32>,
    is_default: bool,
    start: usize,
    end: usize,
    breaks: bool,
}

#[derive(Debug)]
struct SwitchLayout {
    cases: Vec<CaseLayout>,
    /// Position of the block after the switch, or the list length.
    join: usize,
}

#[derive(Debug)]
struct HandlerLayout {
    handler: BlockId,
    exception: Option<String>,
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct TryLayout {
    group: usize,
    body_end: usize,
    handlers: Vec<HandlerLayout>,
    join: usize,
}

/// Position of `b` in `list`, or the list length when it is outside.
fn pos(list: &[BlockId], b: BlockId) -> usize {
    list.iter().position(|&x| x == b).unwrap_or(list.len())
}

pub struct Partitioner<'a> {
    cfg: &'a mut CFG,
    code: &'a MethodCode,
    locals: &'a dyn LocalsResolver,
    options: &'a DecompilerOptions,
    tries: Vec<TryGroup>,
    used_tries: Vec<bool>,
}

impl<'a> Partitioner<'a> {
    pub fn new(
        cfg: &'a mut CFG,
        code: &'a MethodCode,
        locals: &'a dyn LocalsResolver,
        options: &'a DecompilerOptions,
    ) -> Self {
        let mut groups: HashMap<(BlockId, BlockId), Vec<(BlockId, Option<String>)>> =
            HashMap::new();
        if options.structure_try_catch {
            for tc in &code.try_catch {
                let resolved = (
                    cfg.block_at_label(tc.start),
                    cfg.block_at_label(tc.end),
                    cfg.block_at_label(tc.handler),
                );
                match resolved {
                    (Some(start), Some(end), Some(handler)) if start < end => {
                        groups
                            .entry((start, end))
                            .or_default()
                            .push((handler, tc.exception.clone()));
                    }
                    _ => log::warn!(
                        "ignoring exception range {}..{} -> {}: no matching blocks",
                        tc.start,
                        tc.end,
                        tc.handler
                    ),
                }
            }
        }
        let mut tries: Vec<TryGroup> = groups
            .into_iter()
            .map(|((start, end), handlers)| TryGroup {
                start,
                end,
                handlers,
            })
            .collect();
        tries.sort_by_key(|g| (g.start, g.end));
        let used_tries = vec![false; tries.len()];
        Partitioner {
            cfg,
            code,
            locals,
            options,
            tries,
            used_tries,
        }
    }

    /// Partition the whole method.
    pub fn partition(mut self) -> Result<Vec<Section>> {
        let all: Vec<BlockId> = (0..self.cfg.blocks.len()).collect();
        self.flatten(&all, None)
    }

    fn irreducible(&self, id: BlockId) -> DecompileError {
        DecompileError::IrreducibleControlFlow {
            break_point: self.cfg.blocks[id].break_point,
        }
    }

    fn make_condition(
        &self,
        chain: &[BlockId],
        body: BlockId,
        ret: Option<BlockId>,
    ) -> Result<Condition> {
        condition::make_condition(self.cfg, chain, body, ret, self.code, self.locals, self.options)
    }

    /// Positions in `list` of every edge out of `b`.
    fn edge_positions(&self, list: &[BlockId], b: BlockId) -> Vec<usize> {
        self.cfg.blocks[b]
            .successors()
            .into_iter()
            .map(|t| pos(list, t))
            .collect()
    }

    /// Turn `list` into a sequence of sections. `ret` is the block control
    /// reaches after the last member.
    fn flatten(&mut self, list: &[BlockId], ret: Option<BlockId>) -> Result<Vec<Section>> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < list.len() {
            let id = list[i];
            if let Some(section) = self.cfg.blocks[id].internal.take() {
                out.push(*section);
                i += 1;
                continue;
            }
            if let Some(layout) = self.try_layout(list, i) {
                let next = layout.join;
                out.push(self.build_try(list, i, layout, ret)?);
                i = next;
                continue;
            }
            if self.cfg.blocks[id].is_switch() {
                let layout = self.switch_layout(list, i);
                let next = layout.join;
                out.push(self.build_switch(list, i, layout, ret)?);
                i = next.max(i + 1);
                continue;
            }
            if let Some(last) = self.loop_end(list, i) {
                let cont = list.get(last + 1).copied().or(ret);
                out.push(self.process_region(list[i..=last].to_vec(), cont, true)?);
                i = last + 1;
                continue;
            }
            if self.cfg.blocks[id].is_conditional() || self.is_goto_into_condition(list, i) {
                let end = self
                    .region_end(list, i)
                    .filter(|&end| end > i)
                    .ok_or_else(|| self.irreducible(id))?;
                let cont = list.get(end).copied().or(ret);
                out.push(self.process_region(list[i..end].to_vec(), cont, false)?);
                i = end;
                continue;
            }
            out.push(Section::Inline(id));
            i += 1;
        }
        Ok(out)
    }

    /// Position of the last list member jumping back to `list[i]`, if
    /// `list[i]` heads a loop.
    fn loop_end(&self, list: &[BlockId], i: usize) -> Option<usize> {
        let head = &self.cfg.blocks[list[i]];
        if head.is_goto() || head.targeted_by.iter().all(|&src| src <= head.id) {
            return None;
        }
        // targeted_by predates collapsing, so confirm against live edges
        (i + 1..list.len())
            .rev()
            .find(|&j| self.cfg.blocks[list[j]].successors().contains(&head.id))
    }

    /// A forward jump to a conditional later in the list: the entry jump of
    /// a loop laid out with its test at the bottom.
    fn is_goto_into_condition(&self, list: &[BlockId], i: usize) -> bool {
        let block = &self.cfg.blocks[list[i]];
        let Some(target) = block.target else {
            return false;
        };
        if !block.is_goto() {
            return false;
        }
        let p = pos(list, target);
        p > i && p < list.len() && self.cfg.blocks[target].is_conditional()
    }

    /// End (exclusive position) of the region headed by `list[start]`, or
    /// `None` if the head has no single-entry region.
    fn region_end(&self, list: &[BlockId], start: usize) -> Option<usize> {
        let head = &self.cfg.blocks[list[start]];
        let target = head.target?;
        if target <= head.id {
            return None;
        }
        let len = list.len();
        let mut end = pos(list, target);
        if let Some(other) = head.else_target {
            end = end.max(pos(list, other));
        }
        let is_goto = head.is_goto();
        let into = |p: usize, end: usize| p > start && p < end;

        let mut extension = 0;
        'grow: loop {
            // nothing before the head may enter the region
            for &b in &list[..start] {
                if self.edge_positions(list, b).into_iter().any(|p| into(p, end)) {
                    return None;
                }
            }
            // members leaving past the end stretch the region
            for o in start + 1..end.min(len) {
                if let Some(far) = self.edge_positions(list, list[o]).into_iter().max() {
                    if far > end {
                        end = far;
                        continue 'grow;
                    }
                }
            }
            // bottom-tested loop: trailing tests jumping back inside belong to it
            if is_goto {
                let mut probe = extension;
                while let Some(&b) = list.get(end + probe) {
                    let block = &self.cfg.blocks[b];
                    if !block.is_conditional() {
                        break;
                    }
                    probe += 1;
                    let back_in = block
                        .successors()
                        .into_iter()
                        .filter_map(|t| list.iter().position(|&x| x == t))
                        .any(|p| into(p, end));
                    if back_in {
                        extension = probe;
                    }
                }
            }
            // nothing after the region may enter it
            for &b in list.iter().skip(end + extension) {
                if self.edge_positions(list, b).into_iter().any(|p| into(p, end)) {
                    return None;
                }
            }
            break;
        }
        if end > len {
            return None;
        }
        Some(end + extension)
    }

    fn process_region(
        &mut self,
        mut region: Vec<BlockId>,
        ret: Option<BlockId>,
        is_loop: bool,
    ) -> Result<Section> {
        log::trace!("region {region:?} ret {ret:?} loop {is_loop}");
        let first = region[0];
        if is_loop {
            let last = region.len() - 1;
            let tail = &self.cfg.blocks[region[last]];
            if tail.is_goto() && tail.target == Some(first) {
                self.retarget_continues(first, &region[1..last], region[last]);
                if self.cfg.blocks[first].is_conditional() {
                    if let Some(section) = self.top_tested_loop(&region, ret)? {
                        return Ok(section);
                    }
                }
                let body = self.flatten(&region[..last], Some(region[last]))?;
                return Ok(Section::While {
                    cond: Condition::Const(true),
                    body,
                });
            }
            return self.bottom_tested_loop(&region, ret);
        }
        if self.cfg.blocks[first].is_goto() {
            return self.goto_entered_loop(&region, ret);
        }
        self.collapse_nested(&mut region)?;
        self.if_region(&region, ret)
    }

    /// Whether every edge of `b` stays in `chain`, goes to `body`, or leaves
    /// `region`.
    fn chain_edges_ok(
        &self,
        b: BlockId,
        chain: &[BlockId],
        body: BlockId,
        region: &[BlockId],
    ) -> bool {
        self.cfg.blocks[b]
            .successors()
            .into_iter()
            .all(|t| t == body || chain.contains(&t) || !region.contains(&t))
    }

    /// Point body jumps to the loop head at the back-edge block, so they read
    /// as jumps to the end of the body.
    fn retarget_continues(&mut self, head: BlockId, body: &[BlockId], back_edge: BlockId) {
        for &b in body {
            let block = &mut self.cfg.blocks[b];
            if !block.successors().contains(&head) {
                continue;
            }
            block.map_edges(|t| if t == head { back_edge } else { t });
            log::trace!("block {b} continues loop at block {head}");
            self.cfg.blocks[head].targeted_by.remove(&b);
            self.cfg.blocks[back_edge].targeted_by.insert(b);
        }
    }

    /// `while (cond) body` with the test at the top and a jump back at the
    /// bottom. `None` when the head's edges do not form a loop test, as in
    /// `while (true) { if (a) return; ... }`.
    fn top_tested_loop(
        &mut self,
        region: &[BlockId],
        ret: Option<BlockId>,
    ) -> Result<Option<Section>> {
        let last = region.len() - 1;
        let mut k = 0;
        while k < last && self.cfg.blocks[region[k]].is_conditional() {
            k += 1;
        }
        while k > 0
            && !region[..k]
                .iter()
                .all(|&b| self.chain_edges_ok(b, &region[..k], region[k], region))
        {
            k -= 1;
        }
        if k == 0 {
            log::trace!("loop at block {} has no test at its head", region[0]);
            return Ok(None);
        }
        let cond = self.make_condition(&region[..k], region[k], ret)?;
        let body = self.flatten(&region[k..last], Some(region[last]))?;
        Ok(Some(Section::While { cond, body }))
    }

    /// `do body while (cond)` with the test run at the bottom.
    fn bottom_tested_loop(&mut self, region: &[BlockId], ret: Option<BlockId>) -> Result<Section> {
        let first = region[0];
        let mut cond_start = region.len();
        while cond_start > 0 {
            let b = region[cond_start - 1];
            if !self.cfg.blocks[b].is_conditional()
                || !self.chain_edges_ok(b, &region[cond_start - 1..], first, region)
            {
                break;
            }
            cond_start -= 1;
        }
        if cond_start == region.len() {
            return Err(self.irreducible(region[region.len() - 1]));
        }
        let chain = &region[cond_start..];
        let cond = self.make_condition(chain, first, ret)?;
        let body = self.flatten(&region[..cond_start], Some(chain[0]))?;
        Ok(Section::DoWhile { cond, body })
    }

    /// Loop entered by a jump to its test run at the bottom.
    fn goto_entered_loop(&mut self, region: &[BlockId], ret: Option<BlockId>) -> Result<Section> {
        let head = region[0];
        let t = self.cfg.blocks[head]
            .target
            .map(|target| pos(region, target))
            .filter(|&t| t > 0 && t < region.len())
            .ok_or_else(|| self.irreducible(head))?;
        let mut end = t;
        while end < region.len() && self.cfg.blocks[region[end]].is_conditional() {
            end += 1;
        }
        if end != region.len() {
            return Err(self.irreducible(region[end]));
        }
        let chain = &region[t..];
        let cond = self.make_condition(chain, region[1], ret)?;
        let body = self.flatten(&region[1..t], Some(chain[0]))?;
        Ok(Section::While { cond, body })
    }

    /// Collapse every nested region that ends before the end of `region`,
    /// skipping the head.
    fn collapse_nested(&mut self, region: &mut Vec<BlockId>) -> Result<()> {
        let mut i = 1;
        while i < region.len() {
            let id = region[i];
            if self.cfg.blocks[id].internal.is_some() {
                i += 1;
                continue;
            }
            let len = region.len();
            let mut nested = None;
            if let Some(layout) = self.try_layout(region, i) {
                if layout.join < len {
                    let join = layout.join;
                    let section = self.build_try(region, i, layout, Some(region[join]))?;
                    nested = Some((join, section));
                }
            } else if self.cfg.blocks[id].is_switch() {
                let layout = self.switch_layout(region, i);
                if layout.join < len {
                    let join = layout.join;
                    let section = self.build_switch(region, i, layout, Some(region[join]))?;
                    nested = Some((join, section));
                }
            } else if let Some(last) = self.loop_end(region, i) {
                if last + 1 < len {
                    let members = region[i..=last].to_vec();
                    let section = self.process_region(members, Some(region[last + 1]), true)?;
                    nested = Some((last + 1, section));
                }
            } else if self.cfg.blocks[id].is_conditional() || self.is_goto_into_condition(region, i)
            {
                let end = self
                    .region_end(region, i)
                    .filter(|&end| end > i && end < len);
                if let Some(end) = end {
                    let members = region[i..end].to_vec();
                    let section = self.process_region(members, Some(region[end]), false)?;
                    nested = Some((end, section));
                }
            }
            if let Some((end, section)) = nested {
                self.collapse(region, i, end, section);
            }
            i += 1;
        }
        Ok(())
    }

    fn collapse(&mut self, region: &mut Vec<BlockId>, i: usize, end: usize, section: Section) {
        let cont = region.get(end).copied();
        let block = &mut self.cfg.blocks[region[i]];
        log::trace!("collapsing blocks {:?} into block {}", &region[i..end], block.id);
        block.internal = Some(Box::new(section));
        block.target = cont;
        block.else_target = None;
        block.switch = None;
        block.exit = BlockExit::Fallthrough;
        region.drain(i + 1..end);
    }

    /// Run of conditionals starting at `start`, the block its body starts
    /// at, and where its false edge leads. The run stops before a
    /// conditional that branches anywhere else, which opens the body.
    fn condition_run(
        &self,
        region: &[BlockId],
        start: usize,
        ret: Option<BlockId>,
    ) -> Result<(usize, BlockId, Option<BlockId>)> {
        let mut k = start + 1;
        while k < region.len() && self.cfg.blocks[region[k]].is_conditional() {
            k += 1;
        }
        loop {
            let chain = &region[start..k];
            let body_head = region
                .get(k)
                .copied()
                .or(ret)
                .ok_or_else(|| self.irreducible(region[start]))?;
            let exit = chain
                .iter()
                .filter_map(|&c| self.cfg.blocks[c].target)
                .find(|t| *t != body_head && !chain.contains(t))
                .or(ret);
            let closed = chain.iter().all(|&c| {
                self.cfg.blocks[c]
                    .successors()
                    .into_iter()
                    .all(|t| t == body_head || Some(t) == exit || chain.contains(&t))
            });
            if closed || k == start + 1 {
                return Ok((k, body_head, exit));
            }
            k -= 1;
        }
    }

    /// Position of the else part starting at `exit`, or the region length
    /// when `exit` is the continuation.
    fn else_position(
        &self,
        region: &[BlockId],
        body_start: usize,
        exit: Option<BlockId>,
        ret: Option<BlockId>,
    ) -> Result<usize> {
        if exit == ret {
            return Ok(region.len());
        }
        let p = exit.map_or(region.len(), |e| pos(region, e));
        if p < body_start || p >= region.len() {
            return Err(DecompileError::ConditionEdgeEscapes {
                break_point: self.cfg.blocks[region[body_start - 1]].break_point,
            });
        }
        Ok(p)
    }

    /// if / else-if / else.
    fn if_region(&mut self, region: &[BlockId], ret: Option<BlockId>) -> Result<Section> {
        let (k, body_head, exit) = self.condition_run(region, 0, ret)?;
        let cond = self.make_condition(&region[..k], body_head, exit)?;
        let else_start = self.else_position(region, k, exit, ret)?;
        let body = self.flatten(&region[k..else_start], ret)?;

        let mut elifs = Vec::new();
        let mut else_body = None;
        let mut start = else_start;
        while start < region.len() {
            if !self.cfg.blocks[region[start]].is_conditional() {
                else_body = Some(self.flatten(&region[start..], ret)?);
                break;
            }
            let (k, body_head, exit) = self.condition_run(region, start, ret)?;
            let cond = self.make_condition(&region[start..k], body_head, exit)?;
            let next = self.else_position(region, k, exit, ret)?;
            let body = self.flatten(&region[k..next], ret)?;
            elifs.push(ElifSection { cond, body });
            start = next;
        }
        Ok(Section::If {
            cond,
            body,
            elifs,
            else_body,
        })
    }

    fn switch_layout(&self, list: &[BlockId], i: usize) -> SwitchLayout {
        let len = list.len();
        let Some(sw) = &self.cfg.blocks[list[i]].switch else {
            return SwitchLayout {
                cases: Vec::new(),
                join: i + 1,
            };
        };

        // (position, keys, is_default)
        let mut entries: Vec<(usize, Vec<i32>, bool)> = sw
            .cases
            .iter()
            .map(|c| (pos(list, c.target), c.keys.clone(), false))
            .collect();
        match entries.iter_mut().find(|e| list.get(e.0) == Some(&sw.default)) {
            Some(entry) => entry.2 = true,
            None => entries.push((pos(list, sw.default), Vec::new(), true)),
        }
        entries.sort_by_key(|e| e.0);
        let last_entry = entries.last().map_or(i + 1, |e| e.0);

        // the join is the furthest forward target of a case's trailing jump
        let mut join: Option<usize> = None;
        for w in entries.windows(2) {
            let (from, to) = (w[0].0, w[1].0);
            if to == 0 || to - 1 < from || from >= len {
                continue;
            }
            let tail = &self.cfg.blocks[list[to - 1]];
            if let (true, Some(t)) = (tail.is_goto(), tail.target) {
                let p = pos(list, t);
                if p >= last_entry {
                    join = Some(join.map_or(p, |j| j.max(p)));
                }
            }
        }
        let join = join.unwrap_or_else(|| match entries.last() {
            // switch without a default: the default edge is the join
            Some((p, keys, true)) if keys.is_empty() => *p,
            _ => len,
        });

        let mut cases = Vec::new();
        for (n, (start, keys, is_default)) in entries.iter().enumerate() {
            let (start, is_default) = (*start, *is_default);
            if start >= join {
                if is_default && keys.is_empty() {
                    continue;
                }
                // keys jumping straight past the switch
                cases.push(CaseLayout {
                    keys: keys.clone(),
                    is_default,
                    start: join,
                    end: join,
                    breaks: true,
                });
                continue;
            }
            let mut end = entries.get(n + 1).map_or(join, |e| e.0.min(join));
            let mut breaks = false;
            if end > start {
                let tail = &self.cfg.blocks[list[end - 1]];
                if tail.is_goto() && tail.target.map(|t| pos(list, t)) == Some(join) {
                    end -= 1;
                    breaks = true;
                }
            }
            cases.push(CaseLayout {
                keys: keys.clone(),
                is_default,
                start,
                end,
                breaks,
            });
        }
        SwitchLayout { cases, join }
    }

    fn build_switch(
        &mut self,
        list: &[BlockId],
        i: usize,
        layout: SwitchLayout,
        ret: Option<BlockId>,
    ) -> Result<Section> {
        let after = list.get(layout.join).copied().or(ret);
        let mut cases = Vec::with_capacity(layout.cases.len());
        for case in layout.cases {
            let body = if case.start < case.end {
                self.flatten(&list[case.start..case.end], after)?
            } else {
                Vec::new()
            };
            cases.push(CaseSection {
                keys: case.keys,
                is_default: case.is_default,
                breaks: case.breaks,
                body,
            });
        }
        Ok(Section::Switch {
            selector: list[i],
            cases,
        })
    }

    /// Layout of the outermost unprocessed try range starting at `list[i]`.
    fn try_layout(&mut self, list: &[BlockId], i: usize) -> Option<TryLayout> {
        let id = list[i];
        let len = list.len();
        let group = (0..self.tries.len())
            .filter(|&g| !self.used_tries[g] && self.tries[g].start == id)
            .filter(|&g| pos(list, self.tries[g].end) < len)
            .max_by_key(|&g| self.tries[g].end)?;
        let end = pos(list, self.tries[group].end);

        let mut handlers = Vec::new();
        for (handler, exception) in &self.tries[group].handlers {
            let p = pos(list, *handler);
            if p < end || p >= len {
                log::warn!(
                    "handler block {handler} is not laid out after its try range, \
                     leaving it unstructured"
                );
                self.used_tries[group] = true;
                return None;
            }
            handlers.push(HandlerLayout {
                handler: *handler,
                exception: exception.clone(),
                start: p,
                end: len,
            });
        }
        handlers.sort_by_key(|h| h.start);

        let goto_target = |p: usize| {
            let b = &self.cfg.blocks[list[p]];
            if b.is_goto() { b.target } else { None }
        };
        let past = |t: Option<BlockId>, p: usize| t.filter(|&t| pos(list, t) > p);
        let before_end = past(goto_target(end - 1), end);
        let at_end = past(goto_target(end), end);
        let (body_end, join_block) = match (before_end, at_end) {
            (Some(t), _) => (end - 1, Some(t)),
            (_, Some(t)) => (end, Some(t)),
            _ => (end, None),
        };
        let join = join_block.map_or(len, |b| pos(list, b));
        let Some(first_handler) = handlers.first().map(|h| h.start) else {
            self.used_tries[group] = true;
            return None;
        };
        let last_handler = handlers.last().map_or(first_handler, |h| h.start);
        if join <= last_handler || first_handler < body_end {
            log::warn!("try range at block {id} has no recognizable join, leaving it unstructured");
            self.used_tries[group] = true;
            return None;
        }

        let starts: Vec<usize> = handlers.iter().map(|h| h.start).collect();
        for (n, h) in handlers.iter_mut().enumerate() {
            h.end = starts.get(n + 1).copied().unwrap_or(join);
            if h.end > h.start && goto_target(h.end - 1).is_some_and(|t| Some(t) == join_block) {
                h.end -= 1;
            }
        }
        Some(TryLayout {
            group,
            body_end,
            handlers,
            join,
        })
    }

    fn build_try(
        &mut self,
        list: &[BlockId],
        i: usize,
        layout: TryLayout,
        ret: Option<BlockId>,
    ) -> Result<Section> {
        self.used_tries[layout.group] = true;
        let after = list.get(layout.join).copied().or(ret);
        let body = self.flatten(&list[i..layout.body_end], after)?;
        let mut catches = Vec::with_capacity(layout.handlers.len());
        for h in layout.handlers {
            let body = self.flatten(&list[h.start..h.end], after)?;
            catches.push(CatchSection {
                exception: h.exception,
                handler: h.handler,
                body,
            });
        }
        Ok(Section::TryCatch { body, catches })
    }
}
