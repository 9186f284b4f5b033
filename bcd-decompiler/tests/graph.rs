mod common;

use bcd_decompiler::cfg::{BlockExit, CFG};
use bcd_decompiler::simplify::simplify;
use bcd_decompiler::DecompileError;
use bcd_ir::instruction::Label;
use common::*;

fn if_else() -> bcd_ir::instruction::MethodCode {
    code(vec![
        call("setup"),
        check("a"),
        ifeq(1),
        call("x"),
        goto(2),
        label(1),
        call("y"),
        label(2),
        vreturn(),
    ])
}

#[test]
fn blocks_end_at_break_points() {
    init_logger();
    let code = if_else();
    let cfg = CFG::build(&code).unwrap();
    let exits: Vec<BlockExit> = cfg.blocks.iter().map(|b| b.exit).collect();
    assert_eq!(
        exits,
        [
            BlockExit::Branch,
            BlockExit::Goto,
            BlockExit::Fallthrough,
            BlockExit::Fallthrough,
            BlockExit::Return,
        ]
    );
    let branch = &cfg.blocks[0];
    assert_eq!(branch.break_point, 2);
    assert_eq!(branch.target, cfg.block_at_label(Label(1)));
    assert_eq!(branch.else_target, Some(1));
    assert!(cfg.blocks[4].targeted_by.contains(&1));
}

#[test]
fn simplify_drops_labels_and_splits_headers() {
    init_logger();
    let code = if_else();
    let mut cfg = CFG::build(&code).unwrap();
    simplify(&mut cfg, &code).unwrap();

    // setup | a ifeq | x | goto | y | return
    assert_eq!(cfg.blocks.len(), 6);
    let header = &cfg.blocks[0];
    assert_eq!(header.exit, BlockExit::Fallthrough);
    assert_eq!(header.body, 0..1);
    assert_eq!(header.target, Some(1));
    assert_eq!(cfg.blocks[1].body, 1..2);
    assert_eq!(cfg.blocks[1].target, Some(4));
    assert!(cfg.blocks[3].is_goto());
    assert!(cfg.blocks[3].body.is_empty());
    for (i, b) in cfg.blocks.iter().enumerate() {
        assert_eq!(b.id, i);
    }
}

#[test]
fn simplify_is_idempotent() {
    init_logger();
    let code = if_else();
    let mut cfg = CFG::build(&code).unwrap();
    simplify(&mut cfg, &code).unwrap();
    let once = cfg.dump();
    simplify(&mut cfg, &code).unwrap();
    assert_eq!(cfg.dump(), once);
}

#[test]
fn jump_to_missing_label_fails() {
    let code = code(vec![goto(9), vreturn()]);
    let err = CFG::build(&code).unwrap_err();
    assert!(
        matches!(err, DecompileError::UnresolvedLabel { label: 9, index: 0 }),
        "got {err}"
    );
}
