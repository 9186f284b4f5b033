mod common;

use bcd_ir::instruction::{Insn, Label};
use bcd_ir::stmt::Stmt;
use common::*;

fn lookup(pairs: &[(i32, u32)], default: u32) -> Insn {
    Insn::LookupSwitch {
        default: Label(default),
        pairs: pairs.iter().map(|&(k, l)| (k, Label(l))).collect(),
    }
}

#[test]
fn keys_sharing_targets_without_default() {
    let stmts = decompile(vec![
        iload(1),
        lookup(&[(1, 1), (2, 1), (3, 2), (4, 2)], 3),
        label(1),
        call("x"),
        goto(3),
        label(2),
        call("y"),
        goto(3),
        label(3),
        vreturn(),
    ]);
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        Stmt::Switch {
            selector,
            enum_type,
            cases,
        } => {
            assert_eq!(selector.to_string(), "local1");
            assert!(enum_type.is_none());
            assert_eq!(cases.len(), 2);
            assert_eq!(cases[0].keys, [1, 2]);
            assert_eq!(invoked_all(&cases[0].body), ["C.x()"]);
            assert!(cases[0].breaks);
            assert_eq!(cases[1].keys, [3, 4]);
            assert_eq!(invoked_all(&cases[1].body), ["C.y()"]);
            assert!(cases.iter().all(|c| !c.is_default));
        }
        other => panic!("expected switch, got {other:?}"),
    }
    assert_eq!(stmts[1], Stmt::Return(None));
}

#[test]
fn table_switch_with_default() {
    let stmts = decompile(vec![
        iload(1),
        Insn::TableSwitch {
            min: 0,
            max: 1,
            default: Label(3),
            targets: vec![Label(1), Label(2)],
        },
        label(1),
        call("zero"),
        goto(4),
        label(2),
        call("one"),
        goto(4),
        label(3),
        call("other"),
        label(4),
        vreturn(),
    ]);
    match &stmts[0] {
        Stmt::Switch { cases, .. } => {
            assert_eq!(cases.len(), 3);
            assert_eq!(cases[0].keys, [0]);
            assert_eq!(cases[1].keys, [1]);
            assert!(cases[2].is_default);
            assert_eq!(invoked_all(&cases[2].body), ["C.other()"]);
            assert!(!cases[2].breaks);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn fallthrough_case() {
    // case 1: x(); case 2: y(); break;
    let stmts = decompile(vec![
        iload(1),
        lookup(&[(1, 1), (2, 2)], 3),
        label(1),
        call("x"),
        label(2),
        call("y"),
        goto(3),
        label(3),
        vreturn(),
    ]);
    match &stmts[0] {
        Stmt::Switch { cases, .. } => {
            assert_eq!(cases.len(), 2);
            assert_eq!(invoked_all(&cases[0].body), ["C.x()"]);
            assert!(!cases[0].breaks);
            assert_eq!(invoked_all(&cases[1].body), ["C.y()"]);
            assert!(cases[1].breaks);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}
