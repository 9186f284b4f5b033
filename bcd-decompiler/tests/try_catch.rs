mod common;

use bcd_decompiler::{DecompilerOptions, decompile_method, decompile_method_with};
use bcd_ir::instruction::{Label, MethodCode, TryCatchBlock};
use bcd_ir::locals::Locals;
use bcd_ir::stmt::Stmt;
use common::*;

fn guarded_call() -> MethodCode {
    // try { x(); } catch (Exception e) { y(); }
    let insns = vec![
        label(0),
        call("x"),
        label(1),
        goto(3),
        label(2),
        astore(1),
        call("y"),
        label(3),
        vreturn(),
    ];
    let ranges = vec![TryCatchBlock {
        start: Label(0),
        end: Label(1),
        handler: Label(2),
        exception: Some("java/lang/Exception".to_string()),
    }];
    MethodCode::new(insns, ranges).unwrap()
}

#[test]
fn single_catch_binds_exception() {
    init_logger();
    let stmts = decompile_method(&guarded_call(), &Locals::default()).unwrap();
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        Stmt::TryCatch { body, catches } => {
            assert_eq!(invoked_all(body), ["C.x()"]);
            assert_eq!(catches.len(), 1);
            let clause = &catches[0];
            assert_eq!(clause.exception.as_deref(), Some("java/lang/Exception"));
            assert_eq!(clause.binding.as_ref().map(|l| l.slot), Some(1));
            assert_eq!(invoked_all(&clause.body), ["C.y()"]);
        }
        other => panic!("expected try/catch, got {other:?}"),
    }
    assert_eq!(stmts[1], Stmt::Return(None));
}

#[test]
fn unstructured_when_disabled() {
    init_logger();
    let options = DecompilerOptions {
        structure_try_catch: false,
        ..Default::default()
    };
    let stmts = decompile_method_with(&guarded_call(), &Locals::default(), &options).unwrap();
    assert!(stmts.iter().all(|s| !matches!(s, Stmt::TryCatch { .. })));
    assert_eq!(invoked(&stmts[0]), "C.x()");
}

#[test]
fn catch_clauses_share_one_try() {
    // try { x(); } catch (A e) { y(); } catch (B e) { z(); }
    let insns = vec![
        label(0),
        call("x"),
        label(1),
        goto(4),
        label(2),
        astore(1),
        call("y"),
        goto(4),
        label(3),
        astore(1),
        call("z"),
        label(4),
        vreturn(),
    ];
    let ranges = ["A", "B"]
        .iter()
        .zip([2, 3])
        .map(|(exception, handler)| TryCatchBlock {
            start: Label(0),
            end: Label(1),
            handler: Label(handler),
            exception: Some(exception.to_string()),
        })
        .collect();
    init_logger();
    let code = MethodCode::new(insns, ranges).unwrap();
    let stmts = decompile_method(&code, &Locals::default()).unwrap();
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        Stmt::TryCatch { body, catches } => {
            assert_eq!(invoked_all(body), ["C.x()"]);
            assert_eq!(catches.len(), 2);
            assert_eq!(catches[0].exception.as_deref(), Some("A"));
            assert_eq!(invoked_all(&catches[0].body), ["C.y()"]);
            assert_eq!(catches[1].exception.as_deref(), Some("B"));
            assert_eq!(invoked_all(&catches[1].body), ["C.z()"]);
            assert!(catches.iter().all(|c| c.binding.as_ref().map(|l| l.slot) == Some(1)));
        }
        other => panic!("expected try/catch, got {other:?}"),
    }
    assert_eq!(stmts[1], Stmt::Return(None));
}
