mod common;

use std::rc::Rc;

use bcd_decompiler::patterns::enum_switch_selector;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::{FieldRef, Insn, InvokeKind, Label, MethodRef, ValueKind};
use bcd_ir::locals::LocalInstance;
use bcd_ir::stmt::Stmt;
use common::*;

fn color_value() -> Rc<Expr> {
    Rc::new(Expr::Local(LocalInstance {
        slot: 1,
        name: "c".to_string(),
        descriptor: Some("LColor;".to_string()),
    }))
}

fn ordinal_of(value: Rc<Expr>) -> Rc<Expr> {
    Rc::new(Expr::InvokeInstance {
        kind: InvokeKind::Virtual,
        receiver: value,
        method: MethodRef::new("Color", "ordinal", "()I"),
        args: vec![],
    })
}

#[test]
fn switch_map_field_selector() {
    let selector = Expr::ArrayElement {
        array: Rc::new(Expr::StaticField(FieldRef {
            owner: "Main$1".to_string(),
            name: "$SwitchMap$Color".to_string(),
            desc: "[I".to_string(),
        })),
        index: ordinal_of(color_value()),
        kind: ValueKind::Int,
    };
    let (value, owner) = enum_switch_selector(&selector).unwrap();
    assert_eq!(value.to_string(), "c");
    assert_eq!(owner, "Color");
}

#[test]
fn switch_table_method_selector() {
    let selector = Expr::ArrayElement {
        array: Rc::new(Expr::InvokeStatic {
            method: MethodRef::new("Main", "$SWITCH_TABLE$Color", "()[I"),
            args: vec![],
        }),
        index: ordinal_of(color_value()),
        kind: ValueKind::Int,
    };
    assert!(enum_switch_selector(&selector).is_some());
}

#[test]
fn plain_array_is_not_a_selector() {
    let selector = Expr::ArrayElement {
        array: color_value(),
        index: ordinal_of(color_value()),
        kind: ValueKind::Int,
    };
    assert!(enum_switch_selector(&selector).is_none());
}

#[test]
fn enum_switch_end_to_end() {
    let stmts = decompile(vec![
        Insn::GetStatic(FieldRef {
            owner: "Main$1".to_string(),
            name: "$SwitchMap$Color".to_string(),
            desc: "[I".to_string(),
        }),
        aload(1),
        invokevirtual("Color", "ordinal", "()I"),
        Insn::ArrayLoad(ValueKind::Int),
        Insn::LookupSwitch {
            default: Label(2),
            pairs: vec![(1, Label(1))],
        },
        label(1),
        call("red"),
        label(2),
        vreturn(),
    ]);
    match &stmts[0] {
        Stmt::Switch {
            selector,
            enum_type,
            cases,
        } => {
            assert_eq!(selector.to_string(), "local1");
            assert_eq!(enum_type.as_deref(), Some("Color"));
            assert_eq!(cases.len(), 1);
            assert_eq!(invoked_all(&cases[0].body), ["C.red()"]);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}
