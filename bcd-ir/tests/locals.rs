use bcd_ir::IrError;
use bcd_ir::instruction::{Insn, Label, MethodCode};
use bcd_ir::locals::{LocalVariable, Locals, LocalsResolver};

fn method() -> MethodCode {
    MethodCode::new(
        vec![
            Insn::Nop,
            Insn::Label(Label(0)),
            Insn::Nop,
            Insn::Label(Label(1)),
            Insn::Nop,
            Insn::Label(Label(2)),
        ],
        vec![],
    )
    .unwrap()
}

fn var(slot: u16, name: &str, start: u32, end: u32) -> LocalVariable {
    LocalVariable {
        slot,
        name: name.to_string(),
        descriptor: "I".to_string(),
        start: Label(start),
        end: Label(end),
    }
}

#[test]
fn store_before_range_start_resolves() {
    let code = method();
    let locals = Locals::new(&[var(1, "count", 0, 2)], &code).unwrap();
    assert_eq!(locals.resolve(1, 0).name, "count");
    assert_eq!(locals.resolve(1, 2).name, "count");
}

#[test]
fn slot_reuse_picks_latest_range() {
    let code = method();
    let locals = Locals::new(&[var(1, "first", 0, 1), var(1, "second", 1, 2)], &code).unwrap();
    assert_eq!(locals.resolve(1, 0).name, "first");
    assert_eq!(locals.resolve(1, 4).name, "second");
}

#[test]
fn uncovered_slot_is_unnamed() {
    let code = method();
    let locals = Locals::new(&[var(1, "count", 0, 1)], &code).unwrap();
    let l = locals.resolve(1, 4);
    assert_eq!(l.name, "local1");
    assert!(l.descriptor.is_none());
    assert_eq!(locals.resolve(2, 2).name, "local2");
}

#[test]
fn unknown_label_is_an_error() {
    let code = method();
    let err = Locals::new(&[var(1, "x", 0, 7)], &code).unwrap_err();
    assert_eq!(
        err,
        IrError::UnknownLocalLabel {
            name: "x".to_string(),
            label: 7
        }
    );
}

#[test]
fn duplicate_label_is_rejected() {
    let err = MethodCode::new(vec![Insn::Label(Label(3)), Insn::Label(Label(3))], vec![])
        .unwrap_err();
    assert_eq!(err, IrError::DuplicateLabel(3));
}
