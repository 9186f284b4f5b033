use std::rc::Rc;

use bcd_ir::condition::Condition;
use bcd_ir::expr::Expr;
use bcd_ir::instruction::CmpOp;
use bcd_ir::locals::LocalInstance;

fn local(name: &str, desc: &str) -> Rc<Expr> {
    Rc::new(Expr::Local(LocalInstance {
        slot: 1,
        name: name.to_string(),
        descriptor: Some(desc.to_string()),
    }))
}

fn flag(name: &str) -> Condition {
    Condition::Bool {
        value: local(name, "Z"),
        negated: false,
    }
}

#[test]
fn inverse_flips_comparison_operator() {
    let c = Condition::Compare {
        lhs: local("i", "I"),
        op: CmpOp::Lt,
        rhs: Rc::new(Expr::Int(10)),
    };
    assert_eq!(c.inverse().to_string(), "i >= 10");
    assert_eq!(c.inverse().inverse(), c);
}

#[test]
fn inverse_applies_de_morgan() {
    let c = Condition::And(vec![flag("a"), flag("b")]);
    assert_eq!(c.inverse().to_string(), "!a || !b");
}

#[test]
fn or_inside_and_is_parenthesized() {
    let c = Condition::And(vec![Condition::Or(vec![flag("a"), flag("b")]), flag("c")]);
    assert_eq!(c.to_string(), "(a || b) && c");
}

#[test]
fn null_comparison_renders() {
    let c = Condition::Compare {
        lhs: local("s", "Ljava/lang/String;"),
        op: CmpOp::Ne,
        rhs: Rc::new(Expr::Null),
    };
    assert_eq!(c.to_string(), "s != null");
    assert_eq!(c.inverse().to_string(), "s == null");
}
