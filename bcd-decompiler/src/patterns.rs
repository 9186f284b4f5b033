//! Compiler-generated idioms folded back into source-level forms.

use std::rc::Rc;

use bcd_ir::expr::Expr;

const STRING_DESC: &str = "Ljava/lang/String;";

fn is_builder(class: &str) -> bool {
    matches!(class, "java/lang/StringBuilder" | "java/lang/StringBuffer")
}

/// `String.valueOf(s)` seeding a builder when `s` already is a string.
fn unwrap_value_of(init: &Rc<Expr>) -> Rc<Expr> {
    if let Expr::InvokeStatic { method, args } = &**init {
        if method.owner == "java/lang/String" && method.name == "valueOf" && args.len() == 1 {
            let arg = &args[0];
            if matches!(&**arg, Expr::Str(_)) || arg.descriptor().as_deref() == Some(STRING_DESC) {
                return arg.clone();
            }
        }
    }
    init.clone()
}

/// Collapse `new StringBuilder(..).append(a).append(b).toString()` into a
/// single concatenation of its operands.
pub fn collapse_string_concat(call: &Expr) -> Option<Expr> {
    let Expr::InvokeInstance {
        receiver,
        method,
        args,
        ..
    } = call
    else {
        return None;
    };
    if method.name != "toString" || !args.is_empty() || !is_builder(&method.owner) {
        return None;
    }

    let mut parts = Vec::new();
    let mut cur = receiver.clone();
    loop {
        let next = match &*cur {
            Expr::InvokeInstance {
                receiver,
                method,
                args,
                ..
            } if method.name == "append" && is_builder(&method.owner) && args.len() == 1 => {
                parts.push(args[0].clone());
                receiver.clone()
            }
            Expr::New { class, desc, args } if is_builder(class) => {
                match args.as_slice() {
                    [] => {}
                    // capacity hint, not content
                    [_] if desc == "(I)V" => return None,
                    [init] => parts.push(unwrap_value_of(init)),
                    _ => return None,
                }
                break;
            }
            other => {
                log::debug!("builder chain does not start at a construction: {other}");
                return None;
            }
        };
        cur = next;
    }
    parts.reverse();
    Some(Expr::StringConcat(parts))
}

/// Match `$SWITCH_TABLE$..()[e.ordinal()]` or `$SwitchMap$..[e.ordinal()]`.
/// Returns the enum value and the enum's internal name.
pub fn enum_switch_selector(selector: &Expr) -> Option<(Rc<Expr>, String)> {
    let Expr::ArrayElement { array, index, .. } = selector else {
        return None;
    };
    let is_table = match &**array {
        Expr::InvokeStatic { method, args } => {
            args.is_empty() && method.name.starts_with("$SWITCH_TABLE$")
        }
        Expr::StaticField(field) => field.name.starts_with("$SwitchMap$"),
        _ => false,
    };
    if !is_table {
        return None;
    }
    match &**index {
        Expr::InvokeInstance {
            receiver,
            method,
            args,
            ..
        } if method.name == "ordinal" && args.is_empty() => {
            Some((receiver.clone(), method.owner.clone()))
        }
        other => {
            log::debug!("switch table indexed by {other} instead of an ordinal");
            None
        }
    }
}
