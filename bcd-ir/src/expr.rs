use std::fmt;
use std::rc::Rc;

use crate::descriptor::{self, MethodDescriptor};
use crate::instruction::{ArithOp, CompareKind, FieldRef, InvokeKind, MethodRef, ValueKind};
use crate::locals::LocalInstance;

/// Expression tree nodes for decompiled code.
///
/// Children are shared: duplicating a stack value copies the `Rc`, so one
/// node may hang under several parents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Class literal `Foo.class`.
    Class(String),
    Local(LocalInstance),
    StaticField(FieldRef),
    InstanceField {
        object: Rc<Expr>,
        field: FieldRef,
    },
    ArrayElement {
        array: Rc<Expr>,
        index: Rc<Expr>,
        kind: ValueKind,
    },
    ArrayLength(Rc<Expr>),
    Binary {
        op: ArithOp,
        kind: ValueKind,
        lhs: Rc<Expr>,
        rhs: Rc<Expr>,
    },
    Neg {
        kind: ValueKind,
        operand: Rc<Expr>,
    },
    /// Primitive conversion or `checkcast`; `ty` is a field descriptor.
    Cast {
        ty: String,
        value: Rc<Expr>,
    },
    InstanceOf {
        value: Rc<Expr>,
        ty: String,
    },
    /// Result of `lcmp`/`fcmp`/`dcmp`; only meaningful as a jump operand.
    NumberCompare {
        kind: CompareKind,
        lhs: Rc<Expr>,
        rhs: Rc<Expr>,
    },
    InvokeStatic {
        method: MethodRef,
        args: Vec<Rc<Expr>>,
    },
    InvokeInstance {
        kind: InvokeKind,
        receiver: Rc<Expr>,
        method: MethodRef,
        args: Vec<Rc<Expr>>,
    },
    InvokeDynamic {
        name: String,
        desc: String,
        args: Vec<Rc<Expr>>,
    },
    /// `new T(args)` once the constructor call has been seen.
    New {
        class: String,
        desc: String,
        args: Vec<Rc<Expr>>,
    },
    /// Result of `new T` still waiting for its `<init>` call.
    PendingNew(String),
    NewArray {
        component: String,
        size: Rc<Expr>,
        init: Option<Vec<Rc<Expr>>>,
    },
    NewMultiArray {
        desc: String,
        dims: Vec<Rc<Expr>>,
    },
    /// Collapsed `StringBuilder` chain.
    StringConcat(Vec<Rc<Expr>>),
    /// The exception object on the stack at a handler entry.
    CaughtException(Option<String>),
}

impl Expr {
    /// Best-known field descriptor of the value.
    pub fn descriptor(&self) -> Option<String> {
        let desc = match self {
            Expr::Null => return None,
            Expr::Int(_) => "I".to_string(),
            Expr::Long(_) => "J".to_string(),
            Expr::Float(_) => "F".to_string(),
            Expr::Double(_) => "D".to_string(),
            Expr::Str(_) | Expr::StringConcat(_) => "Ljava/lang/String;".to_string(),
            Expr::Class(_) => "Ljava/lang/Class;".to_string(),
            Expr::Local(local) => return local.descriptor.clone(),
            Expr::StaticField(field) | Expr::InstanceField { field, .. } => field.desc.clone(),
            Expr::ArrayElement { kind, .. } => match kind {
                ValueKind::Reference => return None,
                k => k.descriptor().to_string(),
            },
            Expr::ArrayLength(_) => "I".to_string(),
            Expr::Binary { kind, .. } | Expr::Neg { kind, .. } => kind.descriptor().to_string(),
            Expr::Cast { ty, .. } => ty.clone(),
            Expr::InstanceOf { .. } => "Z".to_string(),
            Expr::NumberCompare { .. } => "I".to_string(),
            Expr::InvokeStatic { method, .. } | Expr::InvokeInstance { method, .. } => {
                return MethodDescriptor::parse(&method.desc).ok().map(|d| d.ret);
            }
            Expr::InvokeDynamic { desc, .. } => {
                return MethodDescriptor::parse(desc).ok().map(|d| d.ret);
            }
            Expr::New { class, .. } | Expr::PendingNew(class) => format!("L{class};"),
            Expr::NewArray { component, .. } => format!("[{component}"),
            Expr::NewMultiArray { desc, .. } => desc.clone(),
            Expr::CaughtException(ty) => {
                format!("L{};", ty.as_deref().unwrap_or("java/lang/Throwable"))
            }
        };
        Some(desc)
    }

    /// Takes two stack slots.
    pub fn is_wide(&self) -> bool {
        self.descriptor().is_some_and(|d| descriptor::is_wide(&d))
    }

    /// Known to be an int-like value rather than a boolean.
    pub fn is_int_like(&self) -> bool {
        self.descriptor().is_some_and(|d| descriptor::is_int_like(&d))
    }

    /// Method calls and object construction; the only values worth keeping
    /// as a statement when discarded.
    pub fn is_invocation(&self) -> bool {
        matches!(
            self,
            Expr::InvokeStatic { .. }
                | Expr::InvokeInstance { .. }
                | Expr::InvokeDynamic { .. }
                | Expr::New { .. }
        )
    }

    /// Whether `local` is read anywhere inside this expression.
    pub fn references_local(&self, local: &LocalInstance) -> bool {
        match self {
            Expr::Local(l) => l == local,
            Expr::InstanceField { object: e, .. }
            | Expr::ArrayLength(e)
            | Expr::Neg { operand: e, .. }
            | Expr::Cast { value: e, .. }
            | Expr::InstanceOf { value: e, .. } => e.references_local(local),
            Expr::ArrayElement { array, index, .. } => {
                array.references_local(local) || index.references_local(local)
            }
            Expr::Binary { lhs, rhs, .. } | Expr::NumberCompare { lhs, rhs, .. } => {
                lhs.references_local(local) || rhs.references_local(local)
            }
            Expr::InvokeInstance { receiver, args, .. } => {
                receiver.references_local(local) || any_references(args, local)
            }
            Expr::InvokeStatic { args, .. }
            | Expr::InvokeDynamic { args, .. }
            | Expr::New { args, .. }
            | Expr::StringConcat(args)
            | Expr::NewMultiArray { dims: args, .. } => any_references(args, local),
            Expr::NewArray { size, init, .. } => {
                size.references_local(local)
                    || init.as_deref().is_some_and(|xs| any_references(xs, local))
            }
            _ => false,
        }
    }
}

fn any_references(exprs: &[Rc<Expr>], local: &LocalInstance) -> bool {
    exprs.iter().any(|e| e.references_local(local))
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Rc<Expr>]) -> fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{a}")?;
    }
    Ok(())
}

fn simple_name(internal: &str) -> &str {
    internal.rsplit('/').next().unwrap_or(internal)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Null => f.write_str("null"),
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Long(v) => write!(f, "{v}L"),
            Expr::Float(v) => write!(f, "{v}F"),
            Expr::Double(v) => write!(f, "{v}D"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Class(c) => write!(f, "{}.class", descriptor::type_name(c)),
            Expr::Local(l) => write!(f, "{l}"),
            Expr::StaticField(field) => write!(f, "{}.{}", simple_name(&field.owner), field.name),
            Expr::InstanceField { object, field } => write!(f, "{object}.{}", field.name),
            Expr::ArrayElement { array, index, .. } => write!(f, "{array}[{index}]"),
            Expr::ArrayLength(a) => write!(f, "{a}.length"),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({lhs} {op} {rhs})"),
            Expr::Neg { operand, .. } => write!(f, "-{operand}"),
            Expr::Cast { ty, value } => write!(f, "(({}) {value})", descriptor::type_name(ty)),
            Expr::InstanceOf { value, ty } => {
                write!(f, "{value} instanceof {}", descriptor::type_name(ty))
            }
            Expr::NumberCompare { lhs, rhs, .. } => write!(f, "compare({lhs}, {rhs})"),
            Expr::InvokeStatic { method, args } => {
                write!(f, "{}.{}(", simple_name(&method.owner), method.name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::InvokeInstance {
                receiver,
                method,
                args,
                ..
            } => {
                write!(f, "{receiver}.{}(", method.name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::InvokeDynamic { name, args, .. } => {
                write!(f, "{name}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::New { class, args, .. } => {
                write!(f, "new {}(", descriptor::type_name(class))?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::PendingNew(class) => write!(f, "new {}", descriptor::type_name(class)),
            Expr::NewArray {
                component,
                size,
                init,
            } => match init {
                Some(values) => {
                    write!(f, "new {}[] {{", descriptor::type_name(component))?;
                    write_args(f, values)?;
                    f.write_str("}")
                }
                None => write!(f, "new {}[{size}]", descriptor::type_name(component)),
            },
            Expr::NewMultiArray { desc, dims } => {
                let mut elem = desc.as_str();
                for _ in dims {
                    elem = elem.strip_prefix('[').unwrap_or(elem);
                }
                write!(f, "new {}", descriptor::type_name(elem))?;
                for d in dims {
                    write!(f, "[{d}]")?;
                }
                Ok(())
            }
            Expr::StringConcat(parts) => {
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
            Expr::CaughtException(_) => f.write_str("<caught>"),
        }
    }
}
