use std::rc::Rc;

use crate::condition::Condition;
use crate::expr::Expr;
use crate::instruction::FieldRef;
use crate::locals::LocalInstance;

/// Statement nodes for decompiled code.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `local = value;`
    LocalAssign {
        local: LocalInstance,
        value: Rc<Expr>,
    },
    /// `Owner.field = value;`
    StaticFieldAssign { field: FieldRef, value: Rc<Expr> },
    /// `object.field = value;`
    InstanceFieldAssign {
        object: Rc<Expr>,
        field: FieldRef,
        value: Rc<Expr>,
    },
    /// `array[index] = value;`
    ArrayAssign {
        array: Rc<Expr>,
        index: Rc<Expr>,
        value: Rc<Expr>,
    },
    /// A call or construction evaluated for its side effects.
    Invoke(Rc<Expr>),
    /// `local += delta;`
    Increment { local: LocalInstance, delta: i32 },
    Return(Option<Rc<Expr>>),
    Throw(Rc<Expr>),
    If {
        cond: Condition,
        body: Vec<Stmt>,
        elifs: Vec<Elif>,
        else_body: Option<Vec<Stmt>>,
    },
    While { cond: Condition, body: Vec<Stmt> },
    DoWhile { cond: Condition, body: Vec<Stmt> },
    For {
        init: Box<Stmt>,
        cond: Condition,
        /// Trailing update of the init local, when the body ends in one.
        update: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Switch {
        selector: Rc<Expr>,
        /// Set when the selector was recovered from an enum ordinal table.
        enum_type: Option<String>,
        cases: Vec<SwitchCase>,
    },
    TryCatch {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
    },
}

/// An `else if` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Elif {
    pub cond: Condition,
    pub body: Vec<Stmt>,
}

/// A single case in a switch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub keys: Vec<i32>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
    /// The case ends in `break`; otherwise it returns, throws or falls through.
    pub breaks: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Internal name of the caught type, `None` for catch-all.
    pub exception: Option<String>,
    pub binding: Option<LocalInstance>,
    pub body: Vec<Stmt>,
}
