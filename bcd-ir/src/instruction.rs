use std::collections::HashMap;

use bitflags::bitflags;

use crate::descriptor::MethodDescriptor;
use crate::error::{IrError, Result};

/// A position marker in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Primitive category an instruction operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Byte,
    Char,
    Short,
    Boolean,
}

impl ValueKind {
    /// Field descriptor of the kind. References have no single descriptor.
    pub fn descriptor(self) -> &'static str {
        match self {
            ValueKind::Int => "I",
            ValueKind::Long => "J",
            ValueKind::Float => "F",
            ValueKind::Double => "D",
            ValueKind::Reference => "Ljava/lang/Object;",
            ValueKind::Byte => "B",
            ValueKind::Char => "C",
            ValueKind::Short => "S",
            ValueKind::Boolean => "Z",
        }
    }

    pub fn is_wide(self) -> bool {
        matches!(self, ValueKind::Long | ValueKind::Double)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    And,
    Or,
    Xor,
}

impl std::fmt::Display for ArithOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
            ArithOp::Shl => "<<",
            ArithOp::Shr => ">>",
            ArithOp::UShr => ">>>",
            ArithOp::And => "&",
            ArithOp::Or => "|",
            ArithOp::Xor => "^",
        };
        f.write_str(s)
    }
}

/// `lcmp`, `fcmpl`, `fcmpg`, `dcmpl`, `dcmpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    Long,
    FloatL,
    FloatG,
    DoubleL,
    DoubleG,
}

/// Comparison operator of a conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl CmpOp {
    pub fn inverse(self) -> CmpOp {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Ge => CmpOp::Lt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Le => CmpOp::Gt,
        }
    }
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
        };
        f.write_str(s)
    }
}

/// A constant pushed by `iconst`/`bipush`/`sipush`/`ldc` and friends.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Class literal, as an internal name or array descriptor.
    Class(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub desc: String,
}

impl MethodRef {
    pub fn new(owner: &str, name: &str, desc: &str) -> Self {
        MethodRef {
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

bitflags! {
    /// Control-flow classification of an instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InsnFlags: u8 {
        const JUMP = 1 << 0;
        const CONDITIONAL = 1 << 1;
        const SWITCH = 1 << 2;
        const RETURN = 1 << 3;
        const THROW = 1 << 4;
        /// Labels, line numbers and frames. No runtime behaviour.
        const PSEUDO = 1 << 5;
    }
}

/// A single decoded instruction. Labels and debug markers are part of the
/// stream as pseudo-instructions.
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    Label(Label),
    LineNumber(u32),
    Frame,
    Nop,

    AConstNull,
    Push(Constant),
    Load { kind: ValueKind, slot: u16 },
    Store { kind: ValueKind, slot: u16 },
    ArrayLoad(ValueKind),
    ArrayStore(ValueKind),

    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,

    Arith(ArithOp, ValueKind),
    Neg(ValueKind),
    Iinc { slot: u16, delta: i32 },
    Convert { from: ValueKind, to: ValueKind },
    Compare(CompareKind),

    /// `ifeq`, `ifne`, `iflt`, `ifge`, `ifgt`, `ifle`.
    IfZero(CmpOp, Label),
    /// `if_icmp<op>`.
    IfICmp(CmpOp, Label),
    /// `if_acmpeq` / `if_acmpne`.
    IfACmp(CmpOp, Label),
    IfNull(Label),
    IfNonNull(Label),
    Goto(Label),
    TableSwitch {
        min: i32,
        max: i32,
        default: Label,
        targets: Vec<Label>,
    },
    LookupSwitch {
        default: Label,
        pairs: Vec<(i32, Label)>,
    },
    Return(Option<ValueKind>),
    Throw,

    GetStatic(FieldRef),
    PutStatic(FieldRef),
    GetField(FieldRef),
    PutField(FieldRef),
    Invoke { kind: InvokeKind, method: MethodRef },
    InvokeDynamic { name: String, desc: String },

    /// `new`, with the class internal name.
    New(String),
    /// `newarray` / `anewarray`, with the component descriptor.
    NewArray(String),
    ArrayLength,
    CheckCast(String),
    InstanceOf(String),
    MonitorEnter,
    MonitorExit,
    MultiANewArray { desc: String, dims: u8 },
}

impl Insn {
    pub fn flags(&self) -> InsnFlags {
        match self {
            Insn::Label(_) | Insn::LineNumber(_) | Insn::Frame => InsnFlags::PSEUDO,
            Insn::IfZero(..)
            | Insn::IfICmp(..)
            | Insn::IfACmp(..)
            | Insn::IfNull(_)
            | Insn::IfNonNull(_) => InsnFlags::JUMP | InsnFlags::CONDITIONAL,
            Insn::Goto(_) => InsnFlags::JUMP,
            Insn::TableSwitch { .. } | Insn::LookupSwitch { .. } => InsnFlags::SWITCH,
            Insn::Return(_) => InsnFlags::RETURN,
            Insn::Throw => InsnFlags::THROW,
            _ => InsnFlags::empty(),
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.flags().contains(InsnFlags::PSEUDO)
    }

    /// Target label of a jump instruction.
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Insn::IfZero(_, l)
            | Insn::IfICmp(_, l)
            | Insn::IfACmp(_, l)
            | Insn::IfNull(l)
            | Insn::IfNonNull(l)
            | Insn::Goto(l) => Some(*l),
            _ => None,
        }
    }

    /// `(key, target)` pairs of a switch in table order, plus its default.
    pub fn switch_targets(&self) -> Option<(Vec<(i32, Label)>, Label)> {
        match self {
            Insn::TableSwitch {
                min,
                max: _,
                default,
                targets,
            } => {
                let pairs = targets
                    .iter()
                    .enumerate()
                    .map(|(i, l)| (min.wrapping_add(i as i32), *l))
                    .collect();
                Some((pairs, *default))
            }
            Insn::LookupSwitch { default, pairs } => Some((pairs.clone(), *default)),
            _ => None,
        }
    }

    /// Operand-stack effect as `(values popped, values pushed)`.
    ///
    /// Counts values rather than slots, so a `long` is one value. The dup
    /// family is reported with its category-1 shape.
    pub fn stack_effect(&self) -> Result<(usize, usize)> {
        let effect = match self {
            Insn::Label(_) | Insn::LineNumber(_) | Insn::Frame | Insn::Nop => (0, 0),
            Insn::AConstNull | Insn::Push(_) | Insn::Load { .. } => (0, 1),
            Insn::Store { .. } => (1, 0),
            Insn::ArrayLoad(_) => (2, 1),
            Insn::ArrayStore(_) => (3, 0),
            Insn::Pop => (1, 0),
            Insn::Pop2 => (2, 0),
            Insn::Dup => (1, 2),
            Insn::DupX1 => (2, 3),
            Insn::DupX2 => (3, 4),
            Insn::Dup2 => (2, 4),
            Insn::Dup2X1 => (3, 5),
            Insn::Dup2X2 => (4, 6),
            Insn::Swap => (2, 2),
            Insn::Arith(..) => (2, 1),
            Insn::Neg(_) => (1, 1),
            Insn::Iinc { .. } => (0, 0),
            Insn::Convert { .. } => (1, 1),
            Insn::Compare(_) => (2, 1),
            Insn::IfZero(..) | Insn::IfNull(_) | Insn::IfNonNull(_) => (1, 0),
            Insn::IfICmp(..) | Insn::IfACmp(..) => (2, 0),
            Insn::Goto(_) => (0, 0),
            Insn::TableSwitch { .. } | Insn::LookupSwitch { .. } => (1, 0),
            Insn::Return(kind) => (usize::from(kind.is_some()), 0),
            Insn::Throw => (1, 0),
            Insn::GetStatic(_) => (0, 1),
            Insn::PutStatic(_) => (1, 0),
            Insn::GetField(_) => (1, 1),
            Insn::PutField(_) => (2, 0),
            Insn::Invoke { kind, method } => {
                let desc = MethodDescriptor::parse(&method.desc)?;
                let receiver = usize::from(*kind != InvokeKind::Static);
                let pushes = usize::from(!desc.returns_void());
                (desc.params.len() + receiver, pushes)
            }
            Insn::InvokeDynamic { desc, .. } => {
                let desc = MethodDescriptor::parse(desc)?;
                (desc.params.len(), usize::from(!desc.returns_void()))
            }
            Insn::New(_) => (0, 1),
            Insn::NewArray(_) | Insn::ArrayLength | Insn::CheckCast(_) | Insn::InstanceOf(_) => {
                (1, 1)
            }
            Insn::MonitorEnter | Insn::MonitorExit => (1, 0),
            Insn::MultiANewArray { dims, .. } => (usize::from(*dims), 1),
        };
        Ok(effect)
    }

    /// Short opcode name for diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Insn::Label(_) => "label",
            Insn::LineNumber(_) => "line",
            Insn::Frame => "frame",
            Insn::Nop => "nop",
            Insn::AConstNull => "aconst_null",
            Insn::Push(_) => "ldc",
            Insn::Load { .. } => "load",
            Insn::Store { .. } => "store",
            Insn::ArrayLoad(_) => "xaload",
            Insn::ArrayStore(_) => "xastore",
            Insn::Pop => "pop",
            Insn::Pop2 => "pop2",
            Insn::Dup => "dup",
            Insn::DupX1 => "dup_x1",
            Insn::DupX2 => "dup_x2",
            Insn::Dup2 => "dup2",
            Insn::Dup2X1 => "dup2_x1",
            Insn::Dup2X2 => "dup2_x2",
            Insn::Swap => "swap",
            Insn::Arith(..) => "arith",
            Insn::Neg(_) => "neg",
            Insn::Iinc { .. } => "iinc",
            Insn::Convert { .. } => "convert",
            Insn::Compare(_) => "cmp",
            Insn::IfZero(..) => "if",
            Insn::IfICmp(..) => "if_icmp",
            Insn::IfACmp(..) => "if_acmp",
            Insn::IfNull(_) => "ifnull",
            Insn::IfNonNull(_) => "ifnonnull",
            Insn::Goto(_) => "goto",
            Insn::TableSwitch { .. } => "tableswitch",
            Insn::LookupSwitch { .. } => "lookupswitch",
            Insn::Return(_) => "return",
            Insn::Throw => "athrow",
            Insn::GetStatic(_) => "getstatic",
            Insn::PutStatic(_) => "putstatic",
            Insn::GetField(_) => "getfield",
            Insn::PutField(_) => "putfield",
            Insn::Invoke { .. } => "invoke",
            Insn::InvokeDynamic { .. } => "invokedynamic",
            Insn::New(_) => "new",
            Insn::NewArray(_) => "newarray",
            Insn::ArrayLength => "arraylength",
            Insn::CheckCast(_) => "checkcast",
            Insn::InstanceOf(_) => "instanceof",
            Insn::MonitorEnter => "monitorenter",
            Insn::MonitorExit => "monitorexit",
            Insn::MultiANewArray { .. } => "multianewarray",
        }
    }
}

/// An exception range. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryCatchBlock {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    /// Internal name of the caught type, `None` for catch-all.
    pub exception: Option<String>,
}

/// The body of one method as handed over by the class-file front end.
#[derive(Debug, Clone)]
pub struct MethodCode {
    pub instructions: Vec<Insn>,
    pub try_catch: Vec<TryCatchBlock>,
    labels: HashMap<Label, usize>,
}

impl MethodCode {
    pub fn new(instructions: Vec<Insn>, try_catch: Vec<TryCatchBlock>) -> Result<Self> {
        let mut labels = HashMap::new();
        for (i, insn) in instructions.iter().enumerate() {
            if let Insn::Label(l) = insn {
                if labels.insert(*l, i).is_some() {
                    return Err(IrError::DuplicateLabel(l.0));
                }
            }
        }
        Ok(MethodCode {
            instructions,
            try_catch,
            labels,
        })
    }

    /// Instruction index of a label.
    pub fn label_index(&self, label: Label) -> Option<usize> {
        self.labels.get(&label).copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
