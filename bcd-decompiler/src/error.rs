use bcd_ir::IrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("Jump at instruction {index} targets unresolved label L{label}")]
    UnresolvedLabel { label: u32, index: usize },

    #[error("Conditional at instruction {break_point} has no simple form: {reason}")]
    ConditionShape {
        break_point: usize,
        reason: &'static str,
    },

    #[error("Conditional at instruction {break_point} jumps outside its condition chain")]
    ConditionEdgeEscapes { break_point: usize },

    #[error("No region end for branch at instruction {break_point}, control flow is not reducible")]
    IrreducibleControlFlow { break_point: usize },

    #[error("Unresolved conditional at instruction {break_point} inside a structured body")]
    UnresolvedConditional { break_point: usize },

    #[error("Operand stack underflow at instruction {index}")]
    StackUnderflow { index: usize },

    #[error("Unexpected operand at instruction {index}: expected {expected}")]
    OperandShape {
        index: usize,
        expected: &'static str,
    },

    #[error("Unsupported instruction {mnemonic} at {index}")]
    UnsupportedInstruction {
        index: usize,
        mnemonic: &'static str,
    },

    #[error(transparent)]
    Ir(#[from] IrError),
}

pub type Result<T> = std::result::Result<T, DecompileError>;
