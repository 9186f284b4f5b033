use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("Invalid descriptor {0:?}")]
    InvalidDescriptor(String),

    #[error("Label L{0} defined more than once")]
    DuplicateLabel(u32),

    #[error("Local variable {name:?} references unknown label L{label}")]
    UnknownLocalLabel { name: String, label: u32 },
}

pub type Result<T> = std::result::Result<T, IrError>;
