pub mod condition;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod instruction;
pub mod locals;
pub mod stmt;

pub use error::IrError;
