pub mod cfg;
pub mod condition;
pub mod error;
pub mod options;
pub mod patterns;
pub mod region;
pub mod simplify;
pub mod stack;
pub mod structuring;

pub use error::{DecompileError, Result};
pub use options::DecompilerOptions;

use bcd_ir::instruction::MethodCode;
use bcd_ir::locals::LocalsResolver;
use bcd_ir::stmt::Stmt;

use cfg::CFG;

/// Decompile a method body into structured statements.
pub fn decompile_method(code: &MethodCode, locals: &dyn LocalsResolver) -> Result<Vec<Stmt>> {
    decompile_method_with(code, locals, &DecompilerOptions::default())
}

/// [`decompile_method`] with explicit options.
pub fn decompile_method_with(
    code: &MethodCode,
    locals: &dyn LocalsResolver,
    options: &DecompilerOptions,
) -> Result<Vec<Stmt>> {
    if code.is_empty() {
        return Ok(Vec::new());
    }
    let mut cfg = CFG::build(code)?;
    simplify::simplify(&mut cfg, code)?;
    log::debug!("simplified block graph:\n{}", cfg.dump());
    let sections = region::Partitioner::new(&mut cfg, code, locals, options).partition()?;
    structuring::structure_method(&cfg, code, locals, options, sections)
}
