/// Switches for the optional recoveries layered on top of plain structuring.
#[derive(Debug, Clone)]
pub struct DecompilerOptions {
    /// Fold `StringBuilder` append chains into a single concatenation.
    pub collapse_string_concat: bool,
    /// Replace `$SWITCH_TABLE$`/`$SwitchMap$` selectors by the enum value.
    pub recover_enum_switches: bool,
    /// Turn `init; while (cond) { ... }` into a `for` loop when `cond`
    /// tests the local `init` assigns.
    pub recover_for_loops: bool,
    /// Structure exception ranges as try/catch. When off, handlers are
    /// decompiled as plain code.
    pub structure_try_catch: bool,
    /// Fold constant-index stores into a fresh array into its initializer.
    pub fold_array_initializers: bool,
}

impl Default for DecompilerOptions {
    fn default() -> Self {
        DecompilerOptions {
            collapse_string_concat: true,
            recover_enum_switches: true,
            recover_for_loops: true,
            structure_try_catch: true,
            fold_array_initializers: true,
        }
    }
}
