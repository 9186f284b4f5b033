use crate::error::{IrError, Result};
use crate::instruction::{Label, MethodCode};

/// One named, typed incarnation of a local variable slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalInstance {
    pub slot: u16,
    pub name: String,
    /// Field descriptor, unknown when the slot has no debug entry.
    pub descriptor: Option<String>,
}

impl LocalInstance {
    /// Placeholder for a slot without a covering local-variable-table entry.
    pub fn unnamed(slot: u16) -> Self {
        LocalInstance {
            slot,
            name: format!("local{slot}"),
            descriptor: None,
        }
    }
}

impl std::fmt::Display for LocalInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Maps a slot at a program point to the local living there.
pub trait LocalsResolver {
    /// `index` is the instruction index of the load/store/iinc.
    fn resolve(&self, slot: u16, index: usize) -> LocalInstance;
}

/// Local-variable-table entry as read from the class file.
#[derive(Debug, Clone)]
pub struct LocalVariable {
    pub slot: u16,
    pub name: String,
    pub descriptor: String,
    pub start: Label,
    pub end: Label,
}

#[derive(Debug, Clone)]
struct BakedLocal {
    instance: LocalInstance,
    start: usize,
    end: usize,
}

/// Resolver backed by a local variable table, with label ranges turned
/// into instruction indices.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    entries: Vec<BakedLocal>,
}

impl Locals {
    pub fn new(vars: &[LocalVariable], code: &MethodCode) -> Result<Self> {
        let index_of = |var: &LocalVariable, label: Label| {
            code.label_index(label)
                .ok_or_else(|| IrError::UnknownLocalLabel {
                    name: var.name.clone(),
                    label: label.0,
                })
        };
        let mut entries = Vec::with_capacity(vars.len());
        for var in vars {
            entries.push(BakedLocal {
                instance: LocalInstance {
                    slot: var.slot,
                    name: var.name.clone(),
                    descriptor: Some(var.descriptor.clone()),
                },
                start: index_of(var, var.start)?,
                end: index_of(var, var.end)?,
            });
        }
        Ok(Locals { entries })
    }
}

impl LocalsResolver for Locals {
    fn resolve(&self, slot: u16, index: usize) -> LocalInstance {
        // A store sits just before the label opening its variable's range.
        self.entries
            .iter()
            .filter(|e| e.instance.slot == slot && e.start <= index + 1 && index < e.end)
            .max_by_key(|e| e.start)
            .map(|e| e.instance.clone())
            .unwrap_or_else(|| LocalInstance::unnamed(slot))
    }
}
