//! JVM field and method descriptors.
//!
//! Only the pieces the decompiler needs: splitting a method descriptor into
//! its parameter types and return type, and classifying a single field type.

use crate::error::{IrError, Result};

/// A parsed method descriptor such as `(ILjava/lang/String;)V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<String>,
    pub ret: String,
}

impl MethodDescriptor {
    pub fn parse(desc: &str) -> Result<Self> {
        let invalid = || IrError::InvalidDescriptor(desc.to_string());
        let rest = desc.strip_prefix('(').ok_or_else(invalid)?;
        let close = rest.find(')').ok_or_else(invalid)?;
        let (mut params_str, ret) = (&rest[..close], &rest[close + 1..]);

        let mut params = Vec::new();
        while !params_str.is_empty() {
            let len = field_type_len(params_str).ok_or_else(invalid)?;
            params.push(params_str[..len].to_string());
            params_str = &params_str[len..];
        }

        let ret_ok = ret == "V" || field_type_len(ret) == Some(ret.len());
        if !ret_ok {
            return Err(invalid());
        }
        Ok(MethodDescriptor {
            params,
            ret: ret.to_string(),
        })
    }

    pub fn returns_void(&self) -> bool {
        self.ret == "V"
    }
}

/// Length in bytes of the first field type in `s`, if `s` starts with one.
fn field_type_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(i + 1),
        b'L' => {
            let semi = s[i..].find(';')?;
            // `L;` names no class
            (semi > 1).then_some(i + semi + 1)
        }
        _ => None,
    }
}

/// Whether the field type occupies two stack slots (`long` / `double`).
pub fn is_wide(desc: &str) -> bool {
    matches!(desc, "J" | "D")
}

/// Whether the field type is one of the int-like primitives that `ifeq`
/// compares against zero rather than treating as a boolean.
pub fn is_int_like(desc: &str) -> bool {
    matches!(desc, "I" | "B" | "S" | "C")
}

/// `Ljava/lang/String;` -> `java/lang/String`. Array and primitive types are
/// returned unchanged.
pub fn internal_name(desc: &str) -> &str {
    desc.strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .unwrap_or(desc)
}

/// Human-readable type name: `I` -> `int`, `[Ljava/lang/String;` -> `java.lang.String[]`.
pub fn type_name(desc: &str) -> String {
    if let Some(elem) = desc.strip_prefix('[') {
        return format!("{}[]", type_name(elem));
    }
    let name = match desc {
        "B" => "byte",
        "C" => "char",
        "D" => "double",
        "F" => "float",
        "I" => "int",
        "J" => "long",
        "S" => "short",
        "Z" => "boolean",
        "V" => "void",
        other => return internal_name(other).replace('/', "."),
    };
    name.to_string()
}
