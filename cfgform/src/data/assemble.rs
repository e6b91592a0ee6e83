//! Reassembly of flat bindings into one document.

use log::debug;
use serde_json::{Map, Value};

use crate::{
    data::{
        field::FieldBinding,
        kind::{FieldKind, TypeHint, decode_number},
        path::{FieldPath, RANGE_MAX_SUFFIX, RANGE_MIN_SUFFIX},
        resolve::{descend_mut, leaf_slot_mut},
    },
    error::CodecError,
};

/// Accumulates decoded bindings into a fresh document.
///
/// Owned by one assembly; bindings are applied in order and the last write
/// to a location wins.
#[derive(Debug, Default)]
pub struct TreeAssembler {
    root: Map<String, Value>,
}

impl TreeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `binding` and write it into the document.
    ///
    /// Nothing is written when decoding fails.
    pub fn apply(&mut self, binding: &FieldBinding) -> Result<(), CodecError> {
        let path = FieldPath::parse(&binding.path)?;

        if binding.kind == FieldKind::Range {
            let half = if let Some(base) = path.strip_leaf_suffix(RANGE_MIN_SUFFIX) {
                Some((base, 0))
            } else {
                path.strip_leaf_suffix(RANGE_MAX_SUFFIX).map(|base| (base, 1))
            };
            if let Some((base, index)) = half {
                let float = binding.type_hint == Some(TypeHint::Float);
                let value = decode_number(&binding.value, float, &binding.path)?;
                return self.write_range_half(&base, index, value, binding.type_hint);
            }
        }

        let value = binding
            .kind
            .decode(&binding.value, binding.type_hint, &binding.path)?;
        let slot = self.slot(&path)?;
        *slot = value;
        Ok(())
    }

    fn write_range_half(
        &mut self,
        base: &FieldPath,
        index: usize,
        value: Value,
        hint: Option<TypeHint>,
    ) -> Result<(), CodecError> {
        let slot = self.slot(base)?;
        if !matches!(slot, Value::Array(items) if items.len() == 2) {
            debug!("{base}: seeding range pair");
            *slot = FieldKind::Range.empty_value(hint);
        }
        if let Value::Array(items) = slot {
            items[index] = value;
        }
        Ok(())
    }

    /// Slot for `path`'s leaf inside its effective container.
    fn slot(&mut self, path: &FieldPath) -> Result<&mut Value, CodecError> {
        let container = descend_mut(&mut self.root, path, path.container())?;
        Ok(leaf_slot_mut(container, path, path.leaf())?)
    }

    /// The assembled document.
    pub fn finish(self) -> Value {
        Value::Object(self.root)
    }
}

/// Assemble `bindings`, in order, into a new document.
pub fn assemble<'a>(
    bindings: impl IntoIterator<Item = &'a FieldBinding>,
) -> Result<Value, CodecError> {
    let mut assembler = TreeAssembler::new();
    for binding in bindings {
        assembler.apply(binding)?;
    }
    Ok(assembler.finish())
}
