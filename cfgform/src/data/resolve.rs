//! Path resolution against a configuration document.
//!
//! Resolution stops at the container of the last segment: callers read or
//! write the leaf themselves, since a range pair writes into one slot from
//! two sibling bindings.

use serde_json::{Map, Value};

use crate::{
    data::path::{FieldPath, Segment},
    error::{PathError, value_type_name},
};

fn not_a_container(path: &FieldPath, segment: &Segment, found: &Value) -> PathError {
    PathError::NotAContainer {
        path: path.to_string(),
        segment: segment.to_string(),
        found: value_type_name(found),
    }
}

/// Most elements a single indexed write may append to a sequence.
///
/// Writing further past the end is an [`PathError::IndexOutOfRange`], so a
/// stray index in an edit cannot blow up the document.
pub const MAX_PADDING: usize = 256;

/// Pad `items` with empty mappings until `index` is addressable.
fn pad(items: &mut Vec<Value>, index: usize, path: &FieldPath, segment: &Segment) -> Result<(), PathError> {
    if index >= items.len() + MAX_PADDING {
        return Err(PathError::IndexOutOfRange {
            path: path.to_string(),
            segment: segment.to_string(),
            index,
            len: items.len(),
        });
    }
    while items.len() <= index {
        items.push(Value::Object(Map::new()));
    }
    Ok(())
}

/// Walk `segments` from `root`, creating missing mappings and sequences.
///
/// `null` values on the way are treated as absent and replaced.
pub fn descend_mut<'a>(
    root: &'a mut Map<String, Value>,
    path: &FieldPath,
    segments: &[Segment],
) -> Result<&'a mut Map<String, Value>, PathError> {
    let mut current = root;
    for segment in segments {
        current = step_mut(current, path, segment)?;
    }
    Ok(current)
}

fn step_mut<'a>(
    map: &'a mut Map<String, Value>,
    path: &FieldPath,
    segment: &Segment,
) -> Result<&'a mut Map<String, Value>, PathError> {
    let slot = match segment {
        Segment::Key(key) => {
            let slot = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            slot
        }
        Segment::Indexed { key, index } => {
            let slot = map
                .entry(key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Err(not_a_container(path, segment, slot));
            };
            pad(items, *index, path, segment)?;
            let element = &mut items[*index];
            if element.is_null() {
                *element = Value::Object(Map::new());
            }
            element
        }
    };

    match slot {
        Value::Object(inner) => Ok(inner),
        other => Err(not_a_container(path, segment, other)),
    }
}

/// Resolve the container of `path`'s leaf, creating intermediates.
pub fn resolve_parent_mut<'a>(
    root: &'a mut Map<String, Value>,
    path: &FieldPath,
) -> Result<&'a mut Map<String, Value>, PathError> {
    descend_mut(root, path, path.parent())
}

/// Mutable slot for `leaf` inside `container`, created as `null` when absent.
///
/// Indexed leaves pad their sequence with empty mappings first.
pub fn leaf_slot_mut<'a>(
    container: &'a mut Map<String, Value>,
    path: &FieldPath,
    leaf: &Segment,
) -> Result<&'a mut Value, PathError> {
    match leaf {
        Segment::Key(key) => Ok(container.entry(key.clone()).or_insert(Value::Null)),
        Segment::Indexed { key, index } => {
            let slot = container
                .entry(key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Err(not_a_container(path, leaf, slot));
            };
            pad(items, *index, path, leaf)?;
            Ok(&mut items[*index])
        }
    }
}

/// Read-only resolution of the container of `path`'s leaf.
///
/// A missing mapping key yields `Ok(None)`. An indexed segment past the end
/// of its sequence is an error, since nothing may be created here.
pub fn resolve_parent<'a>(
    root: &'a Value,
    path: &FieldPath,
) -> Result<Option<&'a Map<String, Value>>, PathError> {
    let mut current = match root {
        Value::Object(map) => map,
        other => {
            return Err(PathError::NotAContainer {
                path: path.to_string(),
                segment: String::new(),
                found: value_type_name(other),
            });
        }
    };

    for segment in path.parent() {
        let Some(next) = read_segment(current, path, segment)? else {
            return Ok(None);
        };
        current = match next {
            Value::Object(map) => map,
            Value::Null => return Ok(None),
            other => return Err(not_a_container(path, segment, other)),
        };
    }
    Ok(Some(current))
}

fn read_segment<'a>(
    map: &'a Map<String, Value>,
    path: &FieldPath,
    segment: &Segment,
) -> Result<Option<&'a Value>, PathError> {
    match segment {
        Segment::Key(key) => Ok(map.get(key)),
        Segment::Indexed { key, index } => match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => {
                items
                    .get(*index)
                    .map(Some)
                    .ok_or_else(|| PathError::IndexOutOfRange {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        index: *index,
                        len: items.len(),
                    })
            }
            Some(other) => Err(not_a_container(path, segment, other)),
        },
    }
}

/// Value stored at `path`, or `None` when some mapping key on the way is absent.
pub fn lookup<'a>(root: &'a Value, path: &FieldPath) -> Result<Option<&'a Value>, PathError> {
    match resolve_parent(root, path)? {
        Some(container) => read_segment(container, path, path.leaf()),
        None => Ok(None),
    }
}
