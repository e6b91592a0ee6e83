//! Projection of a document into field descriptors.
//!
//! Sections and groups are visited in registry order. Declared fields read
//! their current value or fall back to the declared default; data-driven
//! groups classify every entry they find. The document is never mutated.

use log::{debug, warn};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    data::{
        field::{FieldBinding, FieldDescriptor, format_label},
        kind::classify,
        path::{FieldPath, Segment, is_plain_key},
        resolve::lookup,
        schema::{FieldSpec, GroupSource, Schema},
    },
    error::{CodecError, PathError, value_type_name},
};

/// Descriptors grouped the way the registry lays them out.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Projection {
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct GroupView {
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Projection {
    /// Every descriptor, in display order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections
            .iter()
            .flat_map(|s| s.groups.iter())
            .flat_map(|g| g.fields.iter())
    }

    /// Flat bindings for every descriptor, in display order.
    pub fn bindings(&self) -> Result<Vec<FieldBinding>, CodecError> {
        let mut bindings = Vec::new();
        for descriptor in self.descriptors() {
            bindings.extend(descriptor.bindings()?);
        }
        Ok(bindings)
    }
}

/// Project `document` through `schema`.
///
/// Fails with a [`CodecError`] naming the path when a declared field holds
/// a value of the wrong shape, or a path runs through a scalar.
pub fn project(document: &Value, schema: &Schema) -> Result<Projection, CodecError> {
    let mut sections = Vec::with_capacity(schema.sections.len());

    for section in &schema.sections {
        let root = section.root()?;
        let mut groups = Vec::with_capacity(section.groups.len());

        for group in &section.groups {
            let base = group.source.base_path(&root)?;
            let fields = match &group.source {
                GroupSource::Fields { fields, .. } => declared(document, &base, fields, true)?,
                GroupSource::Record { fields, .. } => {
                    let present = match lookup(document, &base) {
                        Ok(found) => found.is_some(),
                        Err(PathError::IndexOutOfRange { .. }) => false,
                        Err(e) => return Err(e.into()),
                    };
                    if !present {
                        debug!("record {base} is absent, using defaults");
                    }
                    declared(document, &base, fields, present)?
                }
                GroupSource::Entries {
                    overrides,
                    sequences_as_tags,
                    ..
                } => match lookup(document, &base)? {
                    None | Some(Value::Null) => {
                        debug!("skipping group `{}`: {base} is absent", group.title);
                        continue;
                    }
                    Some(Value::Object(map)) => {
                        let mut fields = Vec::new();
                        let walk = EntryWalk {
                            overrides,
                            sequences_as_tags: *sequences_as_tags,
                        };
                        walk.collect(map, &base, "", &mut fields)?;
                        fields
                    }
                    Some(other) => {
                        return Err(PathError::NotAContainer {
                            path: base.to_string(),
                            segment: base.leaf().to_string(),
                            found: value_type_name(other),
                        }
                        .into());
                    }
                },
            };
            groups.push(GroupView {
                title: group.title.clone(),
                fields,
            });
        }

        sections.push(SectionView {
            id: section.id.clone(),
            title: section.title.clone(),
            groups,
        });
    }

    Ok(Projection { sections })
}

/// Descriptors for declared fields under `base`.
///
/// With `read` off every field takes its default.
fn declared(
    document: &Value,
    base: &FieldPath,
    specs: &[FieldSpec],
    read: bool,
) -> Result<Vec<FieldDescriptor>, CodecError> {
    let mut fields = Vec::with_capacity(specs.len());
    for spec in specs {
        let path = base.concat(&spec.relative_path()?);
        let current = if read && !spec.read_only {
            lookup(document, &path)?.filter(|v| !v.is_null()).cloned()
        } else {
            None
        };
        let value = current.unwrap_or_else(|| spec.default_value());
        fields.push(describe(spec, path, value)?);
    }
    Ok(fields)
}

fn describe(spec: &FieldSpec, path: FieldPath, value: Value) -> Result<FieldDescriptor, CodecError> {
    let type_hint = spec.type_hint();
    spec.kind.encode(&value, type_hint, &path.to_string())?;
    let label = spec
        .label
        .clone()
        .unwrap_or_else(|| format_label(path.leaf().key()));
    Ok(FieldDescriptor {
        path,
        label,
        kind: spec.kind,
        value,
        type_hint,
        read_only: spec.read_only,
        choices: spec.choices.clone(),
    })
}

struct EntryWalk<'a> {
    overrides: &'a [FieldSpec],
    sequences_as_tags: bool,
}

impl EntryWalk<'_> {
    /// Walk `map` depth first; `prefix` is the key path relative to the group base.
    fn collect(
        &self,
        map: &Map<String, Value>,
        path: &FieldPath,
        prefix: &str,
        out: &mut Vec<FieldDescriptor>,
    ) -> Result<(), CodecError> {
        for (key, value) in map {
            if !is_plain_key(key) {
                warn!("skipping key {key:?} under {path}: not addressable as a field path");
                continue;
            }
            let relative = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            let field_path = path.join(Segment::Key(key.clone()));

            if let Some(spec) = self.overrides.iter().find(|s| s.key == relative) {
                let value = if spec.read_only || value.is_null() {
                    spec.default_value()
                } else {
                    value.clone()
                };
                out.push(describe(spec, field_path, value)?);
                continue;
            }

            if let Value::Object(inner) = value {
                self.collect(inner, &field_path, &relative, out)?;
                continue;
            }

            let Some((kind, type_hint)) = classify(value, self.sequences_as_tags) else {
                continue;
            };
            debug!("{field_path}: classified as {kind:?}");
            let value = match value {
                Value::Null => Value::String(String::new()),
                other => other.clone(),
            };
            out.push(FieldDescriptor {
                label: format_label(key),
                path: field_path,
                kind,
                value,
                type_hint,
                read_only: false,
                choices: Vec::new(),
            });
        }
        Ok(())
    }
}
