use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    data::{
        kind::{Encoded, FieldKind, RawValue, TypeHint},
        path::{FieldPath, RANGE_MAX_SUFFIX, RANGE_MIN_SUFFIX},
    },
    error::CodecError,
};

fn is_false(b: &bool) -> bool {
    !*b
}

/// One editable unit produced by the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Address of the value inside the document.
    #[schemars(with = "String")]
    pub path: FieldPath,
    /// Human readable name.
    pub label: String,
    /// Kind chosen at projection time.
    pub kind: FieldKind,
    /// Current document value (or the declared default).
    pub value: Value,
    /// Numeric hint for the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeHint>,
    /// The presentation layer should not allow edits.
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    /// Suggested values for pickers; never enforced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FieldDescriptor {
    /// Flat bindings for this field: two for a range, one otherwise.
    pub fn bindings(&self) -> Result<Vec<FieldBinding>, CodecError> {
        let path = self.path.to_string();
        let bindings = match self.kind.encode(&self.value, self.type_hint, &path)? {
            Encoded::Single(value) => vec![FieldBinding {
                path,
                kind: self.kind,
                type_hint: self.type_hint,
                value,
            }],
            Encoded::Pair(min, max) => vec![
                FieldBinding {
                    path: self.path.with_leaf_suffix(RANGE_MIN_SUFFIX)?.to_string(),
                    kind: self.kind,
                    type_hint: self.type_hint,
                    value: min,
                },
                FieldBinding {
                    path: self.path.with_leaf_suffix(RANGE_MAX_SUFFIX)?.to_string(),
                    kind: self.kind,
                    type_hint: self.type_hint,
                    value: max,
                },
            ],
        };
        Ok(bindings)
    }
}

/// One flat input: what the presentation layer renders and sends back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldBinding {
    /// Field path; range halves carry a `_MIN` / `_MAX` suffix.
    pub path: String,
    /// Kind, echoed back unchanged.
    pub kind: FieldKind,
    /// Type hint, echoed back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeHint>,
    /// Raw input value.
    pub value: RawValue,
}

impl FieldBinding {
    /// Copy of this binding carrying a new raw value.
    pub fn with_value(&self, value: impl Into<RawValue>) -> Self {
        FieldBinding {
            value: value.into(),
            ..self.clone()
        }
    }
}

/// Display label for a document key: `MAX_WAIT_TIME` -> `Max wait time`.
pub fn format_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
