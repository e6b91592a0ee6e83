//! The field type model.
//!
//! Every editable field has one [`FieldKind`], chosen once when the
//! document is projected and carried unchanged through the presentation
//! layer back to the assembler. Each kind knows how to encode a document
//! value into its UI representation ([`RawValue`]) and how to decode it
//! back.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::TypeError;

/// Separator used to render an ordered list as one line of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Separator {
    /// `a, b, c`
    #[default]
    Comma,
    /// `a b c`
    Space,
}

impl Separator {
    fn split(self, text: &str) -> Vec<&str> {
        let items: Vec<&str> = match self {
            Separator::Comma => text.split(',').collect(),
            Separator::Space => text.split_whitespace().collect(),
        };
        items
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    fn joiner(self) -> &'static str {
        match self {
            Separator::Comma => ", ",
            Separator::Space => " ",
        }
    }
}

/// Numeric hint attached to a field, echoed back by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TypeHint {
    Integer,
    Float,
    NumberList,
}

/// Closed set of editable field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    /// Checkbox.
    Boolean,
    /// Free text.
    Text,
    /// Base-10 integer.
    Integer,
    /// Decimal number.
    Float,
    /// Ordered list of strings edited as one line of text.
    List {
        #[serde(default)]
        separator: Separator,
    },
    /// Ordered list of integers edited as one line of text.
    NumberList {
        #[serde(default)]
        separator: Separator,
    },
    /// `[min, max]` pair edited through two sibling inputs.
    ///
    /// Integer unless the type hint is [`TypeHint::Float`].
    Range,
    /// Ordered list of strings edited as discrete tags.
    TagSet {
        /// Drop repeated tags on decode.
        #[serde(default)]
        unique: bool,
    },
}

/// Raw value exchanged with the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawValue {
    /// Checkbox state.
    Flag(bool),
    /// Already-typed number, accepted from non-browser clients.
    Number(Number),
    /// Text input content.
    Text(String),
    /// Tags, or a composite such as both halves of a range.
    Items(Vec<String>),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::Flag(b) => b.to_string(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => format!("{s:?}"),
            RawValue::Items(items) => format!("{items:?}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Flag(b)
    }
}

/// Encoded UI representation of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    /// One input.
    Single(RawValue),
    /// Range halves: min and max.
    Pair(RawValue, RawValue),
}

fn is_float(hint: Option<TypeHint>) -> bool {
    hint == Some(TypeHint::Float)
}

fn number_text(n: &Number) -> RawValue {
    RawValue::Text(n.to_string())
}

/// Parse one number of a numeric field.
pub(crate) fn decode_number(raw: &RawValue, float: bool, path: &str) -> Result<Value, TypeError> {
    let expected = if float { "decimal number" } else { "integer" };
    let fail = || TypeError::new(path, expected, raw.describe());

    match raw {
        RawValue::Number(n) if float => n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(fail),
        RawValue::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
        RawValue::Text(s) => parse_number(s.trim(), float).ok_or_else(fail),
        _ => Err(fail()),
    }
}

fn parse_number(text: &str, float: bool) -> Option<Value> {
    if float {
        let f = text.parse::<f64>().ok()?;
        Number::from_f64(f).map(Value::Number)
    } else {
        match text.parse::<i64>() {
            Ok(n) => Some(Value::from(n)),
            Err(_) => text.parse::<u64>().ok().map(Value::from),
        }
    }
}

fn item_text(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl FieldKind {
    /// Hint implied by the kind when none is declared.
    pub fn default_hint(&self) -> Option<TypeHint> {
        match self {
            FieldKind::Integer | FieldKind::Range => Some(TypeHint::Integer),
            FieldKind::Float => Some(TypeHint::Float),
            FieldKind::NumberList { .. } => Some(TypeHint::NumberList),
            _ => None,
        }
    }

    /// Value used when a declared field is absent from the document.
    pub fn empty_value(&self, hint: Option<TypeHint>) -> Value {
        match self {
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Text => Value::String(String::new()),
            FieldKind::Integer => Value::from(0),
            FieldKind::Float => Value::from(0.0),
            FieldKind::List { .. } | FieldKind::NumberList { .. } | FieldKind::TagSet { .. } => {
                Value::Array(Vec::new())
            }
            FieldKind::Range if is_float(hint) => Value::from(vec![0.0, 0.0]),
            FieldKind::Range => Value::from(vec![0, 0]),
        }
    }

    /// Human readable description of the kind, used in error messages.
    pub(crate) fn expected(&self, hint: Option<TypeHint>) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "decimal number",
            FieldKind::List { .. } => "list of strings",
            FieldKind::NumberList { .. } => "list of integers",
            FieldKind::Range if is_float(hint) => "[min, max] pair of numbers",
            FieldKind::Range => "[min, max] pair of integers",
            FieldKind::TagSet { .. } => "list of tags",
        }
    }

    /// Encode a document value into its UI representation.
    ///
    /// Fails when the value does not have the shape this kind requires.
    pub fn encode(
        &self,
        value: &Value,
        hint: Option<TypeHint>,
        path: &str,
    ) -> Result<Encoded, TypeError> {
        let fail = || TypeError::new(path, self.expected(hint), value);

        let raw = match (self, value) {
            (FieldKind::Boolean, Value::Bool(b)) => RawValue::Flag(*b),
            (FieldKind::Text, Value::String(s)) => RawValue::Text(s.clone()),
            (FieldKind::Text, Value::Null) => RawValue::Text(String::new()),
            (FieldKind::Text, Value::Number(_) | Value::Bool(_)) => {
                RawValue::Text(value.to_string())
            }
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => number_text(n),
            (FieldKind::Float, Value::Number(n)) => number_text(n),
            (FieldKind::List { separator }, Value::Array(items)) => {
                let texts = items.iter().map(item_text).collect::<Option<Vec<_>>>();
                RawValue::Text(texts.ok_or_else(fail)?.join(separator.joiner()))
            }
            (FieldKind::NumberList { separator }, Value::Array(items)) => {
                let texts = items
                    .iter()
                    .map(|item| match item {
                        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>();
                RawValue::Text(texts.ok_or_else(fail)?.join(separator.joiner()))
            }
            (FieldKind::Range, Value::Array(items)) => {
                let [Value::Number(min), Value::Number(max)] = items.as_slice() else {
                    return Err(fail());
                };
                let integral = |n: &Number| n.is_i64() || n.is_u64();
                if !is_float(hint) && !(integral(min) && integral(max)) {
                    return Err(fail());
                }
                return Ok(Encoded::Pair(number_text(min), number_text(max)));
            }
            (FieldKind::TagSet { .. }, Value::Array(items)) => {
                let mut tags = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    tags.push(item_text(item).ok_or_else(fail)?);
                }
                RawValue::Items(tags)
            }
            _ => return Err(fail()),
        };
        Ok(Encoded::Single(raw))
    }

    /// Decode a raw UI value back into a document value.
    ///
    /// For [`FieldKind::Range`] the raw value must be the two-item composite;
    /// single halves go through the assembler.
    pub fn decode(
        &self,
        raw: &RawValue,
        hint: Option<TypeHint>,
        path: &str,
    ) -> Result<Value, TypeError> {
        let fail = || TypeError::new(path, self.expected(hint), raw.describe());

        match self {
            FieldKind::Boolean => match raw {
                RawValue::Flag(b) => Ok(Value::Bool(*b)),
                RawValue::Text(s) => s.trim().parse::<bool>().map(Value::Bool).map_err(|_| fail()),
                _ => Err(fail()),
            },
            FieldKind::Text => match raw {
                RawValue::Text(s) => Ok(Value::String(s.clone())),
                RawValue::Number(n) => Ok(Value::String(n.to_string())),
                RawValue::Flag(b) => Ok(Value::String(b.to_string())),
                RawValue::Items(_) => Err(fail()),
            },
            FieldKind::Integer => decode_number(raw, false, path),
            FieldKind::Float => decode_number(raw, true, path),
            FieldKind::List { separator } => {
                let items: Vec<String> = match raw {
                    RawValue::Text(s) => separator.split(s).into_iter().map(String::from).collect(),
                    RawValue::Items(items) => trimmed(items),
                    _ => return Err(fail()),
                };
                Ok(Value::from(items))
            }
            FieldKind::NumberList { separator } => {
                let items: Vec<String> = match raw {
                    RawValue::Text(s) => separator.split(s).into_iter().map(String::from).collect(),
                    RawValue::Items(items) => trimmed(items),
                    _ => return Err(fail()),
                };
                items
                    .iter()
                    .map(|item| parse_number(item, false).ok_or_else(fail))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            FieldKind::Range => {
                let RawValue::Items(items) = raw else {
                    return Err(fail());
                };
                let [min, max] = items.as_slice() else {
                    return Err(fail());
                };
                let float = is_float(hint);
                let min = decode_number(&RawValue::Text(min.clone()), float, path)?;
                let max = decode_number(&RawValue::Text(max.clone()), float, path)?;
                Ok(Value::Array(vec![min, max]))
            }
            FieldKind::TagSet { unique } => {
                let tags = match raw {
                    RawValue::Items(items) => trimmed(items),
                    RawValue::Text(s) if s.trim().is_empty() => Vec::new(),
                    _ => return Err(fail()),
                };
                let tags = if *unique { dedup(tags) } else { tags };
                Ok(Value::from(tags))
            }
        }
    }
}

fn trimmed(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn dedup(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Classify a document value whose kind is not declared.
///
/// Checked in order: boolean, range pair (two numbers), other sequences,
/// numbers, then text. A number is a float only when it has no integer
/// representation. Sequences become tag-sets, or numeric lists when every
/// item is an integer and `sequences_as_tags` is off.
/// Returns `None` for mappings, which have no field of their own.
pub fn classify(value: &Value, sequences_as_tags: bool) -> Option<(FieldKind, Option<TypeHint>)> {
    let integral = |n: &Number| n.is_i64() || n.is_u64();

    let classified = match value {
        Value::Bool(_) => (FieldKind::Boolean, None),
        Value::Array(items) if !sequences_as_tags => match items.as_slice() {
            [Value::Number(min), Value::Number(max)] => {
                let float = !integral(min) || !integral(max);
                let hint = if float { TypeHint::Float } else { TypeHint::Integer };
                (FieldKind::Range, Some(hint))
            }
            [_, ..] if items.iter().all(|item| item.as_number().is_some_and(integral)) => (
                FieldKind::NumberList {
                    separator: Separator::Comma,
                },
                Some(TypeHint::NumberList),
            ),
            _ => (FieldKind::TagSet { unique: false }, None),
        },
        Value::Array(_) => (FieldKind::TagSet { unique: false }, None),
        Value::Number(n) if !integral(n) => (FieldKind::Float, Some(TypeHint::Float)),
        Value::Number(_) => (FieldKind::Integer, Some(TypeHint::Integer)),
        Value::String(_) | Value::Null => (FieldKind::Text, None),
        Value::Object(_) => return None,
    };
    Some(classified)
}
