//! Field paths.
//!
//! A field path is a dot separated list of segments. A segment is either a
//! plain key (`THREADS`) or an indexed-collection segment (`withdrawals[0]`)
//! that addresses one element of an ordered sequence.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Suffix of the binding that carries the lower bound of a range pair.
pub const RANGE_MIN_SUFFIX: &str = "_MIN";
/// Suffix of the binding that carries the upper bound of a range pair.
pub const RANGE_MAX_SUFFIX: &str = "_MAX";

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Element `index` of the sequence stored under `key`.
    Indexed { key: String, index: usize },
}

impl Segment {
    fn parse(path: &str, raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::malformed(path, "empty segment"));
        }

        let Some(open) = raw.find('[') else {
            if raw.contains(']') {
                return Err(PathError::malformed(path, format!("stray `]` in `{raw}`")));
            }
            return Ok(Segment::Key(raw.to_string()));
        };

        let key = &raw[..open];
        if key.is_empty() {
            return Err(PathError::malformed(
                path,
                format!("missing collection name in `{raw}`"),
            ));
        }
        let Some(inner) = raw[open + 1..].strip_suffix(']') else {
            return Err(PathError::malformed(path, format!("unterminated index in `{raw}`")));
        };
        let index = inner
            .parse::<usize>()
            .ok()
            .filter(|_| inner.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| {
                PathError::malformed(path, format!("index `{inner}` is not a non-negative integer"))
            })?;

        Ok(Segment::Indexed {
            key: key.to_string(),
            index,
        })
    }

    /// Mapping key this segment reads from.
    pub fn key(&self) -> &str {
        match self {
            Segment::Key(key) | Segment::Indexed { key, .. } => key,
        }
    }

    /// Element index for indexed-collection segments.
    pub fn index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Indexed { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Indexed { key, index } => write!(f, "{key}[{index}]"),
        }
    }
}

/// Parsed, non-empty field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Parse a dot separated path such as `EXCHANGES.withdrawals[0].retries`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::malformed(path, "empty path"));
        }
        let segments = path
            .split('.')
            .map(|raw| Segment::parse(path, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldPath(segments))
    }

    /// All segments, first to last.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Segments leading to the container of the leaf.
    pub fn parent(&self) -> &[Segment] {
        &self.0[..self.0.len() - 1]
    }

    /// Final segment.
    pub fn leaf(&self) -> &Segment {
        &self.0[self.0.len() - 1]
    }

    /// Segments of the container the leaf is written into.
    ///
    /// When the second segment is an indexed collection
    /// (`EXCHANGES.withdrawals[0].a.b`), every field below it belongs to
    /// that one element, so the container is the element itself and the
    /// intermediate segments collapse. Otherwise this is [`Self::parent`].
    pub fn container(&self) -> &[Segment] {
        if self.0.len() >= 3 && matches!(self.0[1], Segment::Indexed { .. }) {
            &self.0[..2]
        } else {
            self.parent()
        }
    }

    /// Append a segment, returning the extended path.
    pub fn join(&self, segment: Segment) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment);
        FieldPath(segments)
    }

    /// Append every segment of `tail`.
    pub fn concat(&self, tail: &FieldPath) -> FieldPath {
        let mut segments = self.0.clone();
        segments.extend(tail.0.iter().cloned());
        FieldPath(segments)
    }

    /// Path with the leaf replaced by `segment`.
    pub fn with_leaf(&self, segment: Segment) -> FieldPath {
        let mut segments = self.0.clone();
        let last = segments.len() - 1;
        segments[last] = segment;
        FieldPath(segments)
    }

    /// Path with `suffix` appended to the leaf key (`A.RANGE` -> `A.RANGE_MIN`).
    pub fn with_leaf_suffix(&self, suffix: &str) -> Result<FieldPath, PathError> {
        match self.leaf() {
            Segment::Key(key) => {
                let mut segments = self.0.clone();
                let last = segments.len() - 1;
                segments[last] = Segment::Key(format!("{key}{suffix}"));
                Ok(FieldPath(segments))
            }
            Segment::Indexed { .. } => Err(PathError::malformed(
                &self.to_string(),
                "range fields must end in a plain key",
            )),
        }
    }

    /// Inverse of [`Self::with_leaf_suffix`]; `None` if the leaf lacks the suffix.
    pub fn strip_leaf_suffix(&self, suffix: &str) -> Option<FieldPath> {
        let Segment::Key(key) = self.leaf() else {
            return None;
        };
        let base = key.strip_suffix(suffix).filter(|base| !base.is_empty())?;
        let mut segments = self.0.clone();
        let last = segments.len() - 1;
        segments[last] = Segment::Key(base.to_string());
        Some(FieldPath(segments))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// True when `key` can be used as a single plain path segment.
pub(crate) fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['.', '[', ']'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_indexed() {
        let path = FieldPath::parse("EXCHANGES.withdrawals[0].retries").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("EXCHANGES".into()),
                Segment::Indexed {
                    key: "withdrawals".into(),
                    index: 0
                },
                Segment::Key("retries".into()),
            ]
        );
        assert_eq!(path.to_string(), "EXCHANGES.withdrawals[0].retries");
        assert_eq!(path.leaf().key(), "retries");
        assert_eq!(path.segments()[1].index(), Some(0));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "A..B", ".A", "A.", "A.[1]", "A.b[", "A.b[x]", "A.b[-1]", "A.b]", "A.b[1]c"] {
            let err = FieldPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, PathError::Malformed { .. }),
                "{bad:?} gave {err:?}"
            );
            assert_eq!(err.path(), bad);
        }
    }

    #[test]
    fn test_index_rejects_sign() {
        assert!(FieldPath::parse("A.b[+1]").is_err());
    }

    #[test]
    fn test_container_collapses_indexed_second_segment() {
        let path = FieldPath::parse("EXCHANGES.withdrawals[2].limits.daily").unwrap();
        assert_eq!(path.container().len(), 2);
        assert_eq!(path.parent().len(), 3);

        let plain = FieldPath::parse("SWAPS.BEBOP.AMOUNT").unwrap();
        assert_eq!(plain.container(), plain.parent());

        let short = FieldPath::parse("A.list[1]").unwrap();
        assert_eq!(short.container(), short.parent());
    }

    #[test]
    fn test_range_suffix() {
        let base = FieldPath::parse("SETTINGS.ACCOUNTS_RANGE").unwrap();
        let min = base.with_leaf_suffix(RANGE_MIN_SUFFIX).unwrap();
        assert_eq!(min.to_string(), "SETTINGS.ACCOUNTS_RANGE_MIN");
        assert_eq!(min.strip_leaf_suffix(RANGE_MIN_SUFFIX), Some(base.clone()));
        assert_eq!(min.strip_leaf_suffix(RANGE_MAX_SUFFIX), None);
        assert_eq!(
            FieldPath::parse("A._MIN").unwrap().strip_leaf_suffix(RANGE_MIN_SUFFIX),
            None
        );
        assert!(
            FieldPath::parse("A.b[0]")
                .unwrap()
                .with_leaf_suffix(RANGE_MAX_SUFFIX)
                .is_err()
        );
    }

    #[test]
    fn test_serde_as_string() {
        let path: FieldPath = serde_json::from_str("\"A.b[3]\"").unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"A.b[3]\"");
        assert!(serde_json::from_str::<FieldPath>("\"A..b\"").is_err());
    }
}
