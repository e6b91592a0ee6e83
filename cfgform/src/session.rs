//! One edit session: load, project, merge edits, assemble, save, reload.

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    data::{
        assemble::assemble,
        field::FieldBinding,
        project::{Projection, project},
        schema::Schema,
    },
    error::{CodecError, TypeError},
    transport::{ConfigStore, TransportError},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A loaded document and its projection, backed by a [`ConfigStore`].
///
/// The document is replaced only by a successful reload; a failed submit
/// leaves both the session and the store as they were.
#[derive(Debug)]
pub struct EditSession<S> {
    store: S,
    schema: Schema,
    document: Value,
    projection: Projection,
}

impl<S: ConfigStore> EditSession<S> {
    /// Load the document from `store` and project it.
    pub async fn open(store: S, schema: Schema) -> Result<Self, SessionError> {
        let document = store.load().await?;
        let projection = project(&document, &schema)?;
        Ok(EditSession {
            store,
            schema,
            document,
            projection,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Flat bindings of the current projection.
    pub fn bindings(&self) -> Result<Vec<FieldBinding>, CodecError> {
        self.projection.bindings()
    }

    /// Document that submitting `edits` would save.
    ///
    /// Edits keep the kind and hint of the projected field with the same
    /// path and only contribute their value; an edit declaring another kind
    /// is a [`TypeError`]. Edits for unknown paths are applied after all
    /// known ones. The result must project again under the session schema.
    pub fn prepare(&self, edits: &[FieldBinding]) -> Result<Value, CodecError> {
        let mut bindings = self.bindings()?;
        for edit in edits {
            let edit = self.conform(edit, &bindings)?;
            match bindings.iter_mut().find(|b| b.path == edit.path) {
                Some(current) => *current = edit,
                None => bindings.push(edit),
            }
        }

        let document = assemble(&bindings)?;
        project(&document, &self.schema)?;

        let dropped = dropped_paths(&self.document, &document);
        if !dropped.is_empty() {
            warn!("values not covered by the schema will be dropped: {dropped:?}");
        }
        Ok(document)
    }

    /// Assemble `edits` over the current state, save, and reload.
    pub async fn submit(&mut self, edits: &[FieldBinding]) -> Result<(), SessionError> {
        let document = self.prepare(edits)?;
        self.store.save(&document).await?;
        info!("saved {} edits", edits.len());
        self.reload().await
    }

    /// Replace the document and projection with a fresh load.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let document = self.store.load().await?;
        let projection = project(&document, &self.schema)?;
        self.document = document;
        self.projection = projection;
        Ok(())
    }

    fn conform(&self, edit: &FieldBinding, bindings: &[FieldBinding]) -> Result<FieldBinding, CodecError> {
        let known = match bindings.iter().find(|b| b.path == edit.path) {
            Some(b) => Some((b.kind, b.type_hint)),
            // suffix-less range composites address the descriptor itself
            None => self
                .projection
                .sections
                .iter()
                .flat_map(|s| &s.groups)
                .flat_map(|g| &g.fields)
                .find(|d| d.path.to_string() == edit.path)
                .map(|d| (d.kind, d.type_hint)),
        };
        let Some((kind, hint)) = known else {
            return Ok(edit.clone());
        };

        let hint_differs = edit.type_hint.is_some() && edit.type_hint != hint;
        if kind != edit.kind || hint_differs {
            return Err(TypeError::new(
                &edit.path,
                kind.expected(hint),
                format!("{} edit", edit.kind.expected(edit.type_hint)),
            )
            .into());
        }
        Ok(FieldBinding {
            path: edit.path.clone(),
            kind,
            type_hint: hint,
            value: edit.value.clone(),
        })
    }
}

/// Paths present in `before` that `after` no longer holds.
///
/// Containers present on both sides are compared entry by entry, so a
/// single undeclared key inside a known table is reported by its full path.
pub fn dropped_paths(before: &Value, after: &Value) -> Vec<String> {
    let mut dropped = Vec::new();
    collect_dropped(before, after, String::new(), &mut dropped);
    dropped
}

fn collect_dropped(before: &Value, after: &Value, prefix: String, out: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, value) in old {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match new.get(key) {
                    Some(next) => collect_dropped(value, next, path, out),
                    None => out.push(path),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            for (i, value) in old.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                match new.get(i) {
                    Some(next) => collect_dropped(value, next, path, out),
                    None => out.push(path),
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::kind::{FieldKind, RawValue, TypeHint};
    use serde_json::json;
    use std::sync::Mutex;

    struct MemoryStore {
        document: Mutex<Value>,
        fail_saves: bool,
    }

    impl MemoryStore {
        fn new(document: Value) -> Self {
            MemoryStore {
                document: Mutex::new(document),
                fail_saves: false,
            }
        }

        fn current(&self) -> Value {
            self.document.lock().unwrap().clone()
        }
    }

    impl ConfigStore for MemoryStore {
        async fn load(&self) -> Result<Value, TransportError> {
            Ok(self.current())
        }

        async fn save(&self, document: &Value) -> Result<(), TransportError> {
            if self.fail_saves {
                return Err(TransportError::new("disk full"));
            }
            *self.document.lock().unwrap() = document.clone();
            Ok(())
        }
    }

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn edit(path: &str, kind: FieldKind, hint: Option<TypeHint>, value: RawValue) -> FieldBinding {
        FieldBinding {
            path: path.into(),
            kind,
            type_hint: hint,
            value,
        }
    }

    #[tokio::test]
    async fn test_submit_merges_edits_over_current_values() {
        let store = MemoryStore::new(json!({"SETTINGS": {"THREADS": 4, "ATTEMPTS": 2}}));
        let mut session = EditSession::open(store, Schema::builtin()).await.unwrap();

        session
            .submit(&[edit(
                "SETTINGS.THREADS",
                FieldKind::Integer,
                Some(TypeHint::Integer),
                "8".into(),
            )])
            .await
            .unwrap();

        let saved = session.store().current();
        assert_eq!(saved["SETTINGS"]["THREADS"], json!(8));
        assert_eq!(saved["SETTINGS"]["ATTEMPTS"], json!(2));
        assert_eq!(saved["SETTINGS"]["ACCOUNTS_RANGE"], json!([0, 0]));
        assert_eq!(session.document(), &saved);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_unchanged() {
        let original = json!({"SETTINGS": {"THREADS": 4}});
        let store = MemoryStore {
            document: Mutex::new(original.clone()),
            fail_saves: true,
        };
        let mut session = EditSession::open(store, Schema::builtin()).await.unwrap();
        let before = session.projection().clone();

        let err = session
            .submit(&[edit("SETTINGS.THREADS", FieldKind::Integer, None, "9".into())])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(session.document(), &original);
        assert_eq!(session.projection(), &before);
        assert_eq!(session.store().current(), original);
    }

    #[tokio::test]
    async fn test_bad_edit_is_rejected_before_save() {
        let original = json!({"SETTINGS": {"THREADS": 4}});
        let mut session = EditSession::open(MemoryStore::new(original.clone()), Schema::builtin())
            .await
            .unwrap();
        let err = session
            .submit(&[edit("SETTINGS.THREADS", FieldKind::Integer, None, "abc".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Codec(CodecError::Type(_))));
        assert_eq!(session.store().current(), original);
    }

    #[tokio::test]
    async fn test_range_composite_edit_overrides_halves() {
        let session = EditSession::open(MemoryStore::new(json!({})), Schema::builtin())
            .await
            .unwrap();
        let doc = session
            .prepare(&[edit(
                "SETTINGS.ACCOUNTS_RANGE",
                FieldKind::Range,
                Some(TypeHint::Integer),
                RawValue::Items(vec!["2".into(), "9".into()]),
            )])
            .unwrap();
        assert_eq!(doc["SETTINGS"]["ACCOUNTS_RANGE"], json!([2, 9]));
    }

    #[tokio::test]
    async fn test_edit_cannot_change_field_kind() {
        init_log();
        let original = json!({"SETTINGS": {"THREADS": 4}});
        let mut session = EditSession::open(MemoryStore::new(original.clone()), Schema::builtin())
            .await
            .unwrap();

        let err = session
            .submit(&[edit("SETTINGS.THREADS", FieldKind::Text, None, "many".into())])
            .await
            .unwrap_err();
        let SessionError::Codec(CodecError::Type(err)) = err else {
            panic!("expected a type error");
        };
        assert_eq!(err.path, "SETTINGS.THREADS");
        assert_eq!(err.expected, "integer");
        assert_eq!(session.store().current(), original);

        let reopened = EditSession::open(MemoryStore::new(session.store().current()), Schema::builtin()).await;
        assert!(reopened.is_ok());
    }

    #[tokio::test]
    async fn test_edit_cannot_change_type_hint() {
        init_log();
        let session = EditSession::open(MemoryStore::new(json!({})), Schema::builtin())
            .await
            .unwrap();
        let err = session
            .prepare(&[edit(
                "CRUSTY_SWAP.AMOUNT_TO_REFUEL_MIN",
                FieldKind::Range,
                Some(TypeHint::Integer),
                "1".into(),
            )])
            .unwrap_err();
        assert_eq!(err.path(), "CRUSTY_SWAP.AMOUNT_TO_REFUEL_MIN");
    }

    #[tokio::test]
    async fn test_edit_without_hint_takes_projected_one() {
        init_log();
        let session = EditSession::open(MemoryStore::new(json!({})), Schema::builtin())
            .await
            .unwrap();
        let doc = session
            .prepare(&[edit(
                "CRUSTY_SWAP.AMOUNT_TO_REFUEL_MAX",
                FieldKind::Range,
                None,
                "2".into(),
            )])
            .unwrap();
        assert_eq!(doc["CRUSTY_SWAP"]["AMOUNT_TO_REFUEL"][1], json!(2.0));
    }

    #[test]
    fn test_dropped_paths_reach_nested_keys() {
        let before = json!({
            "SETTINGS": {"THREADS": 4, "NEW_OPTION": true},
            "EXTRA": {"a": 1},
            "LIST": [{"x": 1}, {"x": 2}]
        });
        let after = json!({
            "SETTINGS": {"THREADS": 8},
            "LIST": [{"x": 1}]
        });
        assert_eq!(
            dropped_paths(&before, &after),
            vec!["SETTINGS.NEW_OPTION", "EXTRA", "LIST[1]"]
        );
        assert!(dropped_paths(&after, &after).is_empty());
    }
}
