//! Document schema registry.
//!
//! The registry declares which sections exist, how each section is split
//! into groups, and which kind, type hint and default every declared field
//! has. Numeric fields declare integer or float here, once, instead of the
//! kind being guessed from the field name.
//!
//! A registry can be loaded from JSON or TOML; [`Schema::builtin`] carries
//! the default layout.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    data::{
        kind::{FieldKind, Separator, TypeHint},
        path::{FieldPath, Segment},
    },
    error::PathError,
};

/// Errors raised while loading or validating a registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported schema file extension: {0:?}")]
    UnsupportedFormat(String),

    #[error("invalid JSON schema file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML schema file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("section `{section}`: {source}")]
    Path {
        section: String,
        #[source]
        source: PathError,
    },

    #[error("duplicate section id `{0}`")]
    DuplicateSection(String),
}

/// Full registry: sections in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub sections: Vec<Section>,
}

/// One top-level section, bound to one root key of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Root key of the document this section edits.
    pub key: String,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A titled group of fields inside a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub title: String,
    pub source: GroupSource,
}

/// Where a group's fields come from.
///
/// All paths are relative to the section key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GroupSource {
    /// A declared list of fields under `base` (the section root when empty).
    Fields {
        #[serde(default)]
        base: Option<String>,
        fields: Vec<FieldSpec>,
    },
    /// Every entry of the mapping at `base`, discovered from the document.
    ///
    /// Kinds come from `overrides` when a key is listed there and from the
    /// value shape otherwise. The group is skipped when the mapping is absent.
    Entries {
        #[serde(default)]
        base: Option<String>,
        #[serde(default)]
        overrides: Vec<FieldSpec>,
        /// Render every sequence as a tag-set.
        #[serde(default)]
        sequences_as_tags: bool,
    },
    /// Element `index` of the sequence at `collection`, with declared fields.
    ///
    /// The element is synthesized from defaults when the sequence is too short.
    Record {
        collection: String,
        #[serde(default)]
        index: usize,
        fields: Vec<FieldSpec>,
    },
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key, or dotted path, relative to the group base.
    pub key: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<TypeHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        FieldSpec {
            key: key.into(),
            kind,
            hint: None,
            label: None,
            default: None,
            read_only: false,
            choices: Vec::new(),
        }
    }

    pub fn boolean(key: &str) -> Self {
        Self::new(key, FieldKind::Boolean)
    }

    pub fn text(key: &str) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn integer(key: &str) -> Self {
        Self::new(key, FieldKind::Integer)
    }

    pub fn float(key: &str) -> Self {
        Self::new(key, FieldKind::Float)
    }

    pub fn range(key: &str) -> Self {
        Self::new(key, FieldKind::Range)
    }

    /// Range whose bounds are decimals.
    pub fn float_range(key: &str) -> Self {
        Self::range(key).with_hint(TypeHint::Float)
    }

    pub fn list(key: &str, separator: Separator) -> Self {
        Self::new(key, FieldKind::List { separator })
    }

    pub fn number_list(key: &str, separator: Separator) -> Self {
        Self::new(key, FieldKind::NumberList { separator })
    }

    pub fn tags(key: &str) -> Self {
        Self::new(key, FieldKind::TagSet { unique: false })
    }

    /// Tag-set that drops repeated tags.
    pub fn unique_tags(key: &str) -> Self {
        Self::new(key, FieldKind::TagSet { unique: true })
    }

    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Always shows, and writes back, the default value.
    pub fn fixed(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.read_only = true;
        self
    }

    /// Declared hint, or the one the kind implies.
    pub fn type_hint(&self) -> Option<TypeHint> {
        self.hint.or(self.kind.default_hint())
    }

    /// Declared default, or the empty value of the kind.
    pub fn default_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.empty_value(self.type_hint()))
    }

    /// Relative path of this field.
    pub fn relative_path(&self) -> Result<FieldPath, PathError> {
        FieldPath::parse(&self.key)
    }
}

impl Group {
    fn new(title: &str, source: GroupSource) -> Self {
        Group {
            title: title.to_string(),
            source,
        }
    }

    /// Declared fields directly under the section key.
    pub fn fields(title: &str, fields: Vec<FieldSpec>) -> Self {
        Self::new(title, GroupSource::Fields { base: None, fields })
    }

    /// Discovered entries of the mapping `base` under the section key.
    pub fn entries(title: &str, base: Option<&str>, overrides: Vec<FieldSpec>) -> Self {
        Self::new(
            title,
            GroupSource::Entries {
                base: base.map(String::from),
                overrides,
                sequences_as_tags: false,
            },
        )
    }

    /// Declared record at `collection[index]` under the section key.
    pub fn record(title: &str, collection: &str, index: usize, fields: Vec<FieldSpec>) -> Self {
        Self::new(
            title,
            GroupSource::Record {
                collection: collection.to_string(),
                index,
                fields,
            },
        )
    }
}

impl Section {
    /// Path of the section's root key.
    pub fn root(&self) -> Result<FieldPath, PathError> {
        FieldPath::parse(&self.key)
    }

    fn new(id: &str, title: &str, key: &str, groups: Vec<Group>) -> Self {
        Section {
            id: id.to_string(),
            title: title.to_string(),
            key: key.to_string(),
            groups,
        }
    }
}

impl GroupSource {
    /// Absolute base path of this source inside `section`.
    pub fn base_path(&self, section: &FieldPath) -> Result<FieldPath, PathError> {
        match self {
            GroupSource::Fields { base, .. } | GroupSource::Entries { base, .. } => match base {
                Some(base) if !base.is_empty() => Ok(section.concat(&FieldPath::parse(base)?)),
                _ => Ok(section.clone()),
            },
            GroupSource::Record {
                collection, index, ..
            } => {
                let collection = section.concat(&FieldPath::parse(collection)?);
                let Segment::Key(key) = collection.leaf() else {
                    return Err(PathError::malformed(
                        &collection.to_string(),
                        "record collection must end in a plain key",
                    ));
                };
                Ok(collection.with_leaf(Segment::Indexed {
                    key: key.clone(),
                    index: *index,
                }))
            }
        }
    }

    /// Declared field specs of this source.
    pub fn specs(&self) -> &[FieldSpec] {
        match self {
            GroupSource::Fields { fields, .. } | GroupSource::Record { fields, .. } => fields,
            GroupSource::Entries { overrides, .. } => overrides,
        }
    }
}

impl Schema {
    /// Load a registry from a `.json` or `.toml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        Self::from_str_with_format(&content, ext)
    }

    /// Parse a registry from `content` in the format named by `ext`.
    pub fn from_str_with_format(content: &str, ext: &str) -> Result<Self, SchemaError> {
        let schema: Schema = match ext {
            "json" => serde_json::from_str(content)?,
            "toml" => toml::from_str(content)?,
            other => return Err(SchemaError::UnsupportedFormat(other.to_string())),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check section ids are unique and every declared path parses.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut ids = HashSet::new();
        for section in &self.sections {
            if !ids.insert(section.id.as_str()) {
                return Err(SchemaError::DuplicateSection(section.id.clone()));
            }
            let wrap = |source| SchemaError::Path {
                section: section.id.clone(),
                source,
            };
            let root = section.root().map_err(wrap)?;
            for group in &section.groups {
                group.source.base_path(&root).map_err(wrap)?;
                for spec in group.source.specs() {
                    spec.relative_path().map_err(wrap)?;
                }
            }
        }
        Ok(())
    }

    /// The default layout.
    pub fn builtin() -> Self {
        let networks = ["Arbitrum", "Optimism", "Base"];

        Schema {
            sections: vec![
                Section::new(
                    "settings",
                    "Settings",
                    "SETTINGS",
                    vec![
                        Group::fields(
                            "Basic Settings",
                            vec![
                                FieldSpec::integer("THREADS").with_default(json!(1)),
                                FieldSpec::integer("ATTEMPTS").with_default(json!(5)),
                                FieldSpec::boolean("SHUFFLE_WALLETS"),
                                FieldSpec::integer("WAIT_FOR_TRANSACTION_CONFIRMATION_IN_SECONDS")
                                    .with_default(json!(120)),
                            ],
                        ),
                        Group::fields(
                            "Account Settings",
                            vec![
                                FieldSpec::range("ACCOUNTS_RANGE"),
                                FieldSpec::number_list("EXACT_ACCOUNTS_TO_USE", Separator::Space),
                            ],
                        ),
                        Group::fields(
                            "Timing Settings",
                            vec![
                                FieldSpec::range("PAUSE_BETWEEN_ATTEMPTS"),
                                FieldSpec::range("PAUSE_BETWEEN_SWAPS"),
                                FieldSpec::range("RANDOM_PAUSE_BETWEEN_ACCOUNTS"),
                                FieldSpec::range("RANDOM_PAUSE_BETWEEN_ACTIONS"),
                                FieldSpec::range("RANDOM_INITIALIZATION_PAUSE"),
                            ],
                        ),
                        Group::fields(
                            "Telegram Settings",
                            vec![
                                FieldSpec::boolean("SEND_TELEGRAM_LOGS"),
                                FieldSpec::text("TELEGRAM_BOT_TOKEN"),
                                FieldSpec::number_list("TELEGRAM_USERS_IDS", Separator::Space),
                            ],
                        ),
                    ],
                ),
                Section::new(
                    "flow",
                    "Flow",
                    "FLOW",
                    vec![Group::fields(
                        "Flow Settings",
                        vec![FieldSpec::boolean("SKIP_FAILED_TASKS")],
                    )],
                ),
                Section::new(
                    "faucet",
                    "Faucet and Captcha",
                    "FAUCET",
                    vec![Group::fields(
                        "Captcha Solvers",
                        vec![
                            FieldSpec::text("SOLVIUM_API_KEY"),
                            FieldSpec::boolean("USE_CAPSOLVER"),
                            FieldSpec::text("CAPSOLVER_API_KEY"),
                        ],
                    )],
                ),
                Section::new(
                    "rpcs",
                    "RPCs",
                    "RPCS",
                    vec![Group::new(
                        "RPC Settings",
                        GroupSource::Entries {
                            base: None,
                            overrides: Vec::new(),
                            sequences_as_tags: true,
                        },
                    )],
                ),
                Section::new(
                    "others",
                    "Others",
                    "OTHERS",
                    vec![Group::fields(
                        "Other Settings",
                        vec![
                            FieldSpec::boolean("SKIP_SSL_VERIFICATION"),
                            FieldSpec::boolean("USE_PROXY_FOR_RPC"),
                        ],
                    )],
                ),
                Section::new(
                    "swaps",
                    "Swaps",
                    "SWAPS",
                    vec![
                        Group::entries("Bebop Swap Settings", Some("BEBOP"), Vec::new()),
                        Group::entries("GTE Swap Settings", Some("GTE"), Vec::new()),
                    ],
                ),
                Section::new(
                    "stakings",
                    "Stakings",
                    "STAKINGS",
                    vec![Group::entries(
                        "Teko Finance Settings",
                        Some("TEKO_FINANCE"),
                        Vec::new(),
                    )],
                ),
                Section::new(
                    "mints",
                    "Mints",
                    "MINTS",
                    vec![
                        Group::entries(
                            "XL Meme Settings",
                            Some("XL_MEME"),
                            vec![FieldSpec::tags("CONTRACTS_TO_BUY")],
                        ),
                        Group::entries(
                            "Rarible Settings",
                            Some("RARIBLE"),
                            vec![FieldSpec::tags("CONTRACTS_TO_BUY")],
                        ),
                        Group::entries("OmniHub Settings", Some("OMNIHUB"), Vec::new()),
                    ],
                ),
                Section::new(
                    "crustyswap",
                    "Crusty Swap",
                    "CRUSTY_SWAP",
                    vec![Group::fields(
                        "Crusty Swap Settings",
                        vec![
                            FieldSpec::unique_tags("NETWORKS_TO_REFUEL_FROM")
                                .with_label("Networks to refuel from")
                                .with_choices(&networks),
                            FieldSpec::float_range("AMOUNT_TO_REFUEL")
                                .with_label("Amount")
                                .with_default(json!([0.0001, 0.00015])),
                            FieldSpec::float("MINIMUM_BALANCE_TO_REFUEL")
                                .with_label("Minimum balance to refuel"),
                            FieldSpec::float("BRIDGE_ALL_MAX_AMOUNT")
                                .with_label("Bridge all max amount")
                                .with_default(json!(0.01)),
                            FieldSpec::integer("MAX_WAIT_TIME").with_default(json!(99999)),
                            FieldSpec::boolean("WAIT_FOR_FUNDS_TO_ARRIVE")
                                .with_label("Wait for funds to arrive"),
                            FieldSpec::boolean("BRIDGE_ALL").with_label("Bridge all"),
                        ],
                    )],
                ),
                Section::new(
                    "exchanges",
                    "Exchanges",
                    "EXCHANGES",
                    vec![
                        Group::fields(
                            "Exchange Settings",
                            vec![
                                FieldSpec::text("name")
                                    .with_label("Name")
                                    .with_choices(&["OKX", "BITGET"])
                                    .with_default(json!("OKX")),
                                FieldSpec::text("apiKey").with_label("API Key"),
                                FieldSpec::text("secretKey").with_label("Secret Key"),
                                FieldSpec::text("passphrase").with_label("Passphrase"),
                            ],
                        ),
                        Group::record(
                            "Withdrawal Settings",
                            "withdrawals",
                            0,
                            vec![
                                FieldSpec::text("currency")
                                    .with_label("Currency")
                                    .fixed(json!("ETH")),
                                FieldSpec::unique_tags("networks")
                                    .with_label("Networks")
                                    .with_choices(&networks),
                                FieldSpec::float("min_amount")
                                    .with_label("Min amount")
                                    .with_default(json!(0.0003)),
                                FieldSpec::float("max_amount")
                                    .with_label("Max amount")
                                    .with_default(json!(0.0004)),
                                FieldSpec::float("max_balance")
                                    .with_label("Max balance")
                                    .with_default(json!(0.005)),
                                FieldSpec::boolean("wait_for_funds").with_label("Wait for funds"),
                                FieldSpec::integer("max_wait_time")
                                    .with_label("Max wait time")
                                    .with_default(json!(99999)),
                                FieldSpec::integer("retries")
                                    .with_label("Retries")
                                    .with_default(json!(3)),
                            ],
                        ),
                    ],
                ),
            ],
        }
    }

    /// Section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}
