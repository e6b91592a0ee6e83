use cfgform::{
    ConfigStore, EditSession, FileStore,
    data::{FieldBinding, FieldKind, RawValue, Schema, TypeHint, assemble, project},
    error::CodecError,
};
use serde_json::{Value, json};

fn full_document() -> Value {
    json!({
        "SETTINGS": {
            "THREADS": 2,
            "ATTEMPTS": 5,
            "SHUFFLE_WALLETS": true,
            "WAIT_FOR_TRANSACTION_CONFIRMATION_IN_SECONDS": 120,
            "ACCOUNTS_RANGE": [0, 0],
            "EXACT_ACCOUNTS_TO_USE": [1, 4, 9],
            "PAUSE_BETWEEN_ATTEMPTS": [5, 15],
            "PAUSE_BETWEEN_SWAPS": [3, 10],
            "RANDOM_PAUSE_BETWEEN_ACCOUNTS": [3, 10],
            "RANDOM_PAUSE_BETWEEN_ACTIONS": [3, 10],
            "RANDOM_INITIALIZATION_PAUSE": [5, 20],
            "SEND_TELEGRAM_LOGS": false,
            "TELEGRAM_BOT_TOKEN": "12345:abc",
            "TELEGRAM_USERS_IDS": [235235]
        },
        "FLOW": {"SKIP_FAILED_TASKS": false},
        "FAUCET": {
            "SOLVIUM_API_KEY": "",
            "USE_CAPSOLVER": false,
            "CAPSOLVER_API_KEY": ""
        },
        "RPCS": {"MONAD_RPC": ["https://rpc-a.example", "https://rpc-b.example"]},
        "OTHERS": {"SKIP_SSL_VERIFICATION": true, "USE_PROXY_FOR_RPC": true},
        "SWAPS": {
            "BEBOP": {"BALANCE_PERCENTAGE_TO_SWAP": [5, 10], "SWAP_ALL_TO_ETH": false},
            "GTE": {"NUMBER_OF_SWAPS": [1, 3], "SWAP_ALL_TO_ETH": false}
        },
        "STAKINGS": {
            "TEKO_FINANCE": {"BALANCE_PERCENTAGE_TO_STAKE": [5, 10], "TOKENS": ["USDC", "WETH"]}
        },
        "MINTS": {
            "XL_MEME": {"BALANCE_PERCENTAGE_TO_BUY": [2, 5], "CONTRACTS_TO_BUY": ["0xabc", "0xdef"]},
            "RARIBLE": {"CONTRACTS_TO_BUY": []},
            "OMNIHUB": {"MAX_PRICE_TO_MINT": 0.00011}
        },
        "CRUSTY_SWAP": {
            "NETWORKS_TO_REFUEL_FROM": ["Arbitrum", "Base"],
            "AMOUNT_TO_REFUEL": [0.0001, 0.00015],
            "MINIMUM_BALANCE_TO_REFUEL": 0.5,
            "BRIDGE_ALL_MAX_AMOUNT": 0.01,
            "MAX_WAIT_TIME": 99999,
            "WAIT_FOR_FUNDS_TO_ARRIVE": true,
            "BRIDGE_ALL": false
        },
        "EXCHANGES": {
            "name": "OKX",
            "apiKey": "key",
            "secretKey": "secret",
            "passphrase": "pass",
            "withdrawals": [{
                "currency": "ETH",
                "networks": ["Arbitrum", "Optimism"],
                "min_amount": 0.0003,
                "max_amount": 0.0004,
                "max_balance": 0.005,
                "wait_for_funds": true,
                "max_wait_time": 99999,
                "retries": 3
            }]
        }
    })
}

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn round_trip(document: &Value) -> Value {
    init_log();
    let bindings = project(document, &Schema::builtin())
        .unwrap()
        .bindings()
        .unwrap();
    assemble(&bindings).unwrap()
}

fn edit(path: &str, kind: FieldKind, hint: Option<TypeHint>, value: RawValue) -> FieldBinding {
    FieldBinding {
        path: path.into(),
        kind,
        type_hint: hint,
        value,
    }
}

#[test]
fn test_full_document_round_trips() {
    let document = full_document();
    assert_eq!(round_trip(&document), document);
}

#[test]
fn test_round_trip_is_idempotent_after_backfill() {
    let sparse = json!({"SETTINGS": {"THREADS": 7}, "SWAPS": {"GTE": {"NUMBER_OF_SWAPS": [1, 2]}}});
    let once = round_trip(&sparse);
    assert_eq!(once["SETTINGS"]["THREADS"], json!(7));
    assert_eq!(once["SWAPS"]["GTE"]["NUMBER_OF_SWAPS"], json!([1, 2]));
    assert_eq!(round_trip(&once), once);
}

#[test]
fn test_integral_values_in_float_fields_come_back_as_floats() {
    let document = json!({
        "CRUSTY_SWAP": {"AMOUNT_TO_REFUEL": [1, 2], "MINIMUM_BALANCE_TO_REFUEL": 0}
    });
    let once = round_trip(&document);
    assert_eq!(once["CRUSTY_SWAP"]["AMOUNT_TO_REFUEL"], json!([1.0, 2.0]));
    assert_eq!(once["CRUSTY_SWAP"]["MINIMUM_BALANCE_TO_REFUEL"], json!(0.0));
    assert_ne!(once["CRUSTY_SWAP"]["MINIMUM_BALANCE_TO_REFUEL"], json!(0));
    assert_eq!(round_trip(&once), once);
}

#[test]
fn test_missing_range_is_backfilled() {
    let projection = project(&json!({"SETTINGS": {}}), &Schema::builtin()).unwrap();
    let range = projection
        .descriptors()
        .find(|d| d.path.to_string() == "SETTINGS.ACCOUNTS_RANGE")
        .unwrap();
    assert_eq!(range.value, json!([0, 0]));

    let rebuilt = round_trip(&json!({"SETTINGS": {}}));
    assert_eq!(rebuilt["SETTINGS"]["ACCOUNTS_RANGE"], json!([0, 0]));
}

#[test]
fn test_list_edits_decode() {
    let document = assemble(&[
        edit(
            "A.NAMES",
            FieldKind::List {
                separator: Default::default(),
            },
            None,
            "a, b ,c".into(),
        ),
        edit(
            "A.IDS",
            FieldKind::NumberList {
                separator: Default::default(),
            },
            Some(TypeHint::NumberList),
            "1,2,3".into(),
        ),
    ])
    .unwrap();
    assert_eq!(document, json!({"A": {"NAMES": ["a", "b", "c"], "IDS": [1, 2, 3]}}));
}

#[test]
fn test_withdrawal_edit_on_empty_document() {
    let document = assemble(&[edit(
        "EXCHANGES.withdrawals[0].retries",
        FieldKind::Integer,
        Some(TypeHint::Integer),
        "5".into(),
    )])
    .unwrap();
    assert_eq!(document, json!({"EXCHANGES": {"withdrawals": [{"retries": 5}]}}));
}

#[test]
fn test_integer_type_error_names_path() {
    let err = assemble(&[edit(
        "SETTINGS.THREADS",
        FieldKind::Integer,
        Some(TypeHint::Integer),
        "abc".into(),
    )])
    .unwrap_err();
    let CodecError::Type(err) = err else {
        panic!("expected a type error, got {err:?}");
    };
    assert_eq!(err.path, "SETTINGS.THREADS");
}

#[test]
fn test_unique_tag_set_drops_repeats() {
    let mut bindings = project(&full_document(), &Schema::builtin())
        .unwrap()
        .bindings()
        .unwrap();
    let repeated = RawValue::Items(vec!["Base".into(), "Base".into(), "Optimism".into()]);
    for binding in &mut bindings {
        if binding.path == "CRUSTY_SWAP.NETWORKS_TO_REFUEL_FROM"
            || binding.path == "STAKINGS.TEKO_FINANCE.TOKENS"
        {
            binding.value = repeated.clone();
        }
    }
    let document = assemble(&bindings).unwrap();
    assert_eq!(
        document["CRUSTY_SWAP"]["NETWORKS_TO_REFUEL_FROM"],
        json!(["Base", "Optimism"])
    );
    assert_eq!(
        document["STAKINGS"]["TEKO_FINANCE"]["TOKENS"],
        json!(["Base", "Base", "Optimism"])
    );
}

#[tokio::test]
async fn test_toml_file_round_trip_through_session() {
    init_log();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let store = FileStore::new(&path);
    store.save(&full_document()).await.unwrap();

    let mut session = EditSession::open(FileStore::new(&path), Schema::builtin())
        .await
        .unwrap();
    session.submit(&[]).await.unwrap();
    assert_eq!(session.document(), &full_document());

    session
        .submit(&[edit(
            "CRUSTY_SWAP.AMOUNT_TO_REFUEL_MAX",
            FieldKind::Range,
            Some(TypeHint::Float),
            "0.0002".into(),
        )])
        .await
        .unwrap();
    let reloaded = FileStore::new(&path).load().await.unwrap();
    assert_eq!(reloaded["CRUSTY_SWAP"]["AMOUNT_TO_REFUEL"], json!([0.0001, 0.0002]));
}
