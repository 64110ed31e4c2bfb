//! Integration tests for executors, transactions and row mapping on SQLite.
//!
//! Each test works on its own temporary database file.

use serde::{Deserialize, Serialize};
use sqlbridge::{
    ConnectionManager, Context, DatabaseConfig, DbError, Executor, QueryParam, TransactionStatus,
    params,
};
use std::time::Duration;
use tempfile::TempDir;

/// Create a SQLite database with an `accounts` table.
async fn setup_db(max_open: u32) -> (ConnectionManager, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::new("sqlite3", path.to_str().unwrap())
        .max_open_connections(max_open)
        .max_idle_connections(1);
    let manager = ConnectionManager::new(config).await.unwrap();

    manager
        .single_executor()
        .exec(
            &Context::background(),
            "CREATE TABLE accounts (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                balance INTEGER NOT NULL,
                active BOOLEAN NOT NULL DEFAULT 1,
                note TEXT
            )",
            &[],
        )
        .await
        .unwrap();

    (manager, dir)
}

async fn count(manager: &ConnectionManager) -> i64 {
    manager
        .single_executor()
        .get(&Context::background(), "SELECT COUNT(*) FROM accounts", &[])
        .await
        .unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct Account {
    id: i64,
    owner: String,
    balance: i64,
    active: bool,
    note: Option<String>,
}

#[tokio::test]
async fn test_pool_reports_configured_limits() {
    let (manager, _dir) = setup_db(3).await;

    let limits = manager.limits();
    assert_eq!(limits.max_open, 3);
    assert_eq!(limits.max_idle, 1);
    assert!(manager.status().size >= 1);

    manager.close().await;
    assert!(manager.is_closed());
    // closing again is harmless
    manager.close().await;
    assert!(manager.is_closed());
}

#[tokio::test]
async fn test_single_exec_matches_transaction_commit() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    let sql = "INSERT INTO accounts (owner, balance) VALUES (?, ?)";

    let single = manager
        .single_executor()
        .exec(&ctx, sql, &params!["alice", 100])
        .await
        .unwrap();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    let in_tx = tx.exec(&ctx, sql, &params!["bob", 50]).await.unwrap();
    tx.commit(&ctx).await.unwrap();

    assert_eq!(single.rows_affected(), in_tx.rows_affected());
    assert_eq!(single.last_insert_id(), Some(1));
    assert_eq!(in_tx.last_insert_id(), Some(2));
    assert_eq!(count(&manager).await, 2);
}

#[tokio::test]
async fn test_rollback_discards_changes() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    tx.exec(
        &ctx,
        "INSERT INTO accounts (owner, balance) VALUES (?, ?)",
        &params!["carol", 10],
    )
    .await
    .unwrap();

    // visible inside the transaction
    let inside: i64 = tx
        .get(&ctx, "SELECT COUNT(*) FROM accounts", &[])
        .await
        .unwrap();
    assert_eq!(inside, 1);

    tx.rollback(&ctx).await.unwrap();
    assert_eq!(tx.status().await, TransactionStatus::Closed);
    assert_eq!(count(&manager).await, 0);
}

#[tokio::test]
async fn test_select_and_get_map_rows() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    let db = manager.single_executor();

    for (owner, balance, note) in [("alice", 100, Some("vip")), ("bob", 50, None)] {
        db.exec(
            &ctx,
            "INSERT INTO accounts (owner, balance, note) VALUES (?, ?, ?)",
            &params![owner, balance, note],
        )
        .await
        .unwrap();
    }

    let accounts: Vec<Account> = db
        .select(&ctx, "SELECT * FROM accounts ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(
        accounts[0],
        Account {
            id: 1,
            owner: "alice".into(),
            balance: 100,
            active: true,
            note: Some("vip".into()),
        }
    );
    assert_eq!(accounts[1].note, None);

    let bob: Account = db
        .get(&ctx, "SELECT * FROM accounts WHERE owner = ?", &params!["bob"])
        .await
        .unwrap();
    assert_eq!(bob.balance, 50);

    // first row wins
    let first: (i64, String) = db
        .get(&ctx, "SELECT id, owner FROM accounts ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(first, (1, "alice".to_string()));

    let err = db
        .get::<Account>(&ctx, "SELECT * FROM accounts WHERE id = ?", &params![99])
        .await
        .unwrap_err();
    assert!(err.is_no_rows());
}

#[tokio::test]
async fn test_query_cursor() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    let db = manager.single_executor();

    let empty = db
        .query(&ctx, "SELECT owner FROM accounts", &[])
        .await
        .unwrap();
    assert_eq!(empty.remaining(), 0);

    db.exec(
        &ctx,
        "INSERT INTO accounts (owner, balance) VALUES ('a', 1), ('b', 2)",
        &[],
    )
    .await
    .unwrap();

    let mut rows = db
        .query(&ctx, "SELECT owner, balance FROM accounts ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(rows.columns(), ["owner", "balance"]);
    assert_eq!(rows.remaining(), 2);

    let first = rows.next().unwrap();
    assert_eq!(first.get::<String>("owner").unwrap(), "a");
    assert_eq!(first.get_index::<i64>(1).unwrap(), 1);
    assert!(matches!(
        first.get::<i64>("missing"),
        Err(DbError::Mapping { .. })
    ));
    assert_eq!(rows.remaining(), 1);
}

#[tokio::test]
async fn test_named_exec_with_struct() {
    #[derive(Serialize)]
    struct Owner {
        name: String,
    }

    #[derive(Serialize)]
    struct NewAccount {
        owner: Owner,
        balance: i64,
        note: Option<String>,
    }

    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    let db = manager.single_executor();

    let result = db
        .named_exec(
            &ctx,
            "INSERT INTO accounts (owner, balance, note) VALUES (:owner.name, :balance, :note)",
            &NewAccount {
                owner: Owner {
                    name: "dave".into(),
                },
                balance: 7,
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);

    let mut args = std::collections::HashMap::new();
    args.insert("min", 5);
    let rows = db
        .named_query(
            &ctx,
            "SELECT owner FROM accounts WHERE balance >= :min AND owner != ':min'",
            &args,
        )
        .await
        .unwrap();
    let owners: Vec<String> = rows.scan_all().unwrap();
    assert_eq!(owners, vec!["dave".to_string()]);

    let err = db
        .named_exec(&ctx, "DELETE FROM accounts WHERE id = :id", &args)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Mapping { .. }));
}

#[tokio::test]
async fn test_closed_transaction_rejects_everything() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    let stmt = tx
        .prepare(&ctx, "INSERT INTO accounts (owner, balance) VALUES (?, ?)")
        .await
        .unwrap();
    stmt.exec(&ctx, &params!["erin", 1]).await.unwrap();
    tx.commit_and_close(&ctx).await.unwrap();

    let closed = |err: DbError| {
        matches!(
            err,
            DbError::InvalidState {
                state: TransactionStatus::Closed,
                ..
            }
        )
    };

    assert!(closed(tx.exec(&ctx, "SELECT 1", &[]).await.unwrap_err()));
    assert!(closed(tx.query(&ctx, "SELECT 1", &[]).await.unwrap_err()));
    assert!(closed(
        tx.query_row(&ctx, "SELECT 1", &[]).await.into_row().unwrap_err()
    ));
    assert!(closed(tx.prepare(&ctx, "SELECT 1").await.unwrap_err()));
    assert!(closed(stmt.exec(&ctx, &params!["frank", 2]).await.unwrap_err()));
    assert!(closed(tx.commit(&ctx).await.unwrap_err()));
    assert!(closed(tx.rollback_and_close(&ctx).await.unwrap_err()));
    assert!(closed(tx.begin(&ctx).await.unwrap_err()));

    assert_eq!(count(&manager).await, 1);
}

#[tokio::test]
async fn test_failed_statement_keeps_transaction_open() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    let err = tx
        .exec(&ctx, "INSERT INTO missing VALUES (1)", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Query { .. }));
    assert_eq!(tx.status().await, TransactionStatus::Active);
    tx.rollback(&ctx).await.unwrap();
}

#[tokio::test]
async fn test_rebind_is_identity_for_sqlite() {
    let (manager, _dir) = setup_db(1).await;
    let db = manager.single_executor();
    let sql = "SELECT * FROM accounts WHERE owner = ? AND note = '?'";

    assert_eq!(db.rebind(sql), sql);
    assert_eq!(db.rebind(&db.rebind(sql)), sql);
}

#[tokio::test]
async fn test_query_param_types_round_trip() {
    let (manager, _dir) = setup_db(1).await;
    let ctx = Context::background();
    let db = manager.single_executor();

    let row = db
        .query_row(
            &ctx,
            "SELECT ? AS i, ? AS f, ? AS s, ? AS n, ? AS b",
            &[
                QueryParam::Int(42),
                QueryParam::Float(1.5),
                QueryParam::String("x".into()),
                QueryParam::Null,
                QueryParam::Bytes(vec![1, 2, 3]),
            ],
        )
        .await
        .into_row()
        .unwrap();

    assert_eq!(row.get::<i64>("i").unwrap(), 42);
    assert_eq!(row.get::<f64>("f").unwrap(), 1.5);
    assert_eq!(row.get::<String>("s").unwrap(), "x");
    assert_eq!(row.get::<Option<i64>>("n").unwrap(), None);
    // binary columns come back base64 encoded
    assert_eq!(row.get::<String>("b").unwrap(), "AQID");
}

#[tokio::test]
async fn test_context_cancel_and_timeout() {
    let (manager, _dir) = setup_db(1).await;
    let db = manager.single_executor();

    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();
    let err = db.exec(&ctx, "SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, DbError::Cancelled { operation: "exec" }));

    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = db
        .query(
            &ctx,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 100000000)
             SELECT COUNT(*) FROM c",
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Timeout { operation: "query", .. }));
}

#[tokio::test]
async fn test_server_version_and_ping() {
    let (manager, _dir) = setup_db(1).await;
    let ctx = Context::background();

    manager.ping(&ctx).await.unwrap();
    let version = manager.server_version(&ctx).await.unwrap();
    assert!(version.starts_with('3'));
}

#[tokio::test]
async fn test_begin_failure_leaves_transaction_unstarted() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    manager.close().await;

    let tx = manager.transaction();
    let err = tx.begin(&ctx).await.unwrap_err();
    assert!(matches!(err, DbError::Transaction { operation: "begin", .. }));
    assert!(err.is_transaction_error());
    assert_eq!(tx.status().await, TransactionStatus::Unstarted);
}

#[tokio::test]
async fn test_failed_commit_closes_transaction() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();
    let db = manager.single_executor();

    db.exec(&ctx, "CREATE TABLE parents (id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();
    db.exec(
        &ctx,
        "CREATE TABLE children (
            id INTEGER PRIMARY KEY,
            parent_id INTEGER REFERENCES parents (id) DEFERRABLE INITIALLY DEFERRED
        )",
        &[],
    )
    .await
    .unwrap();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    // the foreign key is only checked at commit
    tx.exec(&ctx, "INSERT INTO children (parent_id) VALUES (?)", &params![42])
        .await
        .unwrap();

    let err = tx.commit(&ctx).await.unwrap_err();
    assert!(matches!(err, DbError::Transaction { operation: "commit", .. }));
    assert_eq!(tx.status().await, TransactionStatus::Closed);
    assert!(matches!(
        tx.rollback(&ctx).await,
        Err(DbError::InvalidState {
            state: TransactionStatus::Closed,
            ..
        })
    ));

    let children: i64 = db
        .get(&ctx, "SELECT COUNT(*) FROM children", &[])
        .await
        .unwrap();
    assert_eq!(children, 0);
}

#[tokio::test]
async fn test_cancelled_commit_closes_transaction() {
    let (manager, _dir) = setup_db(2).await;
    let ctx = Context::background();

    let tx = manager.transaction();
    tx.begin(&ctx).await.unwrap();
    tx.exec(
        &ctx,
        "INSERT INTO accounts (owner, balance) VALUES (?, ?)",
        &params!["gina", 3],
    )
    .await
    .unwrap();

    let (cancel_ctx, handle) = Context::background().with_cancel();
    handle.cancel();
    let err = tx.commit(&cancel_ctx).await.unwrap_err();
    assert!(matches!(err, DbError::Cancelled { operation: "commit" }));
    assert_eq!(tx.status().await, TransactionStatus::Closed);

    // the dropped transaction is rolled back by the driver
    assert_eq!(count(&manager).await, 0);
}
