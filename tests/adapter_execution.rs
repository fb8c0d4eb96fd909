//! Adapter behaviour against a scripted executor.

mod common;

use buoy::query::{BindValue, Criteria, Query};
use buoy::{
    Adapter, AdapterSettings, BuoyError, DialectKind, DriverError, InsertOptions, Record, Value,
};
use common::MockExecutor;

fn adapter(dialect: DialectKind) -> Adapter<MockExecutor> {
    Adapter::new(MockExecutor::new(), AdapterSettings::for_dialect(dialect))
}

#[test]
fn test_missing_table_is_classified() {
    let db = adapter(DialectKind::Postgres);
    db.executor().push_query_error(DriverError::with_code(
        "42P01",
        "relation \"ghosts\" does not exist",
    ));
    let err = Query::new("ghosts").execute(&db).unwrap_err();
    match err {
        BuoyError::MissingDatasource { datasource, .. } => assert_eq!(datasource, "ghosts"),
        other => panic!("expected MissingDatasource, got {other:?}"),
    }
}

#[test]
fn test_sqlite_missing_table_message() {
    let db = adapter(DialectKind::Sqlite);
    db.executor()
        .push_query_error(DriverError::new("no such table: ghosts"));
    let err = Query::new("ghosts").execute(&db).unwrap_err();
    assert!(err.is_missing_datasource());
}

#[test]
fn test_other_driver_errors_keep_code() {
    let db = adapter(DialectKind::Postgres);
    db.executor()
        .push_query_error(DriverError::with_code("42601", "syntax error at or near"));
    let err = Query::new("users").execute(&db).unwrap_err();
    match err {
        BuoyError::Adapter { code, .. } => assert_eq!(code.as_deref(), Some("42601")),
        other => panic!("expected Adapter, got {other:?}"),
    }
}

#[test]
fn test_empty_result_is_not_an_error() {
    let db = adapter(DialectKind::Postgres);
    let rows = Query::new("users").execute(&db).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_read_strips_null_binds() {
    let db = adapter(DialectKind::Postgres);
    let mut query = Query::new("users");
    query.filter(
        Criteria::new()
            .with("deleted_at", Value::Null)
            .with("status", 1),
    );
    query.execute(&db).unwrap();

    let call = db.executor().last().unwrap();
    assert_eq!(
        call.sql,
        "SELECT * FROM users WHERE (deleted_at IS NULL AND status = :status1)"
    );
    assert_eq!(call.binds.keys().collect::<Vec<_>>(), vec!["status1"]);
}

#[test]
fn test_update_binds_null_data() {
    let db = adapter(DialectKind::Postgres);
    let data = Criteria::new().with("bio", Value::Null).with("age", 40);
    assert!(db.update("users", &data, Criteria::from([("id", 9)])).unwrap());

    let call = db.executor().last().unwrap();
    assert_eq!(call.sql, "UPDATE users SET bio = :bio0, age = :age1 WHERE (id = :id2)");
    assert_eq!(call.binds.get("bio0"), Some(&BindValue::Null));
    assert_eq!(call.binds.get("id2"), Some(&BindValue::Int(9)));
}

#[test]
fn test_update_without_data_skips_database() {
    let db = adapter(DialectKind::Postgres);
    assert!(!db
        .update("users", &Criteria::new(), Criteria::from([("id", 1)]))
        .unwrap());
    assert!(db.executor().calls().is_empty());
}

#[test]
fn test_create_returns_serial_id() {
    let db = adapter(DialectKind::Postgres);
    db.executor()
        .push_rows(vec![Record::from([("currval", 42)])]);
    let id = db
        .create(
            "users",
            &Criteria::from([("name", "Ada")]),
            &InsertOptions::serial("id"),
        )
        .unwrap();
    assert_eq!(id, Some(Value::Int(42)));
    assert_eq!(
        db.executor().statements(),
        vec![
            "INSERT INTO users (name) VALUES (:name)",
            "SELECT CURRVAL('users_id_seq')",
        ]
    );
}

#[test]
fn test_create_without_key_options() {
    let db = adapter(DialectKind::Mysql);
    let id = db
        .create("tags", &Criteria::from([("slug", "rust")]), &InsertOptions::default())
        .unwrap();
    assert_eq!(id, None);
    assert_eq!(db.executor().calls().len(), 1);
}

#[test]
fn test_db2_sequence_insert() {
    let db = adapter(DialectKind::Db2);
    db.executor().push_rows(vec![Record::from([("1", 7)])]);
    let options = InsertOptions::serial("ID").with_sequence("USERS_SEQ");
    let id = db
        .create("USERS", &Criteria::from([("NAME", "Ada")]), &options)
        .unwrap();
    assert_eq!(id, Some(Value::Int(7)));
    assert_eq!(
        db.executor().statements(),
        vec![
            "INSERT INTO USERS (ID, NAME) VALUES (NEXT VALUE FOR USERS_SEQ, :NAME)",
            "VALUES PREVIOUS VALUE FOR USERS_SEQ",
        ]
    );
}

#[test]
fn test_delete_returns_affected_rows() {
    let db = adapter(DialectKind::Postgres);
    let removed = db
        .delete("sessions", Criteria::from([("user_id", 3)]))
        .unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let db = adapter(DialectKind::Postgres);
    let result: buoy::Result<()> = db.transaction(|db| {
        db.delete("sessions", Criteria::new())?;
        Err(BuoyError::invalid("abort"))
    });
    assert!(matches!(result, Err(BuoyError::InvalidArgument(_))));
    assert_eq!(
        db.executor().statements(),
        vec!["BEGIN", "DELETE FROM sessions", "ROLLBACK"]
    );
    assert!(!db.in_transaction());
}

#[test]
fn test_transaction_commits() {
    let db = adapter(DialectKind::Postgres);
    let removed = db
        .transaction(|db| db.delete("sessions", Criteria::new()))
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(
        db.executor().statements(),
        vec!["BEGIN", "DELETE FROM sessions", "COMMIT"]
    );
}

#[test]
fn test_failed_begin_is_a_transaction_error() {
    let db = adapter(DialectKind::Postgres);
    db.executor()
        .fail_on("BEGIN", DriverError::new("connection reset"));
    let err = db.begin_transaction().unwrap_err();
    assert!(matches!(err, BuoyError::Transaction(_)));
    assert!(!db.in_transaction());
}

#[test]
fn test_commit_without_begin() {
    let db = adapter(DialectKind::Postgres);
    assert!(matches!(db.commit(), Err(BuoyError::Transaction(_))));
}

#[test]
fn test_count_is_memoised_per_state() {
    let db = adapter(DialectKind::Postgres);
    db.executor()
        .push_rows(vec![Record::from([("count", 12)])])
        .push_rows(vec![Record::from([("count", "3")])]);

    let mut query = Query::new("users");
    assert_eq!(query.count(&db).unwrap(), 12);
    assert_eq!(query.count(&db).unwrap(), 12);
    assert_eq!(db.executor().calls().len(), 1);

    query.filter([("active", true)]);
    assert_eq!(query.count(&db).unwrap(), 3);
    assert_eq!(
        db.executor().last().unwrap().sql,
        "SELECT COUNT(*) AS count FROM users WHERE (active = :active0)"
    );
}

#[test]
fn test_execute_and_reset_restores_snapshot() {
    let db = adapter(DialectKind::Postgres);
    let mut query = Query::new("posts");
    query.filter([("published", true)]).snapshot();

    query.filter([("author_id", 5)]).limit(1);
    query.execute_and_reset(&db).unwrap();
    assert_eq!(
        db.executor().last().unwrap().sql,
        "SELECT * FROM posts WHERE (published = :published0) AND (author_id = :author_id1) LIMIT 1"
    );

    query.execute(&db).unwrap();
    assert_eq!(
        db.executor().last().unwrap().sql,
        "SELECT * FROM posts WHERE (published = :published0)"
    );
}

#[test]
fn test_first_limits_to_one_row() {
    let db = adapter(DialectKind::Postgres);
    db.executor()
        .push_rows(vec![Record::from([("id", 1)])]);
    let row = Query::new("users")
        .first(&db, [("email", "a@b.c")])
        .unwrap();
    assert_eq!(row.and_then(|r| r.get("id").cloned()), Some(Value::Int(1)));
    assert!(db.executor().last().unwrap().sql.ends_with(" LIMIT 1"));
}

#[test]
fn test_query_log_records_statements() {
    let db = Adapter::new(
        MockExecutor::new(),
        AdapterSettings {
            query_log_limit: 2,
            ..AdapterSettings::default()
        },
    );
    db.delete("a", Criteria::new()).unwrap();
    db.delete("b", Criteria::new()).unwrap();
    db.executor()
        .push_query_error(DriverError::new("boom"));
    let _ = Query::new("c").execute(&db);

    let entries = db.query_log().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].sql, "DELETE FROM b");
    assert!(!entries[1].succeeded);
    assert_eq!(entries[1].dialect, "postgres");
}

#[test]
fn test_quoting_helpers() {
    let db = adapter(DialectKind::Mysql);
    assert_eq!(db.quote_identifier("users.name"), "`users`.`name`");
    assert_eq!(db.quote_literal(&Value::from("it's")), "'it''s'");
    assert_eq!(db.quote_literal(&Value::from(true)), "1");
}
