//! End-to-end tests: SQL text in, rows out.

use minirel::common::DEFAULT_BUFFER_POOL_SIZE;
use minirel::storage::{IdentityCodec, MemoryDevice};
use minirel::{Database, MinirelError, QueryOutput, Value};

fn open_db() -> Database {
    Database::with_parts(
        Box::new(MemoryDevice::new()),
        Box::new(IdentityCodec),
        DEFAULT_BUFFER_POOL_SIZE,
    )
    .unwrap()
}

fn rows(output: QueryOutput) -> Vec<Vec<Value>> {
    match output {
        QueryOutput::Rows { rows, .. } => rows,
        other => panic!("expected rows, got {other:?}"),
    }
}

fn count(output: QueryOutput) -> usize {
    match output {
        QueryOutput::Count(n) => n,
        other => panic!("expected count, got {other:?}"),
    }
}

fn users_db() -> Database {
    let db = open_db();
    db.execute("CREATE TABLE users (id INT NOT NULL, name VARCHAR)")
        .unwrap();
    db.execute("INSERT INTO users VALUES (1, 'Alice'), (2, 'Bob'), (3, 'Charlie')")
        .unwrap();
    db
}

#[test]
fn test_select_where_order_desc() {
    let db = users_db();

    let out = db
        .execute("SELECT * FROM users WHERE id > 1 ORDER BY id DESC")
        .unwrap();
    assert_eq!(
        rows(out),
        vec![
            vec![Value::Number(3), Value::Text("Charlie".into())],
            vec![Value::Number(2), Value::Text("Bob".into())],
        ]
    );
}

#[test]
fn test_select_like_is_case_insensitive_substring() {
    let db = open_db();
    db.execute("CREATE TABLE users (name VARCHAR)").unwrap();
    db.execute("INSERT INTO users VALUES ('Alice'), ('Bob'), ('Charlie'), ('David'), ('Eve')")
        .unwrap();

    let out = db
        .execute("SELECT name FROM users WHERE name LIKE '%a%'")
        .unwrap();
    assert_eq!(
        rows(out),
        vec![
            vec![Value::Text("Alice".into())],
            vec![Value::Text("Charlie".into())],
            vec![Value::Text("David".into())],
        ]
    );

    // Anchored variants.
    let out = db
        .execute("SELECT name FROM users WHERE name LIKE 'bo%'")
        .unwrap();
    assert_eq!(rows(out), vec![vec![Value::Text("Bob".into())]]);

    let out = db
        .execute("SELECT name FROM users WHERE name LIKE '%VE'")
        .unwrap();
    assert_eq!(rows(out), vec![vec![Value::Text("Eve".into())]]);
}

#[test]
fn test_delete_by_predicate() {
    let db = users_db();

    let out = db.execute("DELETE FROM users WHERE id = 2").unwrap();
    assert_eq!(count(out), 1);

    let out = db.execute("SELECT * FROM users").unwrap();
    assert_eq!(rows(out).len(), 2);

    // Deleting a row that is not there affects nothing.
    let out = db.execute("DELETE FROM users WHERE id = 99").unwrap();
    assert_eq!(count(out), 0);
    let out = db.execute("SELECT * FROM users").unwrap();
    assert_eq!(rows(out).len(), 2);
}

#[test]
fn test_update_rewrites_row() {
    let db = users_db();

    let out = db
        .execute("UPDATE users SET name = 'Z' WHERE id = 1")
        .unwrap();
    assert_eq!(count(out), 1);

    let out = db.execute("SELECT name FROM users WHERE id = 1").unwrap();
    assert_eq!(rows(out), vec![vec![Value::Text("Z".into())]]);

    // The other rows are untouched.
    let out = db.execute("SELECT * FROM users").unwrap();
    assert_eq!(rows(out).len(), 3);
}

#[test]
fn test_insert_batch_with_unique_violation_is_all_or_nothing() {
    let db = open_db();
    db.execute("CREATE TABLE t (id INT UNIQUE, name VARCHAR)")
        .unwrap();
    db.execute("INSERT INTO t VALUES (1, 'kept')").unwrap();

    // The second row collides with the stored one; nothing from the batch
    // may land.
    let err = db
        .execute("INSERT INTO t VALUES (2, 'a'), (1, 'dup'), (3, 'b')")
        .unwrap_err();
    assert!(matches!(err, MinirelError::UniqueViolation { .. }));

    let out = db.execute("SELECT * FROM t").unwrap();
    assert_eq!(rows(out).len(), 1);

    // A collision inside the batch itself is rejected the same way.
    let err = db
        .execute("INSERT INTO t VALUES (5, 'x'), (5, 'y')")
        .unwrap_err();
    assert!(matches!(err, MinirelError::DuplicateInBatch { .. }));
    let out = db.execute("SELECT * FROM t").unwrap();
    assert_eq!(rows(out).len(), 1);
}

#[test]
fn test_autoincrement_continues_from_max() {
    let db = open_db();
    db.execute("CREATE TABLE t (id INT PRIMARY KEY AUTOINCREMENT, tag VARCHAR)")
        .unwrap();

    db.execute("INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap();
    db.execute("INSERT INTO t VALUES (5, 'explicit')").unwrap();

    // NULL asks the engine for max(existing) + 1.
    db.execute("INSERT INTO t VALUES (NULL, 'next')").unwrap();

    let out = db
        .execute("SELECT id FROM t WHERE tag = 'next'")
        .unwrap();
    assert_eq!(rows(out), vec![vec![Value::Number(6)]]);
}

#[test]
fn test_not_null_enforced() {
    let db = open_db();
    db.execute("CREATE TABLE t (id INT NOT NULL, note VARCHAR)")
        .unwrap();

    let err = db
        .execute("INSERT INTO t VALUES (NULL, 'x')")
        .unwrap_err();
    assert!(matches!(err, MinirelError::NotNullViolation(_)));

    // Nullable columns accept NULL and report it back.
    db.execute("INSERT INTO t VALUES (1, NULL)").unwrap();
    let out = db.execute("SELECT note FROM t WHERE note IS NULL").unwrap();
    assert_eq!(rows(out), vec![vec![Value::Null]]);
}

#[test]
fn test_where_precedence_and_parentheses() {
    let db = open_db();
    db.execute("CREATE TABLE t (a INT, b INT)").unwrap();
    db.execute("INSERT INTO t VALUES (1, 1), (1, 2), (2, 1), (2, 2)")
        .unwrap();

    // AND binds tighter: a = 1 OR (b = 2 AND a = 2).
    let out = db
        .execute("SELECT a, b FROM t WHERE a = 1 OR b = 2 AND a = 2")
        .unwrap();
    assert_eq!(rows(out).len(), 3);

    let out = db
        .execute("SELECT a, b FROM t WHERE (a = 1 OR b = 2) AND a = 2")
        .unwrap();
    assert_eq!(rows(out), vec![vec![Value::Number(2), Value::Number(2)]]);
}

#[test]
fn test_order_limit_offset() {
    let db = open_db();
    db.execute("CREATE TABLE t (n INT)").unwrap();
    db.execute("INSERT INTO t VALUES (4), (1), (3), (5), (2)")
        .unwrap();

    let out = db
        .execute("SELECT n FROM t ORDER BY n ASC LIMIT 2 OFFSET 1")
        .unwrap();
    assert_eq!(
        rows(out),
        vec![vec![Value::Number(2)], vec![Value::Number(3)]]
    );
}

#[test]
fn test_semantic_errors() {
    let db = open_db();

    assert!(matches!(
        db.execute("SELECT * FROM missing").unwrap_err(),
        MinirelError::TableNotFound(_)
    ));

    db.execute("CREATE TABLE t (a INT)").unwrap();
    assert!(matches!(
        db.execute("CREATE TABLE t (a INT)").unwrap_err(),
        MinirelError::TableAlreadyExists(_)
    ));
    assert!(matches!(
        db.execute("SELECT * FROM t WHERE ghost = 1").unwrap_err(),
        MinirelError::ColumnNotFound(_)
    ));
    assert!(matches!(
        db.execute("INSERT INTO t VALUES ('wrong type')").unwrap_err(),
        MinirelError::TypeMismatch { .. }
    ));
}

#[test]
fn test_syntax_errors_leave_no_side_effects() {
    let db = open_db();
    db.execute("CREATE TABLE t (a INT)").unwrap();

    assert!(db.execute("INSERT INTO t VALUES (1,").is_err());
    assert!(db.execute("SELECT FROM t").is_err());
    assert!(db.execute("SELECT * FROM t WHERE a = NULL").is_err());
    assert!(db.execute("SELECT * FROM t WHERE a IS 3").is_err());

    let out = db.execute("SELECT * FROM t").unwrap();
    assert!(rows(out).is_empty());
}

#[test]
fn test_many_rows_across_many_pages() {
    let db = open_db();
    db.execute("CREATE TABLE logs (seq INT, body VARCHAR)").unwrap();

    // Enough data to spill over several pages through a small pool.
    let filler = "x".repeat(120);
    for i in 0..200 {
        db.execute(&format!("INSERT INTO logs VALUES ({i}, '{filler}')"))
            .unwrap();
    }

    let out = db.execute("SELECT seq FROM logs WHERE seq >= 150").unwrap();
    assert_eq!(rows(out).len(), 50);

    let out = db
        .execute("SELECT seq FROM logs ORDER BY seq DESC LIMIT 1")
        .unwrap();
    assert_eq!(rows(out), vec![vec![Value::Number(199)]]);
}

#[test]
fn test_database_reopen_preserves_catalog_and_rows() {
    let temp = tempfile::NamedTempFile::new().unwrap();

    {
        let db = Database::open(temp.path()).unwrap();
        db.execute("CREATE TABLE kv (k VARCHAR, v VARCHAR)").unwrap();
        db.execute("INSERT INTO kv VALUES ('lang', 'rust'), ('fmt', 'pages')")
            .unwrap();
        db.close().unwrap();
    }

    let db = Database::open(temp.path()).unwrap();
    let out = db.execute("SELECT v FROM kv WHERE k = 'lang'").unwrap();
    assert_eq!(rows(out), vec![vec![Value::Text("rust".into())]]);

    db.execute("INSERT INTO kv VALUES ('new', 'row')").unwrap();
    let out = db.execute("SELECT * FROM kv").unwrap();
    assert_eq!(rows(out).len(), 3);
}
