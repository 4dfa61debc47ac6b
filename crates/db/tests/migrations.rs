mod support;

use rusqlite::Connection;
use support::setup_db;

#[test]
fn migrate_is_idempotent() {
    let mut test_db = setup_db();
    test_db.db.migrate().expect("second migrate");
    let applied = test_db.db.applied_migrations().expect("applied");
    assert_eq!(applied, vec!["0001_init", "0002_add_daily_rollup"]);
    assert!(test_db.db.ping().expect("ping"));
}

#[test]
fn migrate_creates_reference_and_rollup_tables() {
    let test_db = setup_db();
    let conn = Connection::open(&test_db.path).expect("open conn");
    for table in [
        "emission_record",
        "alert",
        "region_intensity",
        "emission_budget",
        "daily_emission_rollup",
    ] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .expect("table lookup");
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[test]
fn migrate_upgrades_a_database_created_before_rollups() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("legacy.sqlite");
    {
        let conn = Connection::open(&db_path).expect("open conn");
        conn.execute_batch(include_str!("../migrations/0001_init.sql"))
            .expect("migrate 0001");
        conn.execute_batch(
            r#"
            CREATE TABLE schema_migration (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL);
            INSERT INTO schema_migration (name, applied_at)
            VALUES ('0001_init', '2025-01-01T00:00:00.000Z');
            "#,
        )
        .expect("record 0001");
    }

    let mut db = verdant_db::Db::open(&db_path).expect("open db");
    db.migrate().expect("migrate db");
    assert_eq!(
        db.applied_migrations().expect("applied"),
        vec!["0001_init", "0002_add_daily_rollup"]
    );
}
