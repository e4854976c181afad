use std::fs;

use rusqlite::Connection;
use stashbook_client::PROFILES;
use stashbook_client::setup::ensure_initialized_at;
use stashbook_client::state::map_io_error;
use tempfile::tempdir;

fn object_exists(connection: &Connection, object_type: &str, object_name: &str) -> bool {
    connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [object_type, object_name],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count == 1)
        .unwrap_or(false)
}

fn user_version(connection: &Connection) -> Option<i64> {
    connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .ok()
}

#[test]
fn setup_creates_ledger_db_at_home_override() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");

        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            assert!(setup_context.db_path.ends_with("ledger.db"));
            assert_eq!(setup_context.schema_version, "v1");
            assert!(home.join("ledger.db").exists());
        }
    }
}

#[test]
fn setup_is_idempotent_for_existing_ledger() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");

        let first = ensure_initialized_at(&home);
        assert!(first.is_ok());
        let second = ensure_initialized_at(&home);
        assert!(second.is_ok());

        if let (Ok(first_context), Ok(second_context)) = (first, second) {
            assert_eq!(first_context.db_path, second_context.db_path);

            let connection = Connection::open(&second_context.db_path);
            assert!(connection.is_ok());
            if let Ok(conn) = connection {
                assert_eq!(user_version(&conn), Some(2));
            }
        }
    }
}

#[test]
fn setup_creates_one_statement_table_per_profile() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");

        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            let connection = Connection::open(&setup_context.db_path);
            assert!(connection.is_ok());
            if let Ok(conn) = connection {
                for profile in PROFILES.iter() {
                    assert!(object_exists(&conn, "table", profile.table));
                    let index_name = format!("idx_{}_transaction_date", profile.table);
                    assert!(object_exists(&conn, "index", &index_name));
                }
                assert!(object_exists(&conn, "table", "internal_import_runs"));
            }
        }
    }
}

#[test]
fn setup_restores_missing_meta_key() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");

        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            let connection = Connection::open(&setup_context.db_path);
            assert!(connection.is_ok());
            if let Ok(conn) = connection {
                let deleted = conn.execute("DELETE FROM internal_meta", []);
                assert!(deleted.is_ok());
            }

            let repaired = ensure_initialized_at(&home);
            assert!(repaired.is_ok());
            if let Ok(repaired_context) = repaired {
                assert_eq!(repaired_context.schema_version, "v1");
            }
        }
    }
}

#[test]
fn setup_fails_when_a_statement_table_is_missing() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");

        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            let connection = Connection::open(&setup_context.db_path);
            assert!(connection.is_ok());
            if let Ok(conn) = connection {
                let dropped = conn.execute_batch("DROP TABLE scotia_visa_debit;");
                assert!(dropped.is_ok());
            }

            let failed = ensure_initialized_at(&home);
            assert!(failed.is_err());
            if let Err(error) = failed {
                assert_eq!(error.code, "ledger_corrupt");
            }
        }
    }
}

fn initialized_home() -> (tempfile::TempDir, std::path::PathBuf, Connection) {
    let Ok(temp_dir) = tempdir() else {
        panic!("tempdir should be created");
    };
    let home = temp_dir.path().join("ledger-home");
    let Ok(context) = ensure_initialized_at(&home) else {
        panic!("fresh ledger should initialize");
    };
    let Ok(connection) = Connection::open(&context.db_path) else {
        panic!("ledger should reopen");
    };
    (temp_dir, home, connection)
}

#[test]
fn setup_fails_when_a_required_column_is_dropped() {
    let (_temp_dir, home, connection) = initialized_home();
    let altered =
        connection.execute_batch("ALTER TABLE internal_import_runs DROP COLUMN rows_empty_detail;");
    assert!(altered.is_ok());
    drop(connection);

    let failed = ensure_initialized_at(&home);
    assert!(failed.is_err());
    if let Err(error) = failed {
        assert_eq!(error.code, "ledger_corrupt");
    }
}

#[test]
fn setup_rejects_a_changed_schema_version_value() {
    let (_temp_dir, home, connection) = initialized_home();
    let updated = connection.execute(
        "UPDATE internal_meta SET value = 'v9' WHERE key = 'schema_version'",
        [],
    );
    assert_eq!(updated.ok(), Some(1));
    drop(connection);

    let failed = ensure_initialized_at(&home);
    assert!(failed.is_err());
    if let Err(error) = failed {
        assert_eq!(error.code, "ledger_corrupt");
        assert!(error.is_internal());
    }
}

#[test]
fn setup_fails_on_non_database_file() {
    let temp = tempdir();
    assert!(temp.is_ok());
    if let Ok(temp_dir) = temp {
        let home = temp_dir.path().join("ledger-home");
        assert!(fs::create_dir_all(&home).is_ok());
        let written = fs::write(
            home.join("ledger.db"),
            "this is not sqlite, just text padding past the header",
        );
        assert!(written.is_ok());

        let failed = ensure_initialized_at(&home);
        assert!(failed.is_err());
        if let Err(error) = failed {
            assert!(
                error.code == "ledger_corrupt" || error.code == "migration_failed",
                "unexpected code {}",
                error.code
            );
        }
    }
}

#[test]
fn permission_denied_io_maps_to_specific_code() {
    let error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
    let mapped = map_io_error(std::path::Path::new("/restricted"), &error);
    assert_eq!(mapped.code, "ledger_init_permission_denied");
}
