//! # Checkpoint and Schema Integration Tests
//!
//! Exercise schema setup and the reset engine directly against a PostgreSQL container.

use sqlx::{Connection, PgConnection};
use std::path::PathBuf;
use std::time::Duration;

use employee_api::logging::init_test_logging;
use employee_fixture::checkpoint::{self, CheckpointOptions};
use employee_fixture::schema;
use employee_fixture::{ConnectionDescriptor, FixtureError, PostgresContainer};

fn topology_script() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fk_topology.sql")
}

async fn connect(descriptor: &ConnectionDescriptor) -> PgConnection {
    PgConnection::connect(&descriptor.connection_string())
        .await
        .expect("connect to test database")
}

async fn count(conn: &mut PgConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(conn)
        .await
        .expect("count rows")
}

const SEED_ROWS: &str = r#"
    INSERT INTO departments (id, name) VALUES (1, 'Engineering'), (2, 'Design');
    INSERT INTO staff (id, department_id, manager_id, name) VALUES (1, 1, NULL, 'Ada');
    INSERT INTO staff (id, department_id, manager_id, name) VALUES (2, 1, 1, 'Grace');
    INSERT INTO assignments (staff_id, title) VALUES (1, 'Compiler'), (2, 'Runtime');
    BEGIN;
    INSERT INTO teams (id, lead_member_id) VALUES (1, NULL);
    INSERT INTO members (id, team_id) VALUES (10, 1);
    UPDATE teams SET lead_member_id = 10 WHERE id = 1;
    COMMIT;
"#;

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_ensure_database_is_idempotent() {
    init_test_logging();
    let mut instance = PostgresContainer::new()
        .with_database("idempotent_db")
        .start()
        .await
        .unwrap();
    let descriptor = instance.descriptor();

    schema::ensure_database(&descriptor).await.unwrap();
    schema::ensure_database(&descriptor).await.unwrap();

    let mut admin = PgConnection::connect(&descriptor.admin_connection_string())
        .await
        .unwrap();
    let matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
        .bind("idempotent_db")
        .fetch_one(&mut admin)
        .await
        .unwrap();
    assert_eq!(matches, 1);
    admin.close().await.unwrap();

    instance.stop().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_script_requires_database() {
    init_test_logging();
    let mut instance = PostgresContainer::new()
        .with_database("never_created")
        .start()
        .await
        .unwrap();
    let descriptor = instance.descriptor();

    let err = schema::apply_script(&descriptor, topology_script())
        .await
        .unwrap_err();
    assert!(matches!(err, FixtureError::ScriptExecution { .. }));

    instance.stop().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_reset_respects_foreign_keys() {
    init_test_logging();
    let mut instance = PostgresContainer::new().start().await.unwrap();
    let descriptor = instance.descriptor();

    schema::ensure_database(&descriptor).await.unwrap();
    schema::apply_script(&descriptor, topology_script()).await.unwrap();

    let options = CheckpointOptions::default().ignore_table("schema_versions");
    let baseline = checkpoint::capture(&descriptor, &options).await.unwrap();

    let ordered: Vec<String> = baseline.tables().iter().map(|t| t.name.clone()).collect();
    assert_eq!(ordered, vec!["assignments", "staff", "departments"]);
    let cyclic: Vec<String> = baseline
        .cyclic_tables()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(cyclic, vec!["members", "teams"]);

    let mut conn = connect(&descriptor).await;
    for _ in 0..2 {
        sqlx::raw_sql(SEED_ROWS).execute(&mut conn).await.unwrap();

        checkpoint::reset(&descriptor, &baseline).await.unwrap();

        for table in ["departments", "staff", "assignments", "teams", "members"] {
            assert_eq!(count(&mut conn, table).await, 0, "{table} not empty");
        }
        assert_eq!(count(&mut conn, "schema_versions").await, 1);
    }
    conn.close().await.unwrap();

    instance.stop().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_reset_reseeds_sequences() {
    init_test_logging();
    let mut instance = PostgresContainer::new().start().await.unwrap();
    let descriptor = instance.descriptor();

    schema::ensure_database(&descriptor).await.unwrap();
    schema::apply_script(&descriptor, employee_fixture::default_script_path())
        .await
        .unwrap();

    let options = CheckpointOptions::default().with_reseed(true);
    let baseline = checkpoint::capture(&descriptor, &options).await.unwrap();
    assert_eq!(baseline.sequences(), ["public.employees_id_seq".to_string()]);

    let insert = "INSERT INTO employees (name, email, position, salary) \
                  VALUES ('A', 'a@example.com', 'Dev', 1) RETURNING id";
    let mut conn = connect(&descriptor).await;

    let first: i32 = sqlx::query_scalar(insert).fetch_one(&mut conn).await.unwrap();
    checkpoint::reset(&descriptor, &baseline).await.unwrap();
    let second: i32 = sqlx::query_scalar(insert).fetch_one(&mut conn).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 1);
    conn.close().await.unwrap();

    instance.stop().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_reset_fails_on_locked_table() {
    init_test_logging();
    let mut instance = PostgresContainer::new().start().await.unwrap();
    let descriptor = instance.descriptor();

    schema::ensure_database(&descriptor).await.unwrap();
    schema::apply_script(&descriptor, employee_fixture::default_script_path())
        .await
        .unwrap();

    let options = CheckpointOptions::default().with_lock_timeout(Duration::from_millis(200));
    let baseline = checkpoint::capture(&descriptor, &options).await.unwrap();

    let mut holder = connect(&descriptor).await;
    let mut tx = holder.begin().await.unwrap();
    sqlx::raw_sql("LOCK TABLE employees IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .unwrap();

    let err = checkpoint::reset(&descriptor, &baseline).await.unwrap_err();
    assert!(matches!(
        err,
        FixtureError::ResetFailure { ref table, .. } if table == "public.employees"
    ));

    tx.rollback().await.unwrap();
    checkpoint::reset(&descriptor, &baseline).await.unwrap();
    holder.close().await.unwrap();

    instance.stop().await.unwrap();
}

#[tokio::test]
#[ignore] // Only run when Docker is available
async fn test_drop_database_disconnects_sessions() {
    init_test_logging();
    let mut instance = PostgresContainer::new()
        .with_database("dropped_db")
        .start()
        .await
        .unwrap();
    let descriptor = instance.descriptor();

    schema::ensure_database(&descriptor).await.unwrap();
    schema::apply_script(&descriptor, employee_fixture::default_script_path())
        .await
        .unwrap();

    let mut session = connect(&descriptor).await;
    assert_eq!(count(&mut session, "employees").await, 0);

    schema::drop_database(&descriptor).await.unwrap();

    let mut admin = PgConnection::connect(&descriptor.admin_connection_string())
        .await
        .unwrap();
    let matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
        .bind("dropped_db")
        .fetch_one(&mut admin)
        .await
        .unwrap();
    assert_eq!(matches, 0);
    admin.close().await.unwrap();

    // Terminated by the forced drop
    assert!(sqlx::query("SELECT 1").execute(&mut session).await.is_err());
    drop(session);

    // Already gone
    schema::drop_database(&descriptor).await.unwrap();

    instance.stop().await.unwrap();
}
