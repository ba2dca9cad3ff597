//! # Schema Initializer
//!
//! Creates the target database on a provisioned server and applies an initialization
//! script to it. [`ensure_database`] must complete before [`apply_script`]; [`drop_database`]
//! removes the database at teardown.

use sqlx::{Connection, PgConnection};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{FixtureError, FixtureResult};
use crate::provisioner::ConnectionDescriptor;

/// SQLSTATE `duplicate_database`
const DUPLICATE_DATABASE: &str = "42P04";

/// Create the descriptor's database unless it already exists.
///
/// Connects to the administrative database, since the target may not exist yet. Safe to
/// call repeatedly.
pub async fn ensure_database(descriptor: &ConnectionDescriptor) -> FixtureResult<()> {
    let database = descriptor.database.as_str();
    let creation_failure = |source: sqlx::Error| FixtureError::DatabaseCreationFailure {
        database: database.to_string(),
        source,
    };

    let mut conn = PgConnection::connect(&descriptor.admin_connection_string())
        .await
        .map_err(creation_failure)?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(database)
            .fetch_one(&mut conn)
            .await
            .map_err(creation_failure)?;

    if exists {
        debug!(database = %database, "Database already exists");
    } else {
        let statement = format!("CREATE DATABASE {}", quote_identifier(database));
        match sqlx::raw_sql(&statement).execute(&mut conn).await {
            Ok(_) => info!(database = %database, "Created database"),
            // Lost a race with another creator; the database exists either way
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(DUPLICATE_DATABASE) => {
                debug!(database = %database, "Database created concurrently");
            }
            Err(e) => return Err(creation_failure(e)),
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Drop the target database, disconnecting any remaining sessions.
///
/// Open connections from the host or a test do not block the drop.
pub async fn drop_database(descriptor: &ConnectionDescriptor) -> FixtureResult<()> {
    let teardown = |e: sqlx::Error| FixtureError::Teardown(format!(
        "failed to drop database '{}': {e}",
        descriptor.database
    ));

    let mut conn = PgConnection::connect(&descriptor.admin_connection_string())
        .await
        .map_err(teardown)?;

    let statement = format!(
        "DROP DATABASE IF EXISTS {} WITH (FORCE)",
        quote_identifier(&descriptor.database)
    );
    sqlx::raw_sql(&statement)
        .execute(&mut conn)
        .await
        .map_err(teardown)?;

    let _ = conn.close().await;
    info!(database = %descriptor.database, "Dropped test database");
    Ok(())
}

/// Read `script_path` in full and execute it as one batch against the target database.
///
/// The path is checked before any connection is opened.
pub async fn apply_script(
    descriptor: &ConnectionDescriptor,
    script_path: impl AsRef<Path>,
) -> FixtureResult<()> {
    let path = script_path.as_ref();

    let sql = match tokio::fs::read_to_string(path).await {
        Ok(sql) => sql,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FixtureError::ScriptNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(FixtureError::ScriptRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let execution_failure = |source: sqlx::Error| FixtureError::ScriptExecution {
        path: path.to_path_buf(),
        source,
    };

    let mut conn = PgConnection::connect(&descriptor.connection_string())
        .await
        .map_err(execution_failure)?;

    sqlx::raw_sql(&sql)
        .execute(&mut conn)
        .await
        .map_err(execution_failure)?;

    let _ = conn.close().await;

    info!(
        script = %path.display(),
        database = %descriptor.database,
        bytes = sql.len(),
        "Applied initialization script"
    );
    Ok(())
}

/// Double-quote an identifier for interpolation into DDL
pub(crate) fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
