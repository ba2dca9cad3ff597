//! # Checkpoint/Reset Engine
//!
//! [`capture`] records which tables exist and how their foreign keys depend on each other,
//! right after schema initialization. [`reset`] then empties those tables, children before
//! parents, without touching the schema.
//!
//! Tables caught in a foreign-key cycle cannot be ordered; they are cleared together with a
//! single `TRUNCATE ... CASCADE` after the ordered deletes.

use sqlx::{Connection, PgConnection};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{FixtureError, FixtureResult};
use crate::provisioner::ConnectionDescriptor;
use crate::schema::quote_identifier;

/// What [`capture`] covers and how [`reset`] behaves
#[derive(Debug, Clone)]
pub struct CheckpointOptions {
    /// Schemas whose tables are captured
    pub schemas: Vec<String>,
    /// Tables left untouched, as `name` or `schema.name`
    pub tables_to_ignore: Vec<String>,
    /// Restart sequences owned by captured tables
    pub reseed: bool,
    /// Upper bound on waiting for a table lock during reset; rounded up to whole
    /// milliseconds, at least one
    pub lock_timeout: Duration,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            schemas: vec!["public".to_string()],
            tables_to_ignore: Vec::new(),
            reseed: false,
            lock_timeout: Duration::from_secs(5),
        }
    }
}

impl CheckpointOptions {
    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore_table(mut self, table: impl Into<String>) -> Self {
        self.tables_to_ignore.push(table.into());
        self
    }

    pub fn with_reseed(mut self, reseed: bool) -> Self {
        self.reseed = reseed;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    fn is_ignored(&self, table: &TableName) -> bool {
        self.tables_to_ignore
            .iter()
            .any(|ignored| ignored == &table.name || ignored == &table.to_string())
    }
}

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Quoted form for interpolation into SQL
    pub fn quoted(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.name)
        )
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// `child` holds a foreign key referencing `parent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub child: TableName,
    pub parent: TableName,
}

impl ForeignKey {
    pub fn new(child: TableName, parent: TableName) -> Self {
        Self { child, parent }
    }
}

/// Result of ordering tables for deletion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOrder {
    /// Safe to clear one by one, in this order
    pub ordered: Vec<TableName>,
    /// Part of, or only reachable through, a foreign-key cycle
    pub cyclic: Vec<TableName>,
}

/// Order `tables` so that every table comes before the tables it references.
///
/// Self-references never block a table. Foreign keys to tables outside `tables` are
/// ignored. Ties are broken by name, so the result is deterministic.
pub fn delete_order(tables: &[TableName], foreign_keys: &[ForeignKey]) -> DeleteOrder {
    let known: BTreeSet<&TableName> = tables.iter().collect();

    // parent -> distinct children referencing it
    let mut referencing: BTreeMap<&TableName, BTreeSet<&TableName>> =
        known.iter().map(|t| (*t, BTreeSet::new())).collect();
    // child -> distinct parents it references
    let mut references: BTreeMap<&TableName, BTreeSet<&TableName>> =
        known.iter().map(|t| (*t, BTreeSet::new())).collect();

    for fk in foreign_keys {
        if fk.child == fk.parent || !known.contains(&fk.child) || !known.contains(&fk.parent) {
            continue;
        }
        if let Some(children) = referencing.get_mut(&fk.parent) {
            children.insert(&fk.child);
        }
        if let Some(parents) = references.get_mut(&fk.child) {
            parents.insert(&fk.parent);
        }
    }

    let mut pending: BTreeMap<&TableName, usize> = referencing
        .iter()
        .map(|(table, children)| (*table, children.len()))
        .collect();
    let mut ready: BTreeSet<&TableName> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(table, _)| *table)
        .collect();

    let mut ordered = Vec::with_capacity(known.len());
    while let Some(table) = ready.pop_first() {
        pending.remove(table);
        ordered.push(table.clone());

        for parent in references.get(table).into_iter().flatten() {
            if let Some(count) = pending.get_mut(parent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*parent);
                }
            }
        }
    }

    let cyclic = pending.into_keys().cloned().collect();

    DeleteOrder { ordered, cyclic }
}

/// Table topology recorded by [`capture`]; unchanged across resets
#[derive(Debug, Clone)]
pub struct Baseline {
    order: DeleteOrder,
    sequences: Vec<String>,
    reseed: bool,
    lock_timeout: Duration,
}

impl Baseline {
    pub fn from_order(order: DeleteOrder, options: &CheckpointOptions) -> Self {
        Self {
            order,
            sequences: Vec::new(),
            reseed: options.reseed,
            lock_timeout: options.lock_timeout,
        }
    }

    /// Tables cleared with `DELETE`, in execution order
    pub fn tables(&self) -> &[TableName] {
        &self.order.ordered
    }

    /// Tables cleared together with `TRUNCATE ... CASCADE`
    pub fn cyclic_tables(&self) -> &[TableName] {
        &self.order.cyclic
    }

    /// Every table a reset empties
    pub fn all_tables(&self) -> impl Iterator<Item = &TableName> {
        self.order.ordered.iter().chain(self.order.cyclic.iter())
    }

    /// Quoted names of sequences restarted on reset
    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    /// Statements [`reset`] executes inside its transaction, in order
    pub fn reset_statements(&self) -> Vec<(String, String)> {
        let mut statements = vec![(
            "lock_timeout".to_string(),
            format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout_millis(self.lock_timeout)),
        )];

        statements.extend(
            self.order
                .ordered
                .iter()
                .map(|table| (table.to_string(), format!("DELETE FROM {}", table.quoted()))),
        );

        if !self.order.cyclic.is_empty() {
            let label = self
                .order
                .cyclic
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let targets = self
                .order
                .cyclic
                .iter()
                .map(TableName::quoted)
                .collect::<Vec<_>>()
                .join(", ");
            statements.push((label, format!("TRUNCATE TABLE {targets} CASCADE")));
        }

        if self.reseed {
            statements.extend(
                self.sequences
                    .iter()
                    .map(|seq| (seq.clone(), format!("ALTER SEQUENCE {seq} RESTART"))),
            );
        }

        statements
    }
}

/// Whole milliseconds for `lock_timeout`, rounded up and never zero.
///
/// PostgreSQL reads `0` as "wait forever".
fn lock_timeout_millis(timeout: Duration) -> u128 {
    timeout.as_micros().div_ceil(1000).max(1)
}

const TABLES_QUERY: &str = r#"
    SELECT n.nspname::text, c.relname::text
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 'p')
      AND NOT c.relispartition
      AND n.nspname = ANY($1)
    ORDER BY 1, 2
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT cn.nspname::text, child.relname::text, pn.nspname::text, parent.relname::text
    FROM pg_constraint con
    JOIN pg_class child ON child.oid = con.conrelid
    JOIN pg_namespace cn ON cn.oid = child.relnamespace
    JOIN pg_class parent ON parent.oid = con.confrelid
    JOIN pg_namespace pn ON pn.oid = parent.relnamespace
    WHERE con.contype = 'f'
      AND cn.nspname = ANY($1)
"#;

const OWNED_SEQUENCES_QUERY: &str = r#"
    SELECT quote_ident(sn.nspname) || '.' || quote_ident(s.relname), tn.nspname::text, t.relname::text
    FROM pg_class s
    JOIN pg_namespace sn ON sn.oid = s.relnamespace
    JOIN pg_depend d ON d.objid = s.oid
        AND d.classid = 'pg_class'::regclass
        AND d.deptype IN ('a', 'i')
    JOIN pg_class t ON t.oid = d.refobjid
    JOIN pg_namespace tn ON tn.oid = t.relnamespace
    WHERE s.relkind = 'S'
      AND tn.nspname = ANY($1)
    ORDER BY 1
"#;

/// Introspect the live schema and record the tables a reset must clear.
///
/// Run after schema initialization and before tests insert data.
pub async fn capture(
    descriptor: &ConnectionDescriptor,
    options: &CheckpointOptions,
) -> FixtureResult<Baseline> {
    let mut conn = PgConnection::connect(&descriptor.connection_string())
        .await
        .map_err(FixtureError::Capture)?;

    let tables: Vec<TableName> = sqlx::query_as::<_, (String, String)>(TABLES_QUERY)
        .bind(&options.schemas)
        .fetch_all(&mut conn)
        .await
        .map_err(FixtureError::Capture)?
        .into_iter()
        .map(|(schema, name)| TableName::new(schema, name))
        .filter(|table| !options.is_ignored(table))
        .collect();

    let foreign_keys: Vec<ForeignKey> =
        sqlx::query_as::<_, (String, String, String, String)>(FOREIGN_KEYS_QUERY)
            .bind(&options.schemas)
            .fetch_all(&mut conn)
            .await
            .map_err(FixtureError::Capture)?
            .into_iter()
            .map(|(cs, child, ps, parent)| {
                ForeignKey::new(TableName::new(cs, child), TableName::new(ps, parent))
            })
            .collect();

    let order = delete_order(&tables, &foreign_keys);
    let captured: BTreeSet<&TableName> = tables.iter().collect();

    let sequences = if options.reseed {
        sqlx::query_as::<_, (String, String, String)>(OWNED_SEQUENCES_QUERY)
            .bind(&options.schemas)
            .fetch_all(&mut conn)
            .await
            .map_err(FixtureError::Capture)?
            .into_iter()
            .filter(|(_, schema, table)| {
                captured.contains(&TableName::new(schema.as_str(), table.as_str()))
            })
            .map(|(sequence, _, _)| sequence)
            .collect()
    } else {
        Vec::new()
    };

    let _ = conn.close().await;

    if !order.cyclic.is_empty() {
        warn!(
            tables = ?order.cyclic.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Foreign-key cycle detected; these tables are truncated together"
        );
    }

    info!(
        database = %descriptor.database,
        tables = order.ordered.len() + order.cyclic.len(),
        foreign_keys = foreign_keys.len(),
        sequences = sequences.len(),
        "Captured checkpoint baseline"
    );

    let mut baseline = Baseline::from_order(order, options);
    baseline.sequences = sequences;
    Ok(baseline)
}

/// Empty every table in `baseline`, children first, in one transaction.
///
/// A table that stays locked past the lock timeout fails the reset with
/// [`FixtureError::ResetFailure`]; nothing is retried and the transaction rolls back.
pub async fn reset(descriptor: &ConnectionDescriptor, baseline: &Baseline) -> FixtureResult<()> {
    let started = Instant::now();
    let failure = |table: &str, source: sqlx::Error| FixtureError::ResetFailure {
        table: table.to_string(),
        source,
    };

    let mut conn = PgConnection::connect(&descriptor.connection_string())
        .await
        .map_err(|e| failure("(connection)", e))?;
    let mut tx = conn.begin().await.map_err(|e| failure("(begin)", e))?;

    let mut rows_deleted = 0u64;
    for (target, statement) in baseline.reset_statements() {
        debug!(target = %target, statement = %statement, "Reset statement");
        let result = sqlx::raw_sql(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| failure(&target, e))?;
        rows_deleted += result.rows_affected();
    }

    tx.commit().await.map_err(|e| failure("(commit)", e))?;
    let _ = conn.close().await;

    debug!(
        database = %descriptor.database,
        tables = baseline.all_tables().count(),
        rows_deleted = rows_deleted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Database reset to baseline"
    );
    Ok(())
}
