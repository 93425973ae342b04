//! Publish sink: stores validated tables and their metadata
//!
//! `SqlitePublisher` keeps one SQL table per dataset id plus a
//! `dataset_metadata` registry. Every upload runs in one transaction, so a
//! failed upload leaves the previous data in place.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::context::RunContext;
use crate::error::StorageError;
use crate::table::{Table, Value};

/// How an upload treats rows already stored for the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Keep prior runs; new rows are tagged with this run's id and version
    #[default]
    Append,
    /// Replace everything stored for the dataset
    Overwrite,
}

/// Human-readable description of a published dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    /// (column, description) in table order
    pub column_descriptions: Vec<(String, String)>,
}

/// Metadata as stored by the sink
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedDataset {
    pub metadata: DatasetMetadata,
    pub run_id: String,
    pub version: i64,
    pub published_at: i64,
}

#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Store `table` under `dataset_id`; returns the number of rows written
    async fn upload(
        &self,
        table: &Table,
        dataset_id: &str,
        mode: UploadMode,
        ctx: &RunContext,
    ) -> Result<usize, StorageError>;

    /// Register or refresh the dataset's metadata
    async fn publish(
        &self,
        dataset_id: &str,
        metadata: &DatasetMetadata,
        ctx: &RunContext,
    ) -> Result<(), StorageError>;
}

pub struct SqlitePublisher {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePublisher {
    /// Open (or create) the database and its metadata registry
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init_schema(&conn)?;

        log::info!("✅ SQLite publish sink initialized: {}", db_path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS dataset_metadata (
                dataset_id          TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                column_descriptions TEXT NOT NULL,
                run_id              TEXT NOT NULL,
                version             INTEGER NOT NULL,
                published_at        INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Rows currently stored for a dataset (0 when it was never uploaded)
    pub fn row_count(&self, dataset_id: &str) -> Result<i64, StorageError> {
        validate_dataset_id(dataset_id)?;
        let conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?
            .exists(params![dataset_id])?;
        if !exists {
            return Ok(0);
        }

        let count = conn.query_row(&format!("SELECT COUNT(*) FROM \"{dataset_id}\""), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    pub fn published(&self, dataset_id: &str) -> Result<Option<PublishedDataset>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                r#"
                SELECT title, description, column_descriptions, run_id, version, published_at
                FROM dataset_metadata WHERE dataset_id = ?1
                "#,
                params![dataset_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((title, description, columns_json, run_id, version, published_at)) = row else {
            return Ok(None);
        };

        Ok(Some(PublishedDataset {
            metadata: DatasetMetadata {
                id: dataset_id.to_string(),
                title,
                description,
                column_descriptions: serde_json::from_str(&columns_json)?,
            },
            run_id,
            version,
            published_at,
        }))
    }
}

#[async_trait]
impl PublishSink for SqlitePublisher {
    async fn upload(
        &self,
        table: &Table,
        dataset_id: &str,
        mode: UploadMode,
        ctx: &RunContext,
    ) -> Result<usize, StorageError> {
        validate_dataset_id(dataset_id)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if mode == UploadMode::Overwrite {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{dataset_id}\""))?;
        }

        let column_defs: Vec<String> = table
            .columns()
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.dtype.sql_type()))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{dataset_id}\" ({}, {})",
            column_defs.join(", "),
            "run_id TEXT NOT NULL, version INTEGER NOT NULL, loaded_at INTEGER NOT NULL"
        ))?;

        // Rows carry the version the following publish() will register
        let version: i64 = tx
            .query_row(
                "SELECT version FROM dataset_metadata WHERE dataset_id = ?1",
                params![dataset_id],
                |row| row.get(0),
            )
            .optional()?
            .map_or(1, |current: i64| current + 1);

        let column_names: Vec<String> = table
            .columns()
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect();
        let placeholders: Vec<String> = (1..=table.columns().len() + 3)
            .map(|i| format!("?{i}"))
            .collect();
        let insert_sql = format!(
            "INSERT INTO \"{dataset_id}\" ({}, run_id, version, loaded_at) VALUES ({})",
            column_names.join(", "),
            placeholders.join(", ")
        );

        let loaded_at = ctx.started_at_ts();
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in table.rows() {
                let mut values: Vec<rusqlite::types::Value> =
                    row.iter().map(to_sql_value).collect();
                values.push(rusqlite::types::Value::Text(ctx.run_id.clone()));
                values.push(rusqlite::types::Value::Integer(version));
                values.push(rusqlite::types::Value::Integer(loaded_at));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        log::debug!(
            "✅ Uploaded {} rows to {} ({:?}, run {}, version {})",
            table.num_rows(),
            dataset_id,
            mode,
            ctx.run_id,
            version
        );
        Ok(table.num_rows())
    }

    async fn publish(
        &self,
        dataset_id: &str,
        metadata: &DatasetMetadata,
        ctx: &RunContext,
    ) -> Result<(), StorageError> {
        validate_dataset_id(dataset_id)?;
        let columns_json = serde_json::to_string(&metadata.column_descriptions)?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO dataset_metadata
                (dataset_id, title, description, column_descriptions, run_id, version, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            ON CONFLICT(dataset_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                column_descriptions = excluded.column_descriptions,
                run_id = excluded.run_id,
                version = dataset_metadata.version + 1,
                published_at = excluded.published_at
            "#,
            params![
                dataset_id,
                metadata.title,
                metadata.description,
                columns_json,
                ctx.run_id,
                ctx.started_at_ts(),
            ],
        )?;

        log::debug!("📝 Published metadata for {}", dataset_id);
        Ok(())
    }
}

fn validate_dataset_id(dataset_id: &str) -> Result<(), StorageError> {
    let valid = !dataset_id.is_empty()
        && dataset_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidDatasetId(dataset_id.to_string()))
    }
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Double(v) => rusqlite::types::Value::Real(*v),
        Value::Int(v) => rusqlite::types::Value::Integer(*v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, ColumnType};
    use tempfile::tempdir;

    fn sample_table(rows: &[(&str, f64)]) -> Table {
        let mut table = Table::new(vec![
            Column::new("state", ColumnType::String),
            Column::new("total_co2e", ColumnType::Double),
        ]);
        for (state, total) in rows {
            table
                .push_row(vec![Value::from(*state), Value::from(*total)])
                .unwrap();
        }
        table
    }

    fn metadata() -> DatasetMetadata {
        DatasetMetadata {
            id: "test_dataset".to_string(),
            title: "Test".to_string(),
            description: "A test dataset".to_string(),
            column_descriptions: vec![
                ("state".to_string(), "State code".to_string()),
                ("total_co2e".to_string(), "Total".to_string()),
            ],
        }
    }

    #[tokio::test]
    async fn test_append_keeps_every_run() {
        let sink = SqlitePublisher::in_memory().unwrap();

        let first = sample_table(&[("CA", 1.0), ("TX", 2.0)]);
        let second = sample_table(&[("NY", 3.0)]);
        sink.upload(&first, "test_dataset", UploadMode::Append, &RunContext::new("run-1"))
            .await
            .unwrap();
        sink.upload(&second, "test_dataset", UploadMode::Append, &RunContext::new("run-2"))
            .await
            .unwrap();

        assert_eq!(sink.row_count("test_dataset").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_rows() {
        let sink = SqlitePublisher::in_memory().unwrap();
        let ctx = RunContext::new("run-1");

        let first = sample_table(&[("CA", 1.0), ("TX", 2.0)]);
        sink.upload(&first, "test_dataset", UploadMode::Append, &ctx)
            .await
            .unwrap();
        let written = sink
            .upload(&sample_table(&[("NY", 3.0)]), "test_dataset", UploadMode::Overwrite, &ctx)
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(sink.row_count("test_dataset").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rows_are_tagged_with_run_id() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/publish.db");
        let sink = SqlitePublisher::new(&db_path).unwrap();

        let ctx = RunContext::new("nightly");
        sink.upload(&sample_table(&[("CA", 1.5)]), "test_dataset", UploadMode::Append, &ctx)
            .await
            .unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let (state, total, run_id, version, loaded_at): (String, f64, String, i64, i64) = conn
            .query_row(
                "SELECT state, total_co2e, run_id, version, loaded_at FROM test_dataset",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();
        assert_eq!(state, "CA");
        assert_eq!(total, 1.5);
        assert_eq!(run_id, "nightly");
        assert_eq!(version, 1);
        assert_eq!(loaded_at, ctx.started_at_ts());
    }

    #[tokio::test]
    async fn test_reruns_with_same_run_id_get_distinct_versions() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("publish.db");
        let sink = SqlitePublisher::new(&db_path).unwrap();
        let ctx = RunContext::new("local-run");

        for _ in 0..2 {
            let table = sample_table(&[("CA", 1.0), ("TX", 2.0)]);
            sink.upload(&table, "test_dataset", UploadMode::Append, &ctx)
                .await
                .unwrap();
            sink.publish("test_dataset", &metadata(), &ctx).await.unwrap();
        }

        let conn = Connection::open(&db_path).unwrap();
        let versions: Vec<(i64, i64)> = conn
            .prepare("SELECT version, COUNT(*) FROM test_dataset GROUP BY version ORDER BY version")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(versions, vec![(1, 2), (2, 2)]);

        let published = sink.published("test_dataset").unwrap().unwrap();
        assert_eq!(published.version, 2);
        assert_eq!(published.published_at, ctx.started_at_ts());
    }

    #[tokio::test]
    async fn test_publish_bumps_version() {
        let sink = SqlitePublisher::in_memory().unwrap();

        sink.publish("test_dataset", &metadata(), &RunContext::new("run-1")).await.unwrap();
        sink.publish("test_dataset", &metadata(), &RunContext::new("run-2")).await.unwrap();

        let published = sink.published("test_dataset").unwrap().unwrap();
        assert_eq!(published.version, 2);
        assert_eq!(published.run_id, "run-2");
        assert_eq!(published.metadata, metadata());
        assert!(sink.published("other").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_dataset_id() {
        let sink = SqlitePublisher::in_memory().unwrap();
        let ctx = RunContext::new("run");

        let err = sink
            .upload(&sample_table(&[]), "x\"; DROP TABLE y", UploadMode::Append, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidDatasetId(_)));
        assert_eq!(sink.row_count("never_uploaded").unwrap(), 0);
    }
}
