use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TrawlerError};
use crate::domain::{BulkWriteResult, Collection, UpsertOp};
use crate::store::{Document, PageQuery, Store};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| TrawlerError::Migration(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| TrawlerError::LockPoisoned)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    /// Fixed-width timestamps so lexical order matches chronological order.
    fn format_datetime(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn limit_param(limit: usize) -> i64 {
        i64::try_from(limit).unwrap_or(i64::MAX)
    }
}

impl Store for SqliteStore {
    fn count(&self, collection: Collection) -> Result<u64> {
        let conn = self.conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn page(&self, collection: Collection, query: &PageQuery) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let order = query.sort.sql();
        let sql = format!(
            "SELECT key, payload, created_at FROM {}
             ORDER BY created_at {order}, id {order}
             LIMIT ?1 OFFSET ?2",
            collection.table()
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![Self::limit_param(query.limit), Self::limit_param(query.skip)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, payload, created_at)| -> Result<Document> {
                Ok(Document {
                    key,
                    payload: serde_json::from_str(&payload)?,
                    created_at: Self::parse_datetime(&created_at).unwrap_or_else(Utc::now),
                })
            })
            .collect()
    }

    fn bulk_write(&self, collection: Collection, ops: &[UpsertOp]) -> Result<BulkWriteResult> {
        let mut result = BulkWriteResult::default();
        if ops.is_empty() {
            return Ok(result);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let insert_sql = format!(
                "INSERT INTO {} (key, payload, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO NOTHING",
                collection.table()
            );
            let exists_sql = format!("SELECT 1 FROM {} WHERE key = ?1", collection.table());
            let mut insert = tx.prepare(&insert_sql)?;
            let mut exists = tx.prepare(&exists_sql)?;

            for op in ops {
                if op.filter.is_empty() {
                    result.failed += 1;
                    continue;
                }

                if !op.upsert {
                    let found = exists
                        .query_row(params![op.filter], |_| Ok(()))
                        .optional()?;
                    if found.is_some() {
                        result.matched += 1;
                    }
                    continue;
                }

                let payload = op.set_on_insert.to_string();
                let created_at = Self::format_datetime(Utc::now());
                match insert.execute(params![op.filter, payload, created_at]) {
                    Ok(0) => result.matched += 1,
                    Ok(_) => result.upserted += 1,
                    Err(e) => {
                        tracing::debug!(
                            "Upsert into {} failed for {}: {}",
                            collection,
                            op.filter,
                            e
                        );
                        result.failed += 1;
                    }
                }
            }
        }
        tx.commit()?;

        Ok(result)
    }

    fn distinct_keywords(&self, query: &PageQuery) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let order = query.sort.sql();
        let sql = format!(
            "SELECT keyword FROM (
                SELECT lower(trim(CASE WHEN instr(raw, ',') > 0
                                       THEN substr(raw, 1, instr(raw, ',') - 1)
                                       ELSE raw END)) AS keyword,
                       MIN(created_at) AS first_seen
                FROM (
                    SELECT json_extract(payload, '$.metaData.keywords') AS raw, created_at
                    FROM websites
                    WHERE json_type(payload, '$.metaData.keywords') = 'text'
                )
                GROUP BY keyword
             )
             WHERE keyword <> ''
             ORDER BY first_seen {order}, keyword {order}
             LIMIT ?1 OFFSET ?2"
        );

        let mut stmt = conn.prepare(&sql)?;
        let keywords = stmt
            .query_map(
                params![Self::limit_param(query.limit), Self::limit_param(query.skip)],
                |row| row.get::<_, String>(0),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(keywords)
    }
}
