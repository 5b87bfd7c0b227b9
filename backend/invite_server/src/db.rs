//! Database layer — migrations, key/value storage and the tracking log.

use invite_core::storage::{MemoryStore, REFERRAL_KEY};
use invite_core::tracking::TrackRecord;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, info};

use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let in_memory = url.contains(":memory:");
    // Create the file on first start.
    let url = if in_memory || url.contains('?') {
        url
    } else {
        format!("{url}?mode=rwc")
    };

    // Every connection to `:memory:` opens its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .min_connections(if in_memory { 1 } else { 0 })
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Key/value storage
// ─────────────────────────────────────────────────────────

pub async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v))
}

pub async fn set_value(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                       updated_at = strftime('%s', 'now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Storage keys are namespaced by visitor.
fn scoped_key(visitor: &str, key: &str) -> String {
    format!("{visitor}:{key}")
}

/// Random 128-bit id, hex encoded.
pub async fn new_visitor_id(pool: &SqlitePool) -> Result<String> {
    let (id,): (String,) = sqlx::query_as("SELECT lower(hex(randomblob(16)))")
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Snapshot of the keys the resolver reads for one visitor. Read failures
/// leave the key unset.
pub async fn load_store(pool: &SqlitePool, visitor: &str) -> MemoryStore {
    match get_value(pool, &scoped_key(visitor, REFERRAL_KEY)).await {
        Ok(Some(code)) => MemoryStore::new().with_entry(REFERRAL_KEY, code),
        Ok(None) => MemoryStore::new(),
        Err(e) => {
            debug!("Referral lookup failed: {e}");
            MemoryStore::new()
        }
    }
}

/// Write back whatever the core changed. Failures are logged and dropped.
pub async fn flush_store(pool: &SqlitePool, visitor: &str, store: &MemoryStore) {
    for (key, value) in store.dirty_entries() {
        if let Err(e) = set_value(pool, &scoped_key(visitor, key), value).await {
            debug!("Storage write for {key} dropped: {e}");
        }
    }
}

// ─────────────────────────────────────────────────────────
// Tracking log
// ─────────────────────────────────────────────────────────

/// A tracking record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrackingRow {
    pub id: i64,
    pub name: String,
    pub ts: String,
    pub event_slug: String,
    pub state: String,
    pub created_at: i64,
}

/// Append one record and prune everything but the newest `cap` rows.
pub async fn insert_tracking(pool: &SqlitePool, record: &TrackRecord, cap: usize) -> Result<()> {
    let state = serde_json::to_string(&record.state)?;
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO tracking_events (name, ts, event_slug, state)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&record.name)
    .bind(record.ts.to_rfc3339())
    .bind(record.state.event_slug())
    .bind(&state)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM tracking_events
        WHERE  id NOT IN (SELECT id FROM tracking_events ORDER BY id DESC LIMIT ?1)
        "#,
    )
    .bind(cap as i64)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Newest `limit` records, returned oldest first.
pub async fn recent_tracking(pool: &SqlitePool, limit: i64) -> Result<Vec<TrackingRow>> {
    let mut rows = sqlx::query_as::<_, TrackingRow>(
        r#"
        SELECT id, name, ts, event_slug, state, created_at
        FROM   tracking_events
        ORDER  BY id DESC
        LIMIT  ?1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_core::ApplicationState;

    async fn memory_pool() -> SqlitePool {
        init_pool("sqlite::memory:").await.unwrap()
    }

    fn record(name: &str) -> TrackRecord {
        TrackRecord {
            name: name.to_string(),
            ts: chrono::Utc::now(),
            state: ApplicationState::new("demo"),
        }
    }

    #[tokio::test]
    async fn kv_round_trip_and_overwrite() {
        let pool = memory_pool().await;
        assert_eq!(get_value(&pool, REFERRAL_KEY).await.unwrap(), None);
        set_value(&pool, REFERRAL_KEY, "A").await.unwrap();
        set_value(&pool, REFERRAL_KEY, "B").await.unwrap();
        assert_eq!(
            get_value(&pool, REFERRAL_KEY).await.unwrap().as_deref(),
            Some("B")
        );
    }

    #[tokio::test]
    async fn store_snapshot_and_flush() {
        use invite_core::storage::KeyValueStore;

        let pool = memory_pool().await;
        let mut store = load_store(&pool, "v1").await;
        store.set(REFERRAL_KEY, "REF1").unwrap();
        flush_store(&pool, "v1", &store).await;

        let reloaded = load_store(&pool, "v1").await;
        assert_eq!(reloaded.get(REFERRAL_KEY).unwrap().as_deref(), Some("REF1"));
        let other = load_store(&pool, "v2").await;
        assert_eq!(other.get(REFERRAL_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn visitor_ids_are_distinct_hex() {
        let pool = memory_pool().await;
        let a = new_visitor_id(&pool).await.unwrap();
        let b = new_visitor_id(&pool).await.unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn tracking_is_capped() {
        let pool = memory_pool().await;
        for i in 0..6 {
            insert_tracking(&pool, &record(&format!("e{i}")), 4)
                .await
                .unwrap();
        }
        let rows = recent_tracking(&pool, 100).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["e2", "e3", "e4", "e5"]);
        assert_eq!(rows[0].event_slug, "demo");
    }
}
