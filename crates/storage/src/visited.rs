use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use sitecrawler_core::VisitedStatus;

/// Durable complement to the in-memory `VisitedSet`: a single-table SQLite
/// store (`visited_urls(url TEXT PRIMARY KEY, status TEXT)`) so a crawl
/// resumed after a restart doesn't redo work. Optional — callers that don't
/// configure a database path simply never construct one and rely on the
/// in-memory set alone.
#[derive(Clone)]
pub struct SqliteVisitedStore {
    pool: SqlitePool,
}

impl SqliteVisitedStore {
    pub async fn open(path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS visited_urls (\
                url TEXT PRIMARY KEY, \
                status TEXT NOT NULL\
            )",
        )
        .execute(&pool)
        .await?;
        info!(path, "opened visited-url store");
        Ok(Self { pool })
    }

    /// All previously recorded (url, status) pairs, for preloading the
    /// in-memory `VisitedSet` at startup.
    pub async fn load_all(&self) -> Result<Vec<(String, VisitedStatus)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT url, status FROM visited_urls").fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(url, status)| {
                let status = if status == "failed" { VisitedStatus::Failed } else { VisitedStatus::Ok };
                (url, status)
            })
            .collect())
    }

    pub async fn record(&self, url: &str, status: VisitedStatus) -> Result<()> {
        let status_str = match status {
            VisitedStatus::Ok => "ok",
            VisitedStatus::Failed => "failed",
        };
        sqlx::query("INSERT INTO visited_urls (url, status) VALUES (?1, ?2) ON CONFLICT(url) DO UPDATE SET status = excluded.status")
            .bind(url)
            .bind(status_str)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visited.sqlite3");
        let store = SqliteVisitedStore::open(path.to_str().unwrap()).await.unwrap();

        store.record("https://a/1", VisitedStatus::Ok).await.unwrap();
        store.record("https://a/2", VisitedStatus::Failed).await.unwrap();

        let mut rows = store.load_all().await.unwrap();
        rows.sort();
        assert_eq!(
            rows,
            vec![
                ("https://a/1".to_string(), VisitedStatus::Ok),
                ("https://a/2".to_string(), VisitedStatus::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn record_upserts_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visited.sqlite3");
        let store = SqliteVisitedStore::open(path.to_str().unwrap()).await.unwrap();

        store.record("https://a/1", VisitedStatus::Ok).await.unwrap();
        store.record("https://a/1", VisitedStatus::Failed).await.unwrap();

        let rows = store.load_all().await.unwrap();
        assert_eq!(rows, vec![("https://a/1".to_string(), VisitedStatus::Failed)]);
    }
}
