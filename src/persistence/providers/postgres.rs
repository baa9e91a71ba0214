//! PostgreSQL session store.
//!
//! Each record is one row of the `sessions` table: the native id as text and
//! the caller fields as a JSONB document. JSONB does not keep key order, so
//! documents read back from this provider come out in Postgres' key order.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::persistence::{Document, Filter, ObjectId, SessionRecord, SessionStore};

#[derive(Debug)]
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;

        // Run Migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

fn record_from_row(row: &PgRow) -> Result<SessionRecord> {
    let id: String = row.try_get("id")?;
    let Json(fields): Json<Document> = row.try_get("data")?;
    Ok(SessionRecord {
        id: id.parse()?,
        fields,
    })
}

#[async_trait]
impl SessionStore for PostgresProvider {
    async fn insert_one(&self, fields: Document) -> Result<ObjectId> {
        let id = ObjectId::new();
        sqlx::query("INSERT INTO sessions (id, data) VALUES ($1, $2)")
            .bind(id.to_hex())
            .bind(Json(fields))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<SessionRecord>> {
        let row = match filter {
            Filter::Id(id) => {
                sqlx::query("SELECT id, data FROM sessions WHERE id = $1")
                    .bind(id.to_hex())
                    .fetch_optional(&self.pool)
                    .await?
            }
            Filter::SessionId(session_id) => {
                sqlx::query(
                    r#"
                    SELECT id, data FROM sessions
                    WHERE data -> 'sessionId' = to_jsonb($1::text)
                    ORDER BY id
                    LIMIT 1
                    "#,
                )
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_recent(&self, limit: usize, exclude: &[&str]) -> Result<Vec<SessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let exclude: Vec<String> = exclude.iter().map(ToString::to_string).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, data - $2::text[] AS data
            FROM sessions
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn update_one(&self, filter: &Filter, set: &Document) -> Result<u64> {
        let result = match filter {
            Filter::Id(id) => {
                sqlx::query("UPDATE sessions SET data = data || $2 WHERE id = $1")
                    .bind(id.to_hex())
                    .bind(Json(set))
                    .execute(&self.pool)
                    .await?
            }
            Filter::SessionId(session_id) => {
                sqlx::query(
                    r#"
                    UPDATE sessions SET data = data || $2
                    WHERE id = (
                        SELECT id FROM sessions
                        WHERE data -> 'sessionId' = to_jsonb($1::text)
                        ORDER BY id
                        LIMIT 1
                    )
                    "#,
                )
                .bind(session_id)
                .bind(Json(set))
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64> {
        let result = match filter {
            Filter::Id(id) => {
                sqlx::query("DELETE FROM sessions WHERE id = $1")
                    .bind(id.to_hex())
                    .execute(&self.pool)
                    .await?
            }
            Filter::SessionId(session_id) => {
                sqlx::query(
                    r#"
                    DELETE FROM sessions
                    WHERE id = (
                        SELECT id FROM sessions
                        WHERE data -> 'sessionId' = to_jsonb($1::text)
                        ORDER BY id
                        LIMIT 1
                    )
                    "#,
                )
                .bind(session_id)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count)?)
    }
}
