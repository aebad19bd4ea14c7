//! Data Access Layer
//!
//! PostgreSQL implementations of the engine's `SessionStore` and `ResultsSink`.
//! Sessions are stored as one JSONB document per thread; `put` merges an update
//! under a row lock so concurrent writers to the same thread serialise.

use anyhow::{Context, Result};
use async_trait::async_trait;
use interviewer_core::error::StoreError;
use interviewer_core::results::{InterviewResult, ResultsSink};
use interviewer_core::session::{SessionState, SessionUpdate};
use interviewer_core::store::SessionStore;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::info;

/// A wrapper around the `PgPool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for Db {
    async fn create(&self, state: SessionState) -> Result<(), StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO interview_sessions (thread_id, username, variant, state, finished)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (thread_id) DO NOTHING
            "#,
        )
        .bind(&state.thread_id)
        .bind(&state.identity)
        .bind(state.variant.to_string())
        .bind(Json(&state))
        .bind(state.finished)
        .execute(&self.pool)
        .await
        .context("Failed to insert session")?;

        if inserted.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(state.thread_id));
        }
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>, StoreError> {
        let row: Option<(Json<SessionState>,)> =
            sqlx::query_as("SELECT state FROM interview_sessions WHERE thread_id = $1")
                .bind(thread_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load session")?;
        Ok(row.map(|(Json(state),)| state))
    }

    async fn put(
        &self,
        thread_id: &str,
        update: SessionUpdate,
    ) -> Result<SessionState, StoreError> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        let row: Option<(Json<SessionState>,)> = sqlx::query_as(
            "SELECT state FROM interview_sessions WHERE thread_id = $1 FOR UPDATE",
        )
        .bind(thread_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock session")?;
        let Some((Json(mut state),)) = row else {
            return Err(StoreError::NotFound(thread_id.to_string()));
        };

        state.apply(update);

        sqlx::query(
            r#"
            UPDATE interview_sessions
            SET state = $2, finished = $3, updated_at = NOW()
            WHERE thread_id = $1
            "#,
        )
        .bind(thread_id)
        .bind(Json(&state))
        .bind(state.finished)
        .execute(&mut *tx)
        .await
        .context("Failed to update session")?;

        tx.commit().await.context("Failed to commit session update")?;
        Ok(state)
    }
}

#[async_trait]
impl ResultsSink for Db {
    /// Stores the result and its per-question verdicts in one transaction.
    ///
    /// A second record for the same thread is ignored, so a retried offer after a
    /// lost acknowledgement cannot duplicate rows.
    async fn record(&self, result: InterviewResult) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let id: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO interview_results (thread_id, username, variant, final_rating)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (thread_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&result.thread_id)
        .bind(&result.identity)
        .bind(result.variant.to_string())
        .bind(result.final_rating.score().map(i16::from))
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to insert interview result")?;

        let Some((result_id,)) = id else {
            info!(thread_id = %result.thread_id, "Result already stored; skipping");
            return Ok(());
        };

        for (position, entry) in result.report.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO interview_answers (result_id, position, question, answer, evaluation, verdict)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(result_id)
            .bind(position as i32)
            .bind(&entry.question)
            .bind(&entry.answer)
            .bind(&entry.evaluation)
            .bind(entry.verdict.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to insert interview answer")?;
        }

        tx.commit().await?;
        info!(
            thread_id = %result.thread_id,
            username = %result.identity,
            rating = %result.final_rating,
            "Interview result stored"
        );
        Ok(())
    }
}
