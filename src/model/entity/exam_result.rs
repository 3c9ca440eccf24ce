use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::progress::{ExamKind, ExamScore};

/// One exam submission. The log is append-only, retakes add rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ExamResult {
    id: Uuid,
    user_id: Uuid,
    level_id: Uuid,
    correct_words: i64,
    wrong_words: i64,
    percentage: f64,
    #[serde(rename = "type")]
    exam_type: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for ExamResult {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ExamResult
    }
}

impl ExamResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn level_id(&self) -> Uuid {
        self.level_id
    }

    pub fn correct_words(&self) -> i64 {
        self.correct_words
    }

    pub fn wrong_words(&self) -> i64 {
        self.wrong_words
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

impl ExamResult {
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        level_id: Uuid,
        kind: ExamKind,
        score: ExamScore,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO exam_results
                (id, user_id, level_id, correct_words, wrong_words, percentage, exam_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(level_id)
        .bind(i64::from(score.correct_words()))
        .bind(i64::from(score.wrong_words()))
        .bind(score.percentage())
        .bind(kind.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Submission history of a user for a level, oldest first.
    pub async fn all_by_user_level(
        mm: &ModelManager,
        user_id: Uuid,
        level_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM exam_results
            WHERE user_id = $1 AND level_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .bind(level_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

/// One line of the admin exam log, with the names an admin reads it by.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct ExamLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub level_id: Uuid,
    pub level_name: String,
    pub correct_words: i64,
    pub wrong_words: i64,
    pub percentage: f64,
    #[serde(rename = "type")]
    pub exam_type: String,
    pub created_at: DateTime<Utc>,
}

impl ExamLogRow {
    /// Every submission on the platform, newest first. `kind` narrows it to one exam.
    pub async fn all(mm: &ModelManager, kind: Option<ExamKind>) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT e.id, e.user_id, u.name AS user_name, e.level_id, l.name AS level_name,
                   e.correct_words, e.wrong_words, e.percentage, e.exam_type, e.created_at
            FROM exam_results e
            JOIN users u ON u.id = e.user_id
            JOIN levels l ON l.id = e.level_id
            WHERE $1::TEXT IS NULL OR e.exam_type = $1
            ORDER BY e.created_at DESC, e.id
            "#,
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
