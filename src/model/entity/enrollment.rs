use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::progress::EnrollmentState;

/// Binding of one user to one level, with the summary of their progress.
///
/// Rows are only written through the progress engine, always inside a transaction holding the
/// row lock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    level_id: Uuid,
    is_completed: bool,
    can_take_final_exam: bool,
    initial_exam_score: Option<f64>,
    final_exam_score: Option<f64>,
    score_difference: Option<f64>,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn level_id(&self) -> Uuid {
        self.level_id
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn can_take_final_exam(&self) -> bool {
        self.can_take_final_exam
    }

    pub fn initial_exam_score(&self) -> Option<f64> {
        self.initial_exam_score
    }

    pub fn final_exam_score(&self) -> Option<f64> {
        self.final_exam_score
    }

    pub fn score_difference(&self) -> Option<f64> {
        self.score_difference
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn state(&self) -> EnrollmentState {
        EnrollmentState {
            is_completed: self.is_completed,
            can_take_final_exam: self.can_take_final_exam,
            initial_exam_score: self.initial_exam_score,
            final_exam_score: self.final_exam_score,
            score_difference: self.score_difference,
        }
    }
}

impl Enrollment {
    /// `None` when the pair is already enrolled.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        level_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, level_id, is_completed, can_take_final_exam)
            VALUES ($1, $2, $3, FALSE, FALSE)
            ON CONFLICT (user_id, level_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(level_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Fetches and row-locks the enrollment until the surrounding transaction ends.
    pub async fn lock(
        conn: &mut PgConnection,
        user_id: Uuid,
        level_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            "SELECT * FROM enrollments WHERE user_id = $1 AND level_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(level_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    pub async fn store_state(
        &mut self,
        conn: &mut PgConnection,
        state: EnrollmentState,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE enrollments
            SET is_completed = $1,
                can_take_final_exam = $2,
                initial_exam_score = $3,
                final_exam_score = $4,
                score_difference = $5
            WHERE id = $6
            "#,
        )
        .bind(state.is_completed)
        .bind(state.can_take_final_exam)
        .bind(state.initial_exam_score)
        .bind(state.final_exam_score)
        .bind(state.score_difference)
        .bind(self.id)
        .execute(&mut *conn)
        .await?;

        self.is_completed = state.is_completed;
        self.can_take_final_exam = state.can_take_final_exam;
        self.initial_exam_score = state.initial_exam_score;
        self.final_exam_score = state.final_exam_score;
        self.score_difference = state.score_difference;
        Ok(())
    }

    pub async fn find(
        mm: &ModelManager,
        user_id: Uuid,
        level_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 AND level_id = $2")
            .bind(user_id)
            .bind(level_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }
}

// Utils

/// Enrollment joined with the level it belongs to.
#[derive(Debug, sqlx::FromRow)]
pub struct EnrollmentOverviewRow {
    pub enrollment_id: Uuid,
    pub level_id: Uuid,
    pub level_name: String,
    pub level_number: i32,
    pub is_completed: bool,
    pub can_take_final_exam: bool,
    pub initial_exam_score: Option<f64>,
    pub final_exam_score: Option<f64>,
    pub score_difference: Option<f64>,
}

impl EnrollmentOverviewRow {
    pub async fn all_by_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id AS enrollment_id,
                l.id AS level_id,
                l.name AS level_name,
                l.level_number,
                e.is_completed,
                e.can_take_final_exam,
                e.initial_exam_score,
                e.final_exam_score,
                e.score_difference
            FROM enrollments e
            JOIN levels l ON l.id = e.level_id
            WHERE e.user_id = $1
            ORDER BY l.level_number, e.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    pub fn state(&self) -> EnrollmentState {
        EnrollmentState {
            is_completed: self.is_completed,
            can_take_final_exam: self.can_take_final_exam,
            initial_exam_score: self.initial_exam_score,
            final_exam_score: self.final_exam_score,
            score_difference: self.score_difference,
        }
    }
}
