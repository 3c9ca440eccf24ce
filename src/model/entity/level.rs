use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Level {
    id: Uuid,
    name: String,
    description: String,
    level_number: i32,
    price: f64,
    initial_exam_question: String,
    final_exam_question: String,
}

impl ResourceTyped for Level {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Level
    }
}

impl Level {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn level_number(&self) -> i32 {
        self.level_number
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn initial_exam_question(&self) -> &str {
        &self.initial_exam_question
    }

    pub fn final_exam_question(&self) -> &str {
        &self.final_exam_question
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LevelCreate {
    pub name: String,
    pub description: Option<String>,
    pub level_number: i32,
    pub price: f64,
    pub initial_exam_question: Option<String>,
    pub final_exam_question: Option<String>,
}

#[async_trait]
impl CrudRepository<Level, LevelCreate, uuid::Uuid> for Level {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LevelCreate,
    ) -> DatabaseResult<Self> {
        let level = sqlx::query_as(
            r#"
            INSERT INTO levels (id, name, description, level_number, price, initial_exam_question, final_exam_question)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.description.unwrap_or_default())
        .bind(data.level_number)
        .bind(data.price)
        .bind(data.initial_exam_question.unwrap_or_default())
        .bind(data.final_exam_question.unwrap_or_default())
        .fetch_one(mm.executor())
        .await?;

        Ok(level)
    }

    /// Missing optional texts keep their stored value.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LevelCreate,
    ) -> DatabaseResult<Self> {
        self.name = data.name;
        self.level_number = data.level_number;
        self.price = data.price;
        if let Some(description) = data.description {
            self.description = description;
        }
        if let Some(question) = data.initial_exam_question {
            self.initial_exam_question = question;
        }
        if let Some(question) = data.final_exam_question {
            self.final_exam_question = question;
        }

        sqlx::query(
            r#"
            UPDATE levels
            SET name = $1, description = $2, level_number = $3, price = $4,
                initial_exam_question = $5, final_exam_question = $6
            WHERE id = $7
            "#,
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.level_number)
        .bind(self.price)
        .bind(&self.initial_exam_question)
        .bind(&self.final_exam_question)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    /// Cascades to the level's videos, enrollments, progress rows and exam log.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM levels WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM levels WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

impl Level {
    /// Share lock held while a video snapshot is taken. Blocks level deletion and every video
    /// write that goes through [`Level::lock_videos`], but not other share holders. `false` if
    /// absent.
    pub async fn lock_shared(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<bool> {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM levels WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(found.is_some())
    }

    /// Exclusive lock taken before the level's video list changes. Serializes appends with each
    /// other and with enrollments holding [`Level::lock_shared`]. `false` if absent.
    pub async fn lock_videos(conn: &mut PgConnection, id: Uuid) -> DatabaseResult<bool> {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM levels WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn find_by_number(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        level_number: i32,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM levels WHERE level_number = $1 ORDER BY id LIMIT 1")
            .bind(level_number)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}
