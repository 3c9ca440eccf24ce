use crate::model::entity::Level;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Video {
    id: Uuid,
    level_id: Uuid,
    link: String,
    questions: Vec<String>,
    order_index: i32,
}

impl ResourceTyped for Video {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Video
    }
}

impl Video {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn level_id(&self) -> Uuid {
        self.level_id
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

/// `order_index` defaults to the end of the level's list. `level_id` is ignored on update,
/// videos never move between levels.
#[derive(Debug)]
pub struct VideoCreate {
    pub level_id: Uuid,
    pub link: String,
    pub questions: Vec<String>,
    pub order_index: Option<i32>,
}

#[async_trait]
impl CrudRepository<Video, VideoCreate, uuid::Uuid> for Video {
    /// Runs under [`Level::lock_videos`], so concurrent appends get consecutive positions. An
    /// explicit position already in use fails with a unique violation.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: VideoCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;
        Level::lock_videos(&mut tx, data.level_id).await?;

        let video = sqlx::query_as(
            r#"
            INSERT INTO videos (id, level_id, link, questions, order_index)
            VALUES ($1, $2, $3, $4, COALESCE(
                $5,
                (SELECT COALESCE(MAX(order_index) + 1, 0) FROM videos WHERE level_id = $2)
            ))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.level_id)
        .bind(&data.link)
        .bind(&data.questions)
        .bind(data.order_index)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(video)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: VideoCreate,
    ) -> DatabaseResult<Self> {
        self.link = data.link;
        self.questions = data.questions;
        if let Some(order_index) = data.order_index {
            self.order_index = order_index;
        }

        let mut tx = mm.begin().await?;
        Level::lock_videos(&mut tx, self.level_id).await?;
        sqlx::query("UPDATE videos SET link = $1, questions = $2, order_index = $3 WHERE id = $4")
            .bind(&self.link)
            .bind(&self.questions)
            .bind(self.order_index)
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(self)
    }

    /// Progress rows of this video go with it.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let mut tx = mm.begin().await?;
        Level::lock_videos(&mut tx, self.level_id).await?;
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

impl Video {
    /// Video ids of a level in lesson order.
    pub async fn ordered_ids(conn: &mut PgConnection, level_id: Uuid) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM videos WHERE level_id = $1 ORDER BY order_index, id",
        )
        .bind(level_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }
}

// Utils

/// A level's video as seen by one user.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoWithStatusRow {
    pub id: Uuid,
    pub link: String,
    pub questions: Vec<String>,
    pub order_index: i32,
    pub is_opened: bool,
    pub is_completed: bool,
}

impl VideoWithStatusRow {
    pub async fn all_by_level(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        level_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                v.id,
                v.link,
                v.questions,
                v.order_index,
                COALESCE(p.is_opened, FALSE) AS is_opened,
                COALESCE(p.is_completed, FALSE) AS is_completed
            FROM videos v
            LEFT JOIN enrollments e
                ON e.level_id = v.level_id AND e.user_id = $2
            LEFT JOIN video_progress p
                ON p.video_id = v.id AND p.enrollment_id = e.id
            WHERE v.level_id = $1
            ORDER BY v.order_index, v.id
            "#,
        )
        .bind(level_id)
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
