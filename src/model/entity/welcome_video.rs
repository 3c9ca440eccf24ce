use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};

/// The platform-wide introduction video. At most one exists, setting it replaces the old one.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct WelcomeVideo {
    video_url: String,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for WelcomeVideo {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::WelcomeVideo
    }
}

impl WelcomeVideo {
    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn updated_at(&self) -> &DateTime<Utc> {
        &self.updated_at
    }
}

impl WelcomeVideo {
    pub async fn set(mm: &ModelManager, video_url: &str) -> DatabaseResult<Self> {
        let video = sqlx::query_as(
            r#"
            INSERT INTO welcome_video (id, video_url, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE
                SET video_url = EXCLUDED.video_url, updated_at = EXCLUDED.updated_at
            RETURNING video_url, updated_at
            "#,
        )
        .bind(video_url)
        .fetch_one(mm.executor())
        .await?;
        Ok(video)
    }

    pub async fn get(mm: &ModelManager) -> DatabaseResult<Option<Self>> {
        let video = sqlx::query_as("SELECT video_url, updated_at FROM welcome_video WHERE id = 1")
            .fetch_optional(mm.executor())
            .await?;
        Ok(video)
    }
}
