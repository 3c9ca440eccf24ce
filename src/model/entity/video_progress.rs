use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::progress::{CompletionBasis, SlotFlags, TrackSlot, VideoTrack};

/// Per-video unlock and completion flags of one enrollment, stored one row per
/// `(enrollment, video)`. Rows are only written inside engine transactions.
pub struct VideoProgress;

impl ResourceTyped for VideoProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::VideoProgress
    }
}

#[derive(Debug, FromRow)]
struct TrackRow {
    video_id: Uuid,
    is_opened: Option<bool>,
    is_completed: Option<bool>,
}

impl From<TrackRow> for TrackSlot {
    fn from(row: TrackRow) -> Self {
        let flags = match (row.is_opened, row.is_completed) {
            (Some(is_opened), Some(is_completed)) => Some(SlotFlags {
                is_opened,
                is_completed,
            }),
            _ => None,
        };
        TrackSlot::new(row.video_id, flags)
    }
}

impl VideoProgress {
    /// Materialises every slot of `track` as a progress row.
    pub async fn insert_track(
        conn: &mut PgConnection,
        enrollment_id: Uuid,
        track: &VideoTrack,
    ) -> DatabaseResult<()> {
        for slot in track.slots() {
            let flags = slot.flags().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO video_progress (id, enrollment_id, video_id, is_opened, is_completed)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(enrollment_id)
            .bind(slot.video_id())
            .bind(flags.is_opened)
            .bind(flags.is_completed)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Loads the ordered track of an enrollment.
    pub async fn load_track(
        conn: &mut PgConnection,
        enrollment_id: Uuid,
        level_id: Uuid,
        basis: CompletionBasis,
    ) -> DatabaseResult<VideoTrack> {
        let query = match basis {
            CompletionBasis::Snapshot => {
                r#"
                SELECT v.id AS video_id, p.is_opened, p.is_completed
                FROM video_progress p
                JOIN videos v ON v.id = p.video_id
                WHERE p.enrollment_id = $1 AND v.level_id = $2
                ORDER BY v.order_index, v.id
                "#
            }
            CompletionBasis::Level => {
                r#"
                SELECT v.id AS video_id, p.is_opened, p.is_completed
                FROM videos v
                LEFT JOIN video_progress p
                    ON p.video_id = v.id AND p.enrollment_id = $1
                WHERE v.level_id = $2
                ORDER BY v.order_index, v.id
                "#
            }
        };

        let rows: Vec<TrackRow> = sqlx::query_as(query)
            .bind(enrollment_id)
            .bind(level_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(VideoTrack::new(rows.into_iter().map(TrackSlot::from).collect()))
    }

    pub async fn mark_completed(
        conn: &mut PgConnection,
        enrollment_id: Uuid,
        video_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE video_progress SET is_completed = TRUE WHERE enrollment_id = $1 AND video_id = $2",
        )
        .bind(enrollment_id)
        .bind(video_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn mark_opened(
        conn: &mut PgConnection,
        enrollment_id: Uuid,
        video_id: Uuid,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE video_progress SET is_opened = TRUE WHERE enrollment_id = $1 AND video_id = $2",
        )
        .bind(enrollment_id)
        .bind(video_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

// Utils

/// One video of one of the user's enrolled levels, with its flags when a row exists.
#[derive(Debug, sqlx::FromRow)]
pub struct VideoProgressOverviewRow {
    pub enrollment_id: Uuid,
    pub video_id: Uuid,
    pub order_index: i32,
    pub is_opened: Option<bool>,
    pub is_completed: Option<bool>,
}

impl VideoProgressOverviewRow {
    pub async fn all_by_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id AS enrollment_id,
                v.id AS video_id,
                v.order_index,
                p.is_opened,
                p.is_completed
            FROM enrollments e
            JOIN videos v ON v.level_id = e.level_id
            LEFT JOIN video_progress p
                ON p.video_id = v.id AND p.enrollment_id = e.id
            WHERE e.user_id = $1
            ORDER BY e.id, v.order_index, v.id
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
