use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Enrollment, Level, VideoWithStatusRow};
use crate::progress::LevelStage;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VideoBody {
    pub link: String,
    #[serde(default)]
    pub questions: Vec<String>,
    pub order_index: Option<i32>,
}

/// A video as shown to one caller. `link` and `questions` stay hidden until the video is opened.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    id: Uuid,
    order_index: i32,
    is_opened: bool,
    is_completed: bool,
    link: Option<String>,
    questions: Option<Vec<String>>,
}

impl VideoResponse {
    pub fn from_row(row: VideoWithStatusRow, reveal_all: bool) -> Self {
        let visible = reveal_all || row.is_opened;
        Self {
            id: row.id,
            order_index: row.order_index,
            is_opened: row.is_opened,
            is_completed: row.is_completed,
            link: visible.then_some(row.link),
            questions: visible.then_some(row.questions),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LevelResponse {
    id: Uuid,
    name: String,
    description: String,
    level_number: i32,
    price: f64,
    initial_exam_question: String,
    final_exam_question: String,
    videos_count: usize,
    is_enrolled: bool,
    is_completed: bool,
    can_take_final_exam: bool,
    stage: Option<LevelStage>,
    videos: Vec<VideoResponse>,
}

impl LevelResponse {
    pub fn new(
        level: Level,
        enrollment: Option<Enrollment>,
        rows: Vec<VideoWithStatusRow>,
        reveal_all: bool,
    ) -> Self {
        let state = enrollment.as_ref().map(Enrollment::state);
        let videos: Vec<_> = rows
            .into_iter()
            .map(|row| VideoResponse::from_row(row, reveal_all))
            .collect();

        Self {
            id: level.id(),
            name: level.name().to_string(),
            description: level.description().to_string(),
            level_number: level.level_number(),
            price: level.price(),
            initial_exam_question: level.initial_exam_question().to_string(),
            final_exam_question: level.final_exam_question().to_string(),
            videos_count: videos.len(),
            is_enrolled: state.is_some(),
            is_completed: state.is_some_and(|s| s.is_completed),
            can_take_final_exam: state.is_some_and(|s| s.can_take_final_exam),
            stage: state.map(|s| s.stage()),
            videos,
        }
    }
}
