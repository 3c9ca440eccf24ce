use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{EnrollmentOverviewRow, VideoProgressOverviewRow};
use crate::progress::LevelStage;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VideoProgressResponse {
    video_id: Uuid,
    is_opened: bool,
    is_completed: bool,
}

impl From<VideoProgressOverviewRow> for VideoProgressResponse {
    fn from(row: VideoProgressOverviewRow) -> Self {
        Self {
            video_id: row.video_id,
            is_opened: row.is_opened.unwrap_or(false),
            is_completed: row.is_completed.unwrap_or(false),
        }
    }
}

/// Progress of a user in one enrolled level.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LevelProgressResponse {
    user_id: Uuid,
    level_id: Uuid,
    level_name: String,
    level_number: i32,
    completed_videos_count: usize,
    total_videos_count: usize,
    videos_progress: Vec<VideoProgressResponse>,
    is_completed: bool,
    can_take_final_exam: bool,
    initial_exam_score: Option<f64>,
    final_exam_score: Option<f64>,
    score_difference: Option<f64>,
    stage: LevelStage,
}

impl LevelProgressResponse {
    /// Groups video rows under their enrollment, keeping the enrollment order of `enrollments`.
    pub fn from_rows(
        user_id: Uuid,
        enrollments: Vec<EnrollmentOverviewRow>,
        videos: Vec<VideoProgressOverviewRow>,
    ) -> Vec<Self> {
        let mut by_enrollment: HashMap<Uuid, Vec<VideoProgressResponse>> = HashMap::new();
        for row in videos {
            by_enrollment
                .entry(row.enrollment_id)
                .or_default()
                .push(VideoProgressResponse::from(row));
        }

        enrollments
            .into_iter()
            .map(|enrollment| {
                let videos_progress = by_enrollment
                    .remove(&enrollment.enrollment_id)
                    .unwrap_or_default();
                let state = enrollment.state();

                Self {
                    user_id,
                    level_id: enrollment.level_id,
                    level_name: enrollment.level_name,
                    level_number: enrollment.level_number,
                    completed_videos_count: videos_progress
                        .iter()
                        .filter(|v| v.is_completed)
                        .count(),
                    total_videos_count: videos_progress.len(),
                    videos_progress,
                    is_completed: state.is_completed,
                    can_take_final_exam: state.can_take_final_exam,
                    initial_exam_score: state.initial_exam_score,
                    final_exam_score: state.final_exam_score,
                    score_difference: state.score_difference,
                    stage: state.stage(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn enrollment(id: Uuid, name: &str) -> EnrollmentOverviewRow {
        EnrollmentOverviewRow {
            enrollment_id: id,
            level_id: Uuid::new_v4(),
            level_name: name.to_string(),
            level_number: 1,
            is_completed: false,
            can_take_final_exam: false,
            initial_exam_score: Some(40.0),
            final_exam_score: None,
            score_difference: None,
        }
    }

    fn video(enrollment_id: Uuid, order_index: i32, flags: Option<(bool, bool)>) -> VideoProgressOverviewRow {
        VideoProgressOverviewRow {
            enrollment_id,
            video_id: Uuid::new_v4(),
            order_index,
            is_opened: flags.map(|f| f.0),
            is_completed: flags.map(|f| f.1),
        }
    }

    #[test]
    fn groups_videos_by_enrollment() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            video(a, 0, Some((true, true))),
            video(a, 1, Some((true, false))),
            video(b, 0, Some((true, false))),
        ];

        let res = LevelProgressResponse::from_rows(
            Uuid::new_v4(),
            vec![enrollment(a, "A1"), enrollment(b, "A2")],
            rows,
        );

        assert_eq!(res.len(), 2);
        assert_eq!(res[0].level_name, "A1");
        assert_eq!(res[0].total_videos_count, 2);
        assert_eq!(res[0].completed_videos_count, 1);
        assert_eq!(res[1].total_videos_count, 1);
        assert_eq!(res[1].stage, LevelStage::Enrolled);
    }

    #[test]
    fn video_without_row_reads_as_closed() {
        let a = Uuid::new_v4();
        let res = LevelProgressResponse::from_rows(
            Uuid::new_v4(),
            vec![enrollment(a, "B1")],
            vec![video(a, 0, Some((true, true))), video(a, 1, None)],
        );

        let missing = &res[0].videos_progress[1];
        assert!(!missing.is_opened);
        assert!(!missing.is_completed);
        assert_eq!(res[0].completed_videos_count, 1);
    }

    #[test]
    fn enrollment_of_empty_level_has_no_videos() {
        let res = LevelProgressResponse::from_rows(
            Uuid::new_v4(),
            vec![enrollment(Uuid::new_v4(), "C1")],
            Vec::new(),
        );
        assert_eq!(res[0].total_videos_count, 0);
        assert!(res[0].videos_progress.is_empty());
    }
}
