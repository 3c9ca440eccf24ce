use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{Enrollment, ExamResult, Level, UserEntity, Video, VideoProgress};
use crate::model::{ModelManager, ResourceType};
use crate::progress::{
    CompletionBasis, ExamKind, ExamScore, LevelStage, ProgressError, ProgressResult, VideoTrack,
};

/// Outcome of marking one video completed.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoCompletion {
    pub video_id: Uuid,
    pub next_video_id: Option<Uuid>,
    pub completed_videos_count: usize,
    pub total_videos_count: usize,
    pub can_take_final_exam: bool,
    pub stage: LevelStage,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressRecount {
    pub completed_videos_count: usize,
    pub total_videos_count: usize,
    pub can_take_final_exam: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ExamSubmission {
    pub exam: ExamResult,
    pub enrollment: Enrollment,
}

/// Drives enrollments through `Enrolled -> FinalExamUnlocked -> LevelCompleted`.
///
/// Every operation runs in its own transaction and holds the enrollment row lock for its whole
/// read-modify-write. Authorisation is the caller's job.
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    mm: ModelManager,
    basis: CompletionBasis,
}

impl ProgressEngine {
    pub fn new(mm: ModelManager, basis: CompletionBasis) -> Self {
        Self { mm, basis }
    }

    pub fn basis(&self) -> CompletionBasis {
        self.basis
    }

    /// Purchase or assignment of a level.
    #[tracing::instrument(skip(self))]
    pub async fn enroll(&self, user_id: Uuid, level_id: Uuid) -> ProgressResult<Enrollment> {
        let mut tx = self.mm.begin().await?;

        if !Level::lock_shared(&mut tx, level_id).await? {
            return Err(ProgressError::NotFound(ResourceType::Level));
        }
        if !UserEntity::exists(&mut tx, user_id).await? {
            return Err(ProgressError::NotFound(ResourceType::User));
        }

        let enrollment = Enrollment::insert(&mut tx, user_id, level_id)
            .await?
            .ok_or(ProgressError::AlreadyEnrolled)?;

        let track = VideoTrack::fresh(Video::ordered_ids(&mut tx, level_id).await?);
        VideoProgress::insert_track(&mut tx, enrollment.id(), &track).await?;

        tx.commit().await?;
        tracing::info!(
            enrollment_id = %enrollment.id(),
            videos = track.total_count(),
            "enrollment created"
        );
        Ok(enrollment)
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_video(
        &self,
        user_id: Uuid,
        level_id: Uuid,
        video_id: Uuid,
    ) -> ProgressResult<VideoCompletion> {
        let mut tx = self.mm.begin().await?;

        let mut enrollment = Enrollment::lock(&mut tx, user_id, level_id)
            .await?
            .ok_or(ProgressError::NotEnrolled)?;
        let mut track =
            VideoProgress::load_track(&mut tx, enrollment.id(), level_id, self.basis).await?;

        let step = track.complete(video_id)?;
        VideoProgress::mark_completed(&mut tx, enrollment.id(), video_id).await?;
        if let Some(next) = step.next_opened {
            VideoProgress::mark_opened(&mut tx, enrollment.id(), next).await?;
            tracing::debug!(video_id = %next, "next video opened");
        }

        let mut state = enrollment.state();
        let unlocked = step.all_completed && state.unlock_final_exam();
        if unlocked {
            enrollment.store_state(&mut tx, state).await?;
        }

        tx.commit().await?;
        tracing::info!(enrollment_id = %enrollment.id(), %video_id, "video completed");
        if unlocked {
            tracing::info!(enrollment_id = %enrollment.id(), "final exam unlocked");
        }

        Ok(VideoCompletion {
            video_id,
            next_video_id: step.next_opened,
            completed_videos_count: track.completed_count(),
            total_videos_count: track.total_count(),
            can_take_final_exam: state.can_take_final_exam,
            stage: state.stage(),
        })
    }

    /// Appends the result to the exam log and mirrors it into the enrollment summary.
    #[tracing::instrument(skip(self))]
    pub async fn submit_exam(
        &self,
        user_id: Uuid,
        level_id: Uuid,
        kind: ExamKind,
        score: ExamScore,
    ) -> ProgressResult<ExamSubmission> {
        let mut tx = self.mm.begin().await?;

        let mut enrollment = Enrollment::lock(&mut tx, user_id, level_id)
            .await?
            .ok_or(ProgressError::NotEnrolled)?;

        let mut state = enrollment.state();
        state.record_exam(kind, score.percentage())?;

        let exam = ExamResult::insert(&mut tx, user_id, level_id, kind, score).await?;
        enrollment.store_state(&mut tx, state).await?;

        tx.commit().await?;
        tracing::info!(
            enrollment_id = %enrollment.id(),
            exam = %kind,
            percentage = exam.percentage(),
            "exam recorded"
        );

        Ok(ExamSubmission { exam, enrollment })
    }

    /// Re-derives final exam eligibility from the video flags. Never clears the flag.
    #[tracing::instrument(skip(self))]
    pub async fn recompute(&self, user_id: Uuid, level_id: Uuid) -> ProgressResult<ProgressRecount> {
        let mut tx = self.mm.begin().await?;

        let mut enrollment = Enrollment::lock(&mut tx, user_id, level_id)
            .await?
            .ok_or(ProgressError::NotEnrolled)?;
        let track = VideoProgress::load_track(&mut tx, enrollment.id(), level_id, self.basis).await?;

        let mut state = enrollment.state();
        if track.is_fully_completed() && state.unlock_final_exam() {
            enrollment.store_state(&mut tx, state).await?;
            tracing::info!(enrollment_id = %enrollment.id(), "final exam unlocked on recompute");
        }

        tx.commit().await?;

        Ok(ProgressRecount {
            completed_videos_count: track.completed_count(),
            total_videos_count: track.total_count(),
            can_take_final_exam: state.can_take_final_exam,
        })
    }
}
