use serde::Serialize;

use crate::progress::{ExamKind, ProgressError, ProgressResult};

/// Where an enrollment stands in the level's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LevelStage {
    Enrolled,
    FinalExamUnlocked,
    LevelCompleted,
}

/// Summary flags and scores of one enrollment.
///
/// Both flags only ever move from `false` to `true`; nothing here clears them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnrollmentState {
    pub is_completed: bool,
    pub can_take_final_exam: bool,
    pub initial_exam_score: Option<f64>,
    pub final_exam_score: Option<f64>,
    pub score_difference: Option<f64>,
}

impl EnrollmentState {
    pub fn stage(&self) -> LevelStage {
        if self.is_completed {
            LevelStage::LevelCompleted
        } else if self.can_take_final_exam {
            LevelStage::FinalExamUnlocked
        } else {
            LevelStage::Enrolled
        }
    }

    /// Returns `true` when the flag actually flipped.
    pub fn unlock_final_exam(&mut self) -> bool {
        if self.can_take_final_exam {
            return false;
        }
        self.can_take_final_exam = true;
        true
    }

    /// Mirrors an exam percentage into the summary. Leaves the state untouched on error.
    pub fn record_exam(&mut self, kind: ExamKind, percentage: f64) -> ProgressResult<()> {
        match kind {
            ExamKind::Initial => {
                self.initial_exam_score = Some(percentage);
            }
            ExamKind::Final => {
                if !self.can_take_final_exam {
                    return Err(ProgressError::FinalExamLocked);
                }
                self.final_exam_score = Some(percentage);
                if let Some(initial) = self.initial_exam_score {
                    self.score_difference = Some(percentage - initial);
                }
                self.is_completed = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_enrollment_is_enrolled() {
        let state = EnrollmentState::default();
        assert_eq!(state.stage(), LevelStage::Enrolled);
        assert!(!state.can_take_final_exam);
        assert!(!state.is_completed);
    }

    #[test]
    fn final_exam_is_locked_until_unlocked() {
        let mut state = EnrollmentState::default();
        let before = state;

        let res = state.record_exam(ExamKind::Final, 90.0);
        assert!(matches!(res, Err(ProgressError::FinalExamLocked)));
        assert_eq!(state, before);
    }

    #[test]
    fn unlock_is_monotonic() {
        let mut state = EnrollmentState::default();
        assert!(state.unlock_final_exam());
        assert!(!state.unlock_final_exam());
        assert!(state.can_take_final_exam);
        assert_eq!(state.stage(), LevelStage::FinalExamUnlocked);
    }

    #[test]
    fn initial_exam_is_last_write_wins() {
        let mut state = EnrollmentState::default();
        state.record_exam(ExamKind::Initial, 40.0).unwrap();
        state.record_exam(ExamKind::Initial, 55.0).unwrap();
        assert_eq!(state.initial_exam_score, Some(55.0));
        assert_eq!(state.stage(), LevelStage::Enrolled);
    }

    #[test]
    fn final_exam_sets_difference_and_completes() {
        let mut state = EnrollmentState::default();
        state.record_exam(ExamKind::Initial, 60.0).unwrap();
        state.unlock_final_exam();
        state.record_exam(ExamKind::Final, 90.0).unwrap();

        assert_eq!(state.final_exam_score, Some(90.0));
        assert_eq!(state.score_difference, Some(30.0));
        assert!(state.is_completed);
        assert_eq!(state.stage(), LevelStage::LevelCompleted);
    }

    #[test]
    fn final_exam_without_initial_leaves_difference_unset() {
        let mut state = EnrollmentState::default();
        state.unlock_final_exam();
        state.record_exam(ExamKind::Final, 75.0).unwrap();

        assert_eq!(state.final_exam_score, Some(75.0));
        assert_eq!(state.score_difference, None);
        assert!(state.is_completed);
    }

    #[test]
    fn completion_survives_later_submissions() {
        let mut state = EnrollmentState::default();
        state.unlock_final_exam();
        state.record_exam(ExamKind::Final, 50.0).unwrap();
        state.record_exam(ExamKind::Initial, 20.0).unwrap();
        state.record_exam(ExamKind::Final, 80.0).unwrap();

        assert!(state.is_completed);
        assert!(state.can_take_final_exam);
        assert_eq!(state.score_difference, Some(60.0));
    }
}
