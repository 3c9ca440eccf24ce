mod engine;
pub use engine::{ExamSubmission, ProgressEngine, ProgressRecount, VideoCompletion};

mod error;
pub use error::{ProgressError, ProgressResult};

mod exam;
pub use exam::{ExamKind, ExamScore};

mod state;
pub use state::{EnrollmentState, LevelStage};

mod track;
pub use track::{CompletionBasis, SlotFlags, TrackSlot, VideoStep, VideoTrack};
