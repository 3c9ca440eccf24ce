mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod level;
pub use level::{Level, LevelCreate};

mod video;
pub use video::{Video, VideoCreate, VideoWithStatusRow};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentOverviewRow};

mod video_progress;
pub use video_progress::{VideoProgress, VideoProgressOverviewRow};

mod exam_result;
pub use exam_result::{ExamLogRow, ExamResult};

mod welcome_video;
pub use welcome_video::WelcomeVideo;
