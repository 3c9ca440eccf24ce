use serde::Deserialize;
use uuid::Uuid;

use crate::progress::{ProgressError, ProgressResult};

/// Which set of videos "all videos completed" is judged against.
///
/// `Snapshot` uses the progress rows materialised when the user enrolled. `Level` uses the
/// level's current video list, where a video without a progress row counts as not completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionBasis {
    #[default]
    Snapshot,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotFlags {
    pub is_opened: bool,
    pub is_completed: bool,
}

/// One video position of an enrollment. `flags` is `None` when the video has no progress row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSlot {
    video_id: Uuid,
    flags: Option<SlotFlags>,
}

impl TrackSlot {
    pub fn new(video_id: Uuid, flags: Option<SlotFlags>) -> Self {
        Self { video_id, flags }
    }

    pub fn video_id(&self) -> Uuid {
        self.video_id
    }

    pub fn flags(&self) -> Option<SlotFlags> {
        self.flags
    }

    pub fn is_opened(&self) -> bool {
        self.flags.is_some_and(|f| f.is_opened)
    }

    pub fn is_completed(&self) -> bool {
        self.flags.is_some_and(|f| f.is_completed)
    }
}

/// Result of completing one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoStep {
    pub completed: Uuid,
    /// The following video, when it exists and has a progress row. Opening is idempotent.
    pub next_opened: Option<Uuid>,
    pub all_completed: bool,
}

/// Ordered videos of one enrollment with their unlock/completion flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoTrack {
    slots: Vec<TrackSlot>,
}

impl VideoTrack {
    /// `slots` must already be in video order.
    pub fn new(slots: Vec<TrackSlot>) -> Self {
        Self { slots }
    }

    /// Layout for a new enrollment: only the first video is opened.
    pub fn fresh<I>(ordered_videos: I) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        let slots = ordered_videos
            .into_iter()
            .enumerate()
            .map(|(i, video_id)| {
                TrackSlot::new(
                    video_id,
                    Some(SlotFlags {
                        is_opened: i == 0,
                        is_completed: false,
                    }),
                )
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[TrackSlot] {
        &self.slots
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    pub fn completed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_completed()).count()
    }

    /// Vacuously true for an empty track.
    pub fn is_fully_completed(&self) -> bool {
        self.slots.iter().all(TrackSlot::is_completed)
    }

    /// Marks `video_id` completed and opens the video after it.
    ///
    /// Whether the video was opened is not checked, only that it has a progress row. Completing
    /// an already completed video changes nothing but still reports the completion state.
    pub fn complete(&mut self, video_id: Uuid) -> ProgressResult<VideoStep> {
        let index = self
            .slots
            .iter()
            .position(|s| s.video_id == video_id && s.flags.is_some())
            .ok_or(ProgressError::VideoNotAccessible)?;

        if let Some(flags) = self.slots[index].flags.as_mut() {
            flags.is_completed = true;
        }

        let next_opened = match self.slots.get_mut(index + 1) {
            Some(TrackSlot {
                video_id,
                flags: Some(flags),
            }) => {
                flags.is_opened = true;
                Some(*video_id)
            }
            _ => None,
        };

        Ok(VideoStep {
            completed: video_id,
            next_opened,
            all_completed: self.is_fully_completed(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn fresh_track_opens_only_first_video() {
        let videos = ids(4);
        let track = VideoTrack::fresh(videos.clone());

        let opened: Vec<_> = track.slots().iter().filter(|s| s.is_opened()).collect();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].video_id(), videos[0]);
        assert_eq!(track.completed_count(), 0);
        assert!(!track.is_fully_completed());
    }

    #[test]
    fn fresh_track_of_empty_level_has_no_slots() {
        let track = VideoTrack::fresh(Vec::new());
        assert_eq!(track.total_count(), 0);
        assert!(track.is_fully_completed());
    }

    #[test]
    fn completing_opens_the_next_video() {
        let videos = ids(3);
        let mut track = VideoTrack::fresh(videos.clone());

        let step = track.complete(videos[0]).unwrap();
        assert_eq!(step.completed, videos[0]);
        assert_eq!(step.next_opened, Some(videos[1]));
        assert!(!step.all_completed);
        assert!(track.slots()[1].is_opened());
        assert!(!track.slots()[2].is_opened());
    }

    #[test]
    fn completing_last_video_opens_nothing() {
        let videos = ids(2);
        let mut track = VideoTrack::fresh(videos.clone());
        track.complete(videos[0]).unwrap();

        let step = track.complete(videos[1]).unwrap();
        assert_eq!(step.next_opened, None);
        assert!(step.all_completed);
        assert_eq!(track.completed_count(), 2);
    }

    #[test]
    fn unknown_video_is_not_accessible() {
        let mut track = VideoTrack::fresh(ids(2));
        let before = track.clone();

        let res = track.complete(Uuid::new_v4());
        assert!(matches!(res, Err(ProgressError::VideoNotAccessible)));
        assert_eq!(track, before);
    }

    #[test]
    fn closed_video_can_still_be_completed() {
        let videos = ids(3);
        let mut track = VideoTrack::fresh(videos.clone());

        let step = track.complete(videos[2]).unwrap();
        assert_eq!(step.next_opened, None);
        assert!(track.slots()[2].is_completed());
        assert!(!track.slots()[1].is_opened());
    }

    #[test]
    fn recompleting_is_idempotent() {
        let videos = ids(2);
        let mut track = VideoTrack::fresh(videos.clone());
        track.complete(videos[0]).unwrap();
        let after_first = track.clone();

        let step = track.complete(videos[0]).unwrap();
        assert_eq!(track, after_first);
        assert_eq!(step.next_opened, Some(videos[1]));
        assert!(!step.all_completed);
    }

    #[test]
    fn missing_row_blocks_full_completion() {
        let videos = ids(3);
        let done = Some(SlotFlags {
            is_opened: true,
            is_completed: true,
        });
        let track = VideoTrack::new(vec![
            TrackSlot::new(videos[0], done),
            TrackSlot::new(videos[1], done),
            TrackSlot::new(videos[2], None),
        ]);

        assert!(!track.is_fully_completed());
        assert_eq!(track.completed_count(), 2);
        assert_eq!(track.total_count(), 3);
    }

    #[test]
    fn missing_row_cannot_be_completed_or_opened() {
        let videos = ids(2);
        let mut track = VideoTrack::new(vec![
            TrackSlot::new(
                videos[0],
                Some(SlotFlags {
                    is_opened: true,
                    is_completed: false,
                }),
            ),
            TrackSlot::new(videos[1], None),
        ]);

        assert!(matches!(
            track.complete(videos[1]),
            Err(ProgressError::VideoNotAccessible)
        ));

        let step = track.complete(videos[0]).unwrap();
        assert_eq!(step.next_opened, None);
        assert!(!step.all_completed);
    }

    #[test]
    fn full_walk_unlocks_in_order() {
        let videos = ids(3);
        let mut track = VideoTrack::fresh(videos.clone());

        for (i, video) in videos.iter().enumerate() {
            assert!(track.slots()[i].is_opened());
            let step = track.complete(*video).unwrap();
            assert_eq!(step.all_completed, i == videos.len() - 1);
        }
        assert!(track.slots().iter().all(|s| s.is_opened() && s.is_completed()));
    }
}
