#[allow(dead_code)]
mod common;
use lexis::{
    model::{
        CrudRepository, ModelManager,
        entity::{Enrollment, Level, LevelCreate, UserEntity, UserEntityCreateUpdate, Video, VideoCreate},
    },
    progress::{CompletionBasis, ExamKind, ExamScore, ProgressEngine, ProgressError},
    web::{AuthenticatedUser, UserRole},
};
use std::time::Duration;

use tokio::task::JoinSet;
use uuid::Uuid;

use crate::common::setup_test_db;

struct Fixture {
    user: Uuid,
    level: Uuid,
    videos: Vec<Uuid>,
}

async fn add_video(mm: &ModelManager, level: Uuid, n: usize) -> Uuid {
    Video::create(
        mm,
        &AuthenticatedUser::system(),
        VideoCreate {
            level_id: level,
            link: format!("https://video.example/{n}"),
            questions: vec![],
            order_index: None,
        },
    )
    .await
    .unwrap()
    .id()
}

async fn fixture(mm: &ModelManager, videos: usize) -> Fixture {
    let actor = AuthenticatedUser::system();
    let user = UserEntity::create(
        mm,
        &actor,
        UserEntityCreateUpdate {
            name: String::from("learner"),
            email: format!("{}@lexis.test", Uuid::new_v4()),
            password_hash: String::from("hash"),
            role: UserRole::Client,
            picture: String::new(),
        },
    )
    .await
    .unwrap();
    let level = Level::create(
        mm,
        &actor,
        LevelCreate {
            name: String::from("B1"),
            description: None,
            level_number: 3,
            price: 0.0,
            initial_exam_question: None,
            final_exam_question: None,
        },
    )
    .await
    .unwrap();

    let mut ids = Vec::with_capacity(videos);
    for n in 0..videos {
        ids.push(add_video(mm, level.id(), n).await);
    }

    Fixture {
        user: user.id(),
        level: level.id(),
        videos: ids,
    }
}

#[tokio::test]
async fn enroll_twice_is_rejected() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 2).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);

    let enrollment = engine.enroll(fx.user, fx.level).await.unwrap();
    assert!(!enrollment.can_take_final_exam());
    assert!(!enrollment.is_completed());

    let res = engine.enroll(fx.user, fx.level).await;
    assert!(matches!(res, Err(ProgressError::AlreadyEnrolled)));

    let res = engine.enroll(Uuid::new_v4(), fx.level).await;
    assert!(matches!(res, Err(ProgressError::NotFound(_))));
}

#[tokio::test]
async fn snapshot_basis_ignores_videos_added_later() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 2).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);

    engine.enroll(fx.user, fx.level).await.unwrap();
    add_video(&mm, fx.level, 99).await;

    engine.complete_video(fx.user, fx.level, fx.videos[0]).await.unwrap();
    let done = engine.complete_video(fx.user, fx.level, fx.videos[1]).await.unwrap();
    assert_eq!(done.total_videos_count, 2);
    assert!(done.can_take_final_exam);

    let recount = engine.recompute(fx.user, fx.level).await.unwrap();
    assert_eq!(recount.completed_videos_count, 2);
    assert!(recount.can_take_final_exam);
}

#[tokio::test]
async fn level_basis_counts_videos_added_later() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 2).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Level);

    engine.enroll(fx.user, fx.level).await.unwrap();
    let late = add_video(&mm, fx.level, 99).await;

    engine.complete_video(fx.user, fx.level, fx.videos[0]).await.unwrap();
    let done = engine.complete_video(fx.user, fx.level, fx.videos[1]).await.unwrap();
    assert_eq!(done.total_videos_count, 3);
    assert_eq!(done.completed_videos_count, 2);
    assert_eq!(done.next_video_id, None);
    assert!(!done.can_take_final_exam);

    // the late video has no progress row for this enrollment
    let res = engine.complete_video(fx.user, fx.level, late).await;
    assert!(matches!(res, Err(ProgressError::VideoNotAccessible)));

    let recount = engine.recompute(fx.user, fx.level).await.unwrap();
    assert!(!recount.can_take_final_exam);

    let res = engine
        .submit_exam(fx.user, fx.level, ExamKind::Final, ExamScore::new(5, 5))
        .await;
    assert!(matches!(res, Err(ProgressError::FinalExamLocked)));
}

#[tokio::test]
async fn empty_level_unlocks_on_recompute() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 0).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);

    let enrollment = engine.enroll(fx.user, fx.level).await.unwrap();
    assert!(!enrollment.can_take_final_exam());

    let recount = engine.recompute(fx.user, fx.level).await.unwrap();
    assert_eq!(recount.total_videos_count, 0);
    assert!(recount.can_take_final_exam);

    let stored = Enrollment::find(&mm, fx.user, fx.level).await.unwrap().unwrap();
    assert!(stored.can_take_final_exam());
}

#[tokio::test]
async fn exams_keep_history_and_summary() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 1).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);

    engine.enroll(fx.user, fx.level).await.unwrap();
    engine
        .submit_exam(fx.user, fx.level, ExamKind::Initial, ExamScore::new(1, 3))
        .await
        .unwrap();
    let retake = engine
        .submit_exam(fx.user, fx.level, ExamKind::Initial, ExamScore::new(2, 2))
        .await
        .unwrap();
    assert_eq!(retake.enrollment.initial_exam_score(), Some(50.0));

    engine.complete_video(fx.user, fx.level, fx.videos[0]).await.unwrap();
    let fin = engine
        .submit_exam(fx.user, fx.level, ExamKind::Final, ExamScore::new(0, 0))
        .await
        .unwrap();
    assert_eq!(fin.exam.percentage(), 0.0);
    assert_eq!(fin.enrollment.score_difference(), Some(-50.0));
    assert!(fin.enrollment.is_completed());

    let history = lexis::model::entity::ExamResult::all_by_user_level(&mm, fx.user, fx.level)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_get_distinct_positions() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 0).await;
    let level = fx.level;

    let mut set = JoinSet::new();
    for n in 0..20 {
        let mm = mm.clone();
        set.spawn(async move {
            Video::create(
                &mm,
                &AuthenticatedUser::system(),
                VideoCreate {
                    level_id: level,
                    link: format!("https://video.example/{n}"),
                    questions: vec![],
                    order_index: None,
                },
            )
            .await
            .unwrap()
            .order_index()
        });
    }
    let mut positions = set.join_all().await;
    positions.sort_unstable();
    assert_eq!(positions, (0..20).collect::<Vec<i32>>());

    let taken = Video::create(
        &mm,
        &AuthenticatedUser::system(),
        VideoCreate {
            level_id: fx.level,
            link: String::from("https://video.example/dup"),
            questions: vec![],
            order_index: Some(7),
        },
    )
    .await
    .unwrap_err();
    assert!(taken.is_unique_violation());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_enroll_once() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 2).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);

    let (user, level) = (fx.user, fx.level);

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let engine = engine.clone();
        set.spawn(async move { engine.enroll(user, level).await });
    }
    let results = set.join_all().await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(ProgressError::AlreadyEnrolled)))
            .count(),
        7
    );

    let recount = engine.recompute(fx.user, fx.level).await.unwrap();
    assert_eq!(recount.total_videos_count, 2);
    assert_eq!(recount.completed_videos_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_unlock_final_exam() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 4).await;
    let engine = ProgressEngine::new(mm.clone(), CompletionBasis::Snapshot);
    engine.enroll(fx.user, fx.level).await.unwrap();

    let (user, level) = (fx.user, fx.level);

    let mut set = JoinSet::new();
    for video in fx.videos.clone() {
        let engine = engine.clone();
        set.spawn(async move { engine.complete_video(user, level, video).await.unwrap() });
    }
    let completions = set.join_all().await;

    let mut counts: Vec<usize> = completions.iter().map(|c| c.completed_videos_count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4]);
    assert_eq!(completions.iter().filter(|c| c.can_take_final_exam).count(), 1);

    let stored = Enrollment::find(&mm, fx.user, fx.level).await.unwrap().unwrap();
    assert!(stored.can_take_final_exam());

    engine
        .submit_exam(fx.user, fx.level, ExamKind::Final, ExamScore::new(3, 1))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn enrollment_snapshot_holds_off_appends() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let mm = db.mm();
    let fx = fixture(&mm, 1).await;

    let mut tx = mm.begin().await.unwrap();
    assert!(Level::lock_shared(&mut tx, fx.level).await.unwrap());

    let append = tokio::spawn({
        let mm = mm.clone();
        let level = fx.level;
        async move { add_video(&mm, level, 1).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!append.is_finished());

    tx.commit().await.unwrap();
    append.await.unwrap();

    let mut conn = mm.begin().await.unwrap();
    let ids = Video::ordered_ids(&mut conn, fx.level).await.unwrap();
    assert_eq!(ids.len(), 2);
}
