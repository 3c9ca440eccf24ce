use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult};

/// Rounds to two decimals, the precision every reported rate and average uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` in percent, zero when `whole` is zero.
pub fn rate(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Improvement is only meaningful once both kinds of exam were taken.
pub fn improvement(avg_initial: Option<f64>, avg_final: Option<f64>) -> f64 {
    match (avg_initial, avg_final) {
        (Some(initial), Some(fin)) => round2(fin - initial),
        _ => 0.0,
    }
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct PopularLevel {
    pub name: String,
    pub purchases: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PlatformStatistics {
    pub total_users: i64,
    pub total_levels: i64,
    pub total_purchases: i64,
    pub completed_levels: i64,
    pub completion_rate: f64,
    pub popular_levels: Vec<PopularLevel>,
}

impl PlatformStatistics {
    pub async fn collect(mm: &ModelManager) -> DatabaseResult<Self> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'client'")
            .fetch_one(mm.executor())
            .await?;
        let total_levels: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM levels")
            .fetch_one(mm.executor())
            .await?;
        let (total_purchases, completed_levels): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_completed) FROM enrollments",
        )
        .fetch_one(mm.executor())
        .await?;

        let popular_levels = sqlx::query_as(
            r#"
            SELECT l.name, COUNT(e.id) AS purchases
            FROM levels l
            JOIN enrollments e ON e.level_id = l.id
            GROUP BY l.id, l.name
            ORDER BY purchases DESC, l.name
            LIMIT 5
            "#,
        )
        .fetch_all(mm.executor())
        .await?;

        Ok(Self {
            total_users,
            total_levels,
            total_purchases,
            completed_levels,
            completion_rate: rate(completed_levels, total_purchases),
            popular_levels,
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserStatistics {
    pub user_id: Uuid,
    pub user_name: String,
    pub purchased_levels: i64,
    pub completed_levels: i64,
    pub completion_rate: f64,
    pub average_initial_score: f64,
    pub average_final_score: f64,
    pub average_improvement: f64,
    pub total_exams_taken: i64,
}

#[derive(Debug, FromRow)]
struct ExamAggregate {
    avg_initial: Option<f64>,
    avg_final: Option<f64>,
    total: i64,
}

impl UserStatistics {
    /// `None` when the user does not exist.
    pub async fn collect(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Option<Self>> {
        let user_name: Option<String> = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(mm.executor())
            .await?;
        let Some(user_name) = user_name else {
            return Ok(None);
        };

        let (purchased_levels, completed_levels): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_completed)
            FROM enrollments WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(mm.executor())
        .await?;

        let exams: ExamAggregate = sqlx::query_as(
            r#"
            SELECT
                AVG(percentage) FILTER (WHERE exam_type = 'initial') AS avg_initial,
                AVG(percentage) FILTER (WHERE exam_type = 'final') AS avg_final,
                COUNT(*) AS total
            FROM exam_results WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(Some(Self {
            user_id,
            user_name,
            purchased_levels,
            completed_levels,
            completion_rate: rate(completed_levels, purchased_levels),
            average_initial_score: round2(exams.avg_initial.unwrap_or_default()),
            average_final_score: round2(exams.avg_final.unwrap_or_default()),
            average_improvement: improvement(exams.avg_initial, exams.avg_final),
            total_exams_taken: exams.total,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(12.0), 12.0);
        assert_eq!(round2(-3.14159), -3.14);
    }

    #[test]
    fn rate_of_nothing_is_zero() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(3, 0), 0.0);
    }

    #[test]
    fn rate_is_a_rounded_percentage() {
        assert_eq!(rate(1, 3), 33.33);
        assert_eq!(rate(2, 4), 50.0);
        assert_eq!(rate(5, 5), 100.0);
    }

    #[test]
    fn improvement_needs_both_averages() {
        assert_eq!(improvement(Some(40.0), None), 0.0);
        assert_eq!(improvement(None, Some(80.0)), 0.0);
        assert_eq!(improvement(Some(40.0), Some(82.5)), 42.5);
        assert_eq!(improvement(Some(90.0), Some(60.0)), -30.0);
    }
}
