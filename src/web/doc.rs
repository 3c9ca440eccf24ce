use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::account_signup_handler,
        crate::web::routes::account::account_signin_handler,
        crate::web::routes::account::account_verify_handler,
        crate::web::routes::levels::levels_create_handler,
        crate::web::routes::levels::levels_get_handler,
        crate::web::routes::levels::levels_update_handler,
        crate::web::routes::levels::levels_delete_handler,
        crate::web::routes::levels::videos_create_handler,
        crate::web::routes::levels::videos_update_handler,
        crate::web::routes::levels::videos_delete_handler,
        crate::web::routes::progress::progress_purchase_handler,
        crate::web::routes::progress::progress_complete_video_handler,
        crate::web::routes::progress::progress_recompute_handler,
        crate::web::routes::progress::progress_overview_handler,
        crate::web::routes::exams::exams_initial_handler,
        crate::web::routes::exams::exams_final_handler,
        crate::web::routes::exams::exams_history_handler,
        crate::web::routes::admin::admin_assign_handler,
        crate::web::routes::admin::admin_statistics_handler,
        crate::web::routes::admin::admin_user_statistics_handler,
        crate::web::routes::admin::admin_user_delete_handler,
        crate::web::routes::admin::admin_reset_password_handler,
        crate::web::routes::admin::admin_exams_handler,
        crate::web::routes::welcome::welcome_get_handler,
        crate::web::routes::welcome::welcome_set_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Registration and sessions"),
        (name = "levels", description = "Levels and their videos"),
        (name = "progress", description = "Purchases and video progress"),
        (name = "exams", description = "Initial and final vocabulary exams"),
        (name = "admin", description = "Assignments, accounts, exam log and statistics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_progress_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/users/{user_id}/levels/{level_id}/purchase"));
        assert!(paths.contains_key("/api/v1/exams/{level_id}/final"));
        assert!(paths.contains_key("/api/v1/admin/statistics"));
        assert!(paths.contains_key("/api/v1/admin/exams"));
        assert!(paths.contains_key("/api/v1/welcome_video"));
    }
}
