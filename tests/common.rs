use std::collections::HashMap;

use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use lexis::{
    auth::hash_password,
    build_server_with_pool,
    model::{CrudRepository, DbConnection, ModelManager, entity::{UserEntity, UserEntityCreateUpdate}},
    web::{AuthenticatedUser, UserRole},
};
use serde_json::{Value, json};
use sqlx::{Executor, PgPool, postgres::PgPoolOptions};
use tower_cookies::Cookie;
use url::Url;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@lexis.test";
pub const ADMIN_PASSWORD: &str = "admin";

/// Creates a throw-away database, or `None` when `TEST_DATABASE_ADMIN_URL` is not set.
pub async fn setup_test_db() -> Option<FlowDatabase> {
    let _ = dotenvy::dotenv();
    let Ok(admin_url) = std::env::var("TEST_DATABASE_ADMIN_URL") else {
        println!("TEST_DATABASE_ADMIN_URL is not set, skipping database test");
        return None;
    };
    let db_name = format!("test_db_{}", Uuid::new_v4());

    let mut url = Url::parse(&admin_url).unwrap();

    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(url.as_str())
        .await
        .unwrap();

    admin_pool
        .execute(format!(r#"CREATE DATABASE "{}""#, db_name).as_str())
        .await
        .unwrap();

    url.set_path(&db_name);

    let test_db_url = url.to_string();

    let pool = PgPool::connect(&test_db_url).await.unwrap();
    DbConnection::from_pool(pool.clone()).migrate().await.unwrap();

    Some(FlowDatabase {
        db_name,
        admin_url,
        pool,
    })
}

/// `FlowDatabase` represents temporary postgres database. This database deletes on `Drop`(when it
/// comes out of scope)
// FIXME: Drop database even if the test panics
pub struct FlowDatabase {
    db_name: String,
    admin_url: String,
    pool: PgPool,
}

impl FlowDatabase {
    pub fn mm(&self) -> ModelManager {
        ModelManager::new(DbConnection::from_pool(self.pool.clone()))
    }
}

impl Drop for FlowDatabase {
    fn drop(&mut self) {
        let db_name = self.db_name.clone();
        let admin_url = self.admin_url.clone();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn_blocking(move || {
                // fresh runtime inside this blocking thread
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async move {
                    if let Ok(admin_pool) = PgPool::connect(&admin_url).await {
                        admin_pool
                            .execute(format!(r#"DROP DATABASE "{}" WITH (FORCE)"#, db_name).as_str())
                            .await.expect("Unable to drop database");
                    }
                });
            });
        }
    }
}

/// Admins cannot sign up through the API, so the account is written directly.
pub async fn seed_admin(db: &FlowDatabase) -> UserEntity {
    UserEntity::create(
        &db.mm(),
        &AuthenticatedUser::system(),
        UserEntityCreateUpdate {
            name: String::from("admin"),
            email: String::from(ADMIN_EMAIL),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            role: UserRole::Admin,
            picture: String::new(),
        },
    )
    .await
    .unwrap()
}

pub async fn setup_server(pool: &FlowDatabase) -> TestServer {
    let pool = DbConnection::from_pool(pool.pool.clone());
    let server = build_server_with_pool(pool).await.unwrap().1;
    TestServer::new(server).unwrap()
}

/// Values saved by earlier steps of a flow, keyed by `with_save_as`.
#[derive(Debug, Default)]
pub struct FlowContext {
    store: HashMap<&'static str, Value>,
}

impl FlowContext {
    pub fn get(&self, key: &str) -> &Value {
        self.store
            .get(key)
            .unwrap_or_else(|| panic!("nothing saved as `{key}`"))
    }

    /// `id` field of a saved JSON object.
    pub fn id(&self, key: &str) -> String {
        self.get(key)["id"]
            .as_str()
            .unwrap_or_else(|| panic!("saved `{key}` has no id"))
            .to_string()
    }
}

type PathFn = Box<dyn Fn(&FlowContext) -> String + Send + Sync>;
type CookieCheck = Box<dyn Fn(&Cookie) + Send + Sync>;
type BodyCheck = Box<dyn Fn(&Value) + Send + Sync>;

enum ActionPath {
    Fixed(String),
    Derived(PathFn),
}

impl ActionPath {
    fn resolve(&self, ctx: &FlowContext) -> String {
        match self {
            Self::Fixed(path) => path.clone(),
            Self::Derived(f) => f(ctx),
        }
    }
}

/// One HTTP request of a flow and what its response must look like.
pub struct Action {
    name: &'static str,
    method: Method,
    path: ActionPath,
    body: Option<Value>,
    expect: StatusCode,
    clear_cookies: bool,
    save_cookies: bool,
    cookie_asserts: Vec<(&'static str, CookieCheck)>,
    body_asserts: Vec<BodyCheck>,
    save_as: Option<&'static str>,
}

impl Action {
    pub fn new(name: &'static str, method: Method, path: &str) -> Self {
        Self {
            name,
            method,
            path: ActionPath::Fixed(path.to_string()),
            body: None,
            expect: StatusCode::OK,
            clear_cookies: false,
            save_cookies: true,
            cookie_asserts: vec![],
            body_asserts: vec![],
            save_as: None,
        }
    }

    /// Path built from values saved by earlier steps.
    pub fn derived<F>(name: &'static str, method: Method, path: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        let mut action = Self::new(name, method, "");
        action.path = ActionPath::Derived(Box::new(path));
        action
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_save_cookies(mut self, save_cookies: bool) -> Self {
        self.save_cookies = save_cookies;
        self
    }

    pub fn with_clear_cookies(mut self, clear_cookies: bool) -> Self {
        self.clear_cookies = clear_cookies;
        self
    }

    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    #[allow(unused)]
    pub fn assert_cookie<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.cookie_asserts.push((name, Box::new(check)));
        self
    }

    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Runs every step in order. `_db` is held so the database outlives the flow.
    pub async fn run(self, server: &mut TestServer, _db: FlowDatabase) {
        let mut ctx = FlowContext::default();
        for action in self.actions {
            let path = action.path.resolve(&ctx);
            println!("==> {} {} {}", action.name, action.method, path);

            if action.clear_cookies {
                server.clear_cookies();
            }
            if action.save_cookies {
                server.save_cookies();
            } else {
                server.do_not_save_cookies();
            }

            let mut req = server.method(action.method, &path);
            if let Some(body) = &action.body {
                req = req.json(body);
            }

            let resp = req.await;
            resp.assert_status(action.expect);

            let cookies = resp.cookies();
            for (cookie_name, check) in &action.cookie_asserts {
                let cookie = cookies
                    .get(cookie_name)
                    .unwrap_or_else(|| panic!("cookie {cookie_name} is not set"));
                check(cookie);
            }

            if action.body_asserts.is_empty() && action.save_as.is_none() {
                continue;
            }

            let body = resp.json::<Value>();
            for check in &action.body_asserts {
                check(&body);
            }
            // error bodies never replace a value saved by an earlier step
            if let Some(key) = action.save_as.filter(|_| action.expect.is_success()) {
                ctx.store.insert(key, body);
            }
        }
    }
}

// Common actions builders

pub fn signup_action(name: &str, email: &str, password: &str) -> Action {
    Action::new("signup", Method::POST, "/api/v1/account/signup").with_body(json!({
        "name": name,
        "email": email,
        "password": password,
    }))
}

pub fn signin_action(email: &str, password: &str) -> Action {
    Action::new("signin", Method::POST, "/api/v1/account/signin").with_body(json!({
        "email": email,
        "password": password,
    }))
}

/// Signs in as the seeded admin, dropping whatever session the flow had.
#[allow(unused)]
pub fn signin_admin_action() -> Action {
    signin_action(ADMIN_EMAIL, ADMIN_PASSWORD).with_clear_cookies(true)
}
