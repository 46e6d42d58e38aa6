//! Shared fixtures for unit and HTTP tests.

use crate::{
    AppState, Application,
    api::models::users::{CurrentUser, UserResponse},
    auth::{password, session},
    config::{Config, PasswordConfig, PoolSettings},
    db::{
        handlers::{Categories, Repository, Subcategories, Users},
        models::{
            categories::CategoryCreateDBRequest, subcategories::SubcategoryCreateDBRequest,
            subcategories::SubcategoryDBResponse, users::UserCreateDBRequest,
        },
    },
};
use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use axum_test::TestServer;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::atomic::{AtomicU64, Ordering};

/// Password every fixture user is created with.
pub const TEST_PASSWORD: &str = "password123";

/// Configuration with a signing key and Argon2 costs low enough for tests.
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        database: crate::config::DatabaseConfig {
            // Replaced by the pool handed to the test
            url: "postgres://localhost/dacha_test".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 0,
                ..Default::default()
            },
        },
        auth: crate::config::AuthConfig {
            password: PasswordConfig {
                argon2_memory_kib: 64,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State over a pool that never connects, for routes that fail before touching the database.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    AppState::builder().db(pool).config(config).build()
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    Application::with_pool(create_test_config(), pool)
        .expect("Failed to create application")
        .into_test_server()
}

/// Insert a user directly, skipping the registration route.
pub async fn create_test_user(pool: &PgPool, email: &str) -> UserResponse {
    static PHONE_SUFFIX: AtomicU64 = AtomicU64::new(1_000_000);

    let params = create_test_config().auth.password.argon2_params();
    let pass_hash = password::hash_string_with_params(TEST_PASSWORD, Some(params)).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            pass_hash,
            phone_number: format!("+38050{}", PHONE_SUFFIX.fetch_add(1, Ordering::Relaxed)),
            location: None,
        })
        .await
        .expect("Failed to create test user");

    UserResponse::from(user)
}

/// Create `subcategory` under `category`, creating the category first if needed.
pub async fn create_test_subcategory(pool: &PgPool, category: &str, subcategory: &str) -> SubcategoryDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    let existing = Categories::new(&mut conn)
        .get_by_name(category)
        .await
        .expect("Failed to look up category");
    let category_id = match existing {
        Some(category) => category.id,
        None => {
            Categories::new(&mut conn)
                .create(&CategoryCreateDBRequest {
                    name: category.to_string(),
                })
                .await
                .expect("Failed to create test category")
                .id
        }
    };

    Subcategories::new(&mut conn)
        .create(&SubcategoryCreateDBRequest {
            name: subcategory.to_string(),
            category_id,
        })
        .await
        .expect("Failed to create test subcategory")
}

/// `Authorization: Bearer <token>` for `user`, signed with the test configuration.
pub fn auth_header(user: &UserResponse) -> (HeaderName, HeaderValue) {
    let current_user = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    let token = session::create_session_token(&current_user, &create_test_config()).expect("Failed to create token");
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header value");
    (AUTHORIZATION, value)
}
