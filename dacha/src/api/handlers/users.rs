use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, AuthenticationRequest},
        pagination::Pagination,
        users::{CurrentUser, UserRegistration, UserResponse, UserUpdate},
    },
    auth::{password, session},
    db::{
        errors::DbError,
        handlers::{Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, Resource, UserId},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

/// Hash a password on a blocking thread with the configured Argon2 parameters.
pub(crate) async fn hash_password(state: &AppState, password: String) -> Result<String> {
    let params = state.config.auth.password.argon2_params();
    tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

fn issue_token(user: &CurrentUser, state: &AppState) -> Result<AuthResponse> {
    let token = session::create_session_token(user, &state.config)?;
    Ok(AuthResponse { id: user.id, token })
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(Pagination),
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, Query(query): Query<Pagination>) -> Result<Json<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let (skip, limit) = query.params();

    let users = Users::new(&mut conn).list(&UserFilter::new(skip, limit)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(Resource::User, id))?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/users/registration",
    tag = "users",
    summary = "Register a user",
    request_body = UserRegistration,
    responses(
        (status = 200, description = "User registered, with a session token", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Email or phone number already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<UserRegistration>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = body?;
    request.validate(&state.config.auth.password)?;

    let pass_hash = hash_password(&state, request.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            name: request.name,
            email: request.email,
            pass_hash,
            phone_number: request.phone_number,
            location: request.location,
        })
        .await?;

    metrics::counter!("dacha_registrations_total").increment(1);
    info!(user_id = user.id, "Registered user");

    issue_token(&CurrentUser::from(&user), &state).map(Json)
}

#[utoipa::path(
    post,
    path = "/users/authentication",
    tag = "users",
    summary = "Authenticate a user",
    request_body = AuthenticationRequest,
    responses(
        (status = 200, description = "Credentials accepted, with a session token", body = AuthResponse),
        (status = 400, description = "Incorrect password"),
        (status = 404, description = "No user with this email"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn authenticate(
    State(state): State<AppState>,
    body: std::result::Result<Json<AuthenticationRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = body?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::not_found(Resource::User, &request.email))?;

    let hash = user.pass_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&request.password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::bad_request("Incorrect password"));
    }

    metrics::counter!("dacha_logins_total").increment(1);
    issue_token(&CurrentUser::from(&user), &state).map(Json)
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Omitted fields keep their value. A `location` of `{}` removes the stored location.",
    request_body = UserUpdate,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not this user, or email/phone already taken"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
    body: std::result::Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    current_user.ensure_owner(id, Operation::Update, Resource::User)?;

    let Json(request) = body?;
    request.validate(&state.config.auth.password)?;

    let pass_hash = match request.password {
        Some(password) => Some(hash_password(&state, password).await?),
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .update(
            id,
            &UserUpdateDBRequest {
                name: request.name,
                email: request.email,
                pass_hash,
                phone_number: request.phone_number,
                location: request.location,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::not_found(Resource::User, id),
            other => other.into(),
        })?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Deletes the user together with all of their advertisements.",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not this user"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<UserId>) -> Result<StatusCode> {
    current_user.ensure_owner(id, Operation::Delete, Resource::User)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Users::new(&mut conn).delete(id).await? {
        info!(user_id = id, "Deleted user");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found(Resource::User, id))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::auth::AuthResponse;
    use crate::api::models::users::UserResponse;
    use crate::test_utils::{auth_header, create_test_app, create_test_user};
    use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
    use serde_json::json;
    use sqlx::PgPool;

    fn registration(email: &str, phone: &str) -> serde_json::Value {
        json!({
            "name": "Taras",
            "email": email,
            "password": "kobzar-1814",
            "phone_number": phone,
            "location": {"type": "Point", "coordinates": [30.52, 50.45]}
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_then_authenticate(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/users/registration")
            .json(&registration("taras@example.com", "+380441112233"))
            .await;
        response.assert_status_ok();
        let registered: AuthResponse = response.json();
        assert!(!registered.token.is_empty());

        let response = server
            .post("/users/authentication")
            .json(&json!({"email": "taras@example.com", "password": "kobzar-1814"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<AuthResponse>().id, registered.id);

        let response = server
            .post("/users/authentication")
            .json(&json!({"email": "taras@example.com", "password": "wrong-password"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>(), json!({"error": "Incorrect password"}));

        let response = server
            .post("/users/authentication")
            .json(&json!({"email": "nobody@example.com", "password": "kobzar-1814"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_registration_is_forbidden(pool: PgPool) {
        let server = create_test_app(pool).await;

        server
            .post("/users/registration")
            .json(&registration("dup@example.com", "+380440000001"))
            .await
            .assert_status_ok();

        let response = server
            .post("/users/registration")
            .json(&registration("dup@example.com", "+380440000002"))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(
            response.json::<serde_json::Value>()["error"],
            "An account with this email address already exists"
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_and_list_users(pool: PgPool) {
        let user = create_test_user(&pool, "list@example.com").await;
        let server = create_test_app(pool).await;

        let response = server.get(&format!("/users/{}", user.id)).await;
        response.assert_status_ok();
        let fetched: UserResponse = response.json();
        assert_eq!(fetched, user);
        assert_eq!(response.json::<serde_json::Value>()["location"], json!({}));

        let listed: Vec<UserResponse> = server.get("/users").await.json();
        assert_eq!(listed, vec![user]);

        server.get("/users/999999").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_only_the_user_can_update_or_delete_themselves(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let other = create_test_user(&pool, "other@example.com").await;
        let server = create_test_app(pool).await;

        let path = format!("/users/{}", owner.id);
        let rename = json!({"name": "Renamed"});

        server.put(&path).json(&rename).await.assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = auth_header(&other);
        server
            .put(&path)
            .add_header(name, value)
            .json(&rename)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let (name, value) = auth_header(&owner);
        let response = server.put(&path).add_header(name, value).json(&rename).await;
        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, owner.email);

        let (name, value) = auth_header(&owner);
        server
            .delete(&path)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_moves_and_clears_location(pool: PgPool) {
        let server = create_test_app(pool).await;

        let registered: AuthResponse = server
            .post("/users/registration")
            .json(&registration("nomad@example.com", "+380440000003"))
            .await
            .json();
        let path = format!("/users/{}", registered.id);
        let bearer = || {
            (
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", registered.token)).unwrap(),
            )
        };

        let (name, value) = bearer();
        let response = server
            .put(&path)
            .add_header(name, value)
            .json(&json!({"name": "Nomad", "location": null}))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["location"],
            json!({"type": "Point", "coordinates": [30.52, 50.45]})
        );

        let (name, value) = bearer();
        let response = server
            .put(&path)
            .add_header(name, value)
            .json(&json!({"location": {"type": "Point", "coordinates": [24.03, 49.84, 296.0]}}))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["location"],
            json!({"type": "Point", "coordinates": [24.03, 49.84, 296.0]})
        );

        let (name, value) = bearer();
        let response = server.put(&path).add_header(name, value).json(&json!({"location": {}})).await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["location"], json!({}));
    }
}
