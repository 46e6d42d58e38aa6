//! Router-level tests.
//!
//! The first group runs against a pool that never connects: every request here is answered
//! before a connection is needed (validation, authentication, ownership). The journey test at the
//! bottom needs a PostGIS database.

use crate::{
    api::models::{
        ads::{AdCreated, AdResponse},
        auth::AuthResponse,
        subcategories::SubcategoryResponse,
        users::UserResponse,
    },
    build_router,
    test_utils::{auth_header, create_test_app, create_test_state},
};
use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;

fn offline_server() -> TestServer {
    let state = create_test_state();
    TestServer::new(build_router(&state).unwrap()).unwrap()
}

fn some_user(id: i64) -> UserResponse {
    UserResponse {
        id,
        name: "Somebody".to_string(),
        email: format!("user{id}@example.com"),
        location: None,
        phone_number: "+380500000000".to_string(),
    }
}

#[test_log::test(tokio::test)]
async fn test_malformed_json_is_a_json_bad_request() {
    let server = offline_server();

    let response = server
        .post("/categories")
        .text("{\"name\": ")
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = server.post("/categories").json(&json!({"title": "no name"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_registration_validation() {
    let server = offline_server();
    let valid = json!({
        "name": "Mykola",
        "email": "mykola@example.com",
        "password": "long-enough",
        "phone_number": "+380671112233",
    });

    let cases = [
        ("name", json!("")),
        ("email", json!("mykola.example.com")),
        ("password", json!("short")),
        ("phone_number", json!("  ")),
        ("location", json!({"type": "Point", "coordinates": [181.0, 0.0]})),
        ("location", json!({"type": "LineString", "coordinates": [[0.0, 0.0]]})),
    ];

    for (field, value) in cases {
        let mut body = valid.clone();
        body[field] = value.clone();
        let response = server.post("/users/registration").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(
            response.json::<Value>()["error"].is_string(),
            "{field} = {value} should be rejected with a JSON error"
        );
    }
}

#[test_log::test(tokio::test)]
async fn test_owner_routes_require_a_token() {
    let server = offline_server();

    for path in ["/users/1", "/ads/1"] {
        server
            .put(path)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server.delete(path).await.assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = server
        .delete("/users/1")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({"error": "Invalid or expired token"}));
}

#[test_log::test(tokio::test)]
async fn test_users_cannot_change_each_other() {
    let server = offline_server();
    let (name, value) = auth_header(&some_user(2));

    let response = server
        .put("/users/1")
        .add_header(name.clone(), value.clone())
        .json(&json!({"name": "Hijacked"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>(), json!({"error": "Not allowed to update this user"}));

    server
        .delete("/users/1")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn test_taxonomy_and_ad_validation() {
    let server = offline_server();

    server
        .post("/categories")
        .json(&json!({"name": " "}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/subcategories")
        .json(&json!({"category": "", "name": "Bikes"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let ad = json!({
        "title": "Tent",
        "price": "50 EUR",
        "subcategory": "Camping",
        "category": "Sport",
        "user_email": "camper@example.com",
        "datetime": "2024-06-01T08:00:00Z",
        "location": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]}
    });
    let response = server.post("/ads").json(&ad).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid location: a linear ring must start and end at the same position"
    );
}

#[test_log::test(tokio::test)]
async fn test_deeply_nested_location_is_rejected() {
    let server = offline_server();

    let location = (0..40).fold(json!({"type": "Point", "coordinates": [30.5, 50.4]}), |inner, _| {
        json!({"type": "GeometryCollection", "geometries": [inner]})
    });
    let response = server
        .post("/users/registration")
        .json(&json!({
            "name": "Nested",
            "email": "nested@example.com",
            "password": "password123",
            "phone_number": "+380500000001",
            "location": location
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid location: geometry collections nest deeper than 16 levels"
    );
}

/// Registration through to deleting the account, which takes the user's ads with it.
#[sqlx::test]
#[test_log::test]
async fn test_marketplace_journey(pool: PgPool) {
    let server = create_test_app(pool).await;

    let registered: AuthResponse = server
        .post("/users/registration")
        .json(&json!({
            "name": "Oksana",
            "email": "oksana@example.com",
            "password": "sunflower-fields",
            "phone_number": "+380931234567",
            "location": {"type": "Point", "coordinates": [35.04, 48.46, 150.0]}
        }))
        .await
        .json();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", registered.token)).unwrap();

    let user: Value = server.get(&format!("/users/{}", registered.id)).await.json();
    assert_eq!(user["location"], json!({"type": "Point", "coordinates": [35.04, 48.46, 150.0]}));

    server
        .post("/categories")
        .json(&json!({"name": "Garden"}))
        .await
        .assert_status_ok();
    let subcategory: SubcategoryResponse = server
        .post("/subcategories")
        .json(&json!({"category": "Garden", "name": "Seeds"}))
        .await
        .json();

    let field = json!({
        "type": "Polygon",
        "coordinates": [[[35.0, 48.4], [35.1, 48.4], [35.1, 48.5], [35.0, 48.4]]]
    });
    let created: AdCreated = server
        .post("/ads")
        .json(&json!({
            "title": "Sunflower seeds",
            "price": "20 UAH/kg",
            "subcategory": "Seeds",
            "category": "Garden",
            "user_email": "oksana@example.com",
            "datetime": "2024-04-15T09:30:00Z",
            "location": field
        }))
        .await
        .json();

    let ads: Vec<AdResponse> = server
        .get(&format!("/ads?subcategory_id={}", subcategory.id))
        .await
        .json();
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].id, created.id);
    assert_eq!(ads[0].user.id, registered.id);
    assert_eq!(serde_json::to_value(&ads[0].location).unwrap(), field);

    server
        .delete(&format!("/subcategories/{}", subcategory.id))
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .delete(&format!("/users/{}", registered.id))
        .add_header(AUTHORIZATION, bearer)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/ads/{}", created.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/subcategories/{}", subcategory.id))
        .await
        .assert_status_ok();
}
