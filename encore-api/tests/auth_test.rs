/// Integration tests for registration, login and bearer authentication

mod common;

use axum::http::StatusCode;
use common::{TestContext, TEST_SECRET};
use encore_shared::auth::jwt::{create_token, Claims};
use encore_shared::models::Role;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let ctx = TestContext::new();

    let (status, value) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Asha Rao",
                "email": "asha@example.com",
                "password": "secret1",
                "role": "musician",
                "profile": { "genre": "Jazz", "location": "Bangalore", "price": "25000" }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(value["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(value["role"], "MUSICIAN");
    assert_eq!(value["name"], "Asha Rao");
    assert_eq!(value["profile"]["genre"], "Jazz");
    assert_eq!(value["profile"]["price"], 25000.0);
    assert!(value.get("password").is_none());
}

#[tokio::test]
async fn test_register_accepts_string_encoded_profile() {
    let ctx = TestContext::new();

    let (status, value) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Stage Co",
                "email": "stage@example.com",
                "password": "secret1",
                "role": "ORGANIZER",
                "profile": "{\"type\":\"Festival\",\"website\":\"https://stage.example\"}"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["profile"]["type"], "Festival");
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let (status, value) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "John",
                "email": "john@example.com",
                "password": "123",
                "role": "USER"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "validation_error");
    assert_eq!(value["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    let body = json!({
        "name": "John",
        "email": "john@example.com",
        "password": "password",
        "role": "USER"
    });

    let (status, _) = ctx.send("POST", "/api/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut again = body;
    again["email"] = json!("JOHN@example.com");
    let (status, value) = ctx.send("POST", "/api/auth/register", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(value["error"], "conflict");
}

#[tokio::test]
async fn test_login_round_trip() {
    let ctx = TestContext::new();
    let account = ctx.attendee().await;

    let (status, value) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": account.email, "password": "password" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["id"], account.id.to_string());
    assert_eq!(value["role"], "USER");

    // The fresh token works on a protected route
    let token = value["token"].as_str().unwrap();
    let (status, _) = ctx
        .send("GET", "/api/events", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let ctx = TestContext::new();
    let account = ctx.attendee().await;

    let (status, value) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": account.email, "password": "wrong-password" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["message"], "Invalid email or password");
    assert!(value.get("token").is_none());
}

#[tokio::test]
async fn test_login_unknown_email_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "password" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, value) = ctx.send("GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["error"], "unauthorized");

    let (status, _) = ctx.send("GET", "/api/events", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_account_is_unauthorized() {
    let ctx = TestContext::new();
    let claims = Claims::new(Uuid::new_v4(), "ghost@example.com", Role::User);
    let token = create_token(&claims, TEST_SECRET).unwrap();

    let (status, _) = ctx
        .send(
            "POST",
            "/api/bookings",
            Some(&token),
            Some(json!({ "eventId": Uuid::new_v4(), "tickets": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();
    let (status, value) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "healthy");
}

#[tokio::test]
async fn test_user_directories() {
    let ctx = TestContext::new();
    let organizer = ctx.organizer().await;
    let musician = ctx.musician().await;
    let attendee = ctx.attendee().await;

    let (status, artists) = ctx.get("/api/users/artists", &attendee).await;
    assert_eq!(status, StatusCode::OK);
    let artists = artists.as_array().unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0]["id"], musician.id.to_string());
    assert_eq!(artists[0]["profile"]["genre"], "Jazz");

    let (_, organizers) = ctx.get("/api/users/organizers", &attendee).await;
    assert_eq!(organizers.as_array().unwrap().len(), 1);

    let (status, user) = ctx
        .get(&format!("/api/users/{}", organizer.id), &attendee)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "ORGANIZER");

    let (status, _) = ctx
        .get(&format!("/api/users/{}", Uuid::new_v4()), &attendee)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
