//! Tests for registration, email verification, login gating, password reset
//! and the role guards on the route tree.

mod common;

use axum::http::StatusCode;
use common::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use car_rental_backend::entities::user::{self, UserRole};

#[tokio::test]
async fn registration_and_email_verification_flow() {
    let (app, db) = spawn_app().await;

    let response = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "full_name": "New Customer",
            "email": "new@example.com",
            "password": TEST_PASSWORD
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unverified customers cannot log in yet.
    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "new@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let stored = user::Entity::find()
        .filter(user::Column::Email.eq("new@example.com"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let token = stored.email_verify_token.clone().expect("verify token set");

    let response = request(
        &app,
        "GET",
        &format!("/api/auth/verify-email?token={}", token),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = login(&app, "new@example.com").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, db) = spawn_app().await;
    insert_user(&db, UserRole::Customer, "taken@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "full_name": "Copy Cat",
            "email": "taken@example.com",
            "password": TEST_PASSWORD
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_and_blocked_accounts_cannot_log_in() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "customer@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    insert_user_with(&db, UserRole::Customer, "blocked@example.com", true, true).await;
    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "blocked@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_flow_with_mailed_code() {
    let (app, db) = spawn_app().await;

    let id = insert_user(&db, UserRole::Customer, "forgetful@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/auth/request-password-reset",
        None,
        Some(serde_json::json!({ "email": "forgetful@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let code = user::Entity::find_by_id(id)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .expect("reset code set");

    // Wrong code is rejected.
    let response = request(
        &app,
        "POST",
        "/api/auth/confirm-password-reset",
        None,
        Some(serde_json::json!({
            "email": "forgetful@example.com",
            "code": "000000",
            "new_password": "brand-new-pw"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request(
        &app,
        "POST",
        "/api/auth/confirm-password-reset",
        None,
        Some(serde_json::json!({
            "email": "forgetful@example.com",
            "code": code,
            "new_password": "brand-new-pw"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "forgetful@example.com",
            "password": "brand-new-pw"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_accounts_are_excluded_from_password_reset() {
    let (app, db) = spawn_app().await;
    insert_user(&db, UserRole::Admin, "admin@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/auth/request-password-reset",
        None,
        Some(serde_json::json!({ "email": "admin@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn role_guards_fence_off_foreign_route_trees() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let token = login(&app, "customer@example.com").await;

    let response = request(&app, "GET", "/api/agent/vehicles", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(&app, "GET", "/api/admin/stats", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No token at all.
    let response = request(&app, "GET", "/api/admin/stats", None, None).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn admin_can_create_agent_and_block_users() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Admin, "admin@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let token = login(&app, "admin@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/admin/agents",
        Some(&token),
        Some(serde_json::json!({
            "full_name": "Fresh Agent",
            "email": "fresh@example.com"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let agent = user::Entity::find()
        .filter(user::Column::Email.eq("fresh@example.com"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(agent.role, UserRole::Agent);
    assert!(agent.must_change_password);

    let response = request(
        &app,
        "PATCH",
        &format!("/api/admin/users/{}/block", customer),
        Some(&token),
        Some(serde_json::json!({ "blocked": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Blocked users cannot log in anymore.
    let response = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "customer@example.com",
            "password": TEST_PASSWORD
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_user_keeps_their_vehicles() {
    let (app, db) = spawn_app().await;

    use car_rental_backend::entities::vehicle;

    insert_user(&db, UserRole::Admin, "admin@example.com").await;
    let agent = insert_user(&db, UserRole::Agent, "leaving@example.com").await;
    let vehicle_id = insert_vehicle(&db, agent, "Orphan Car").await;

    let token = login(&app, "admin@example.com").await;
    let response = request(
        &app,
        "DELETE",
        &format!("/api/admin/users/{}", agent),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(user::Entity::find_by_id(agent).one(&db).await.unwrap().is_none());
    assert!(vehicle::Entity::find_by_id(vehicle_id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}
