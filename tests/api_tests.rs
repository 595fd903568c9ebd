//! End-to-end tests for the booking lifecycle and the ownership checks
//! spanning bookings, vehicles, payments and reviews.

mod common;

use axum::http::StatusCode;
use common::*;

use car_rental_backend::entities::booking::BookingStatus;
use car_rental_backend::entities::user::UserRole;

#[tokio::test]
async fn agent_confirms_booking_on_own_vehicle() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Family SUV").await;
    let booking = insert_booking(&db, customer, vehicle, BookingStatus::Pending, Some(150.0)).await;

    let token = login(&app, "agent@example.com").await;
    let response = request(
        &app,
        "PATCH",
        &format!("/api/agent/bookings/{}/status", booking),
        Some(&token),
        Some(serde_json::json!({ "status": "CONFIRMED" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CONFIRMED");
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Confirmed);
}

#[tokio::test]
async fn agent_cannot_touch_booking_on_another_agents_vehicle() {
    let (app, db) = spawn_app().await;

    let owner = insert_user(&db, UserRole::Agent, "owner@example.com").await;
    insert_user(&db, UserRole::Agent, "intruder@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, owner, "City Car").await;
    let booking = insert_booking(&db, customer, vehicle, BookingStatus::Pending, None).await;

    let token = login(&app, "intruder@example.com").await;
    let response = request(
        &app,
        "PATCH",
        &format!("/api/agent/bookings/{}/status", booking),
        Some(&token),
        Some(serde_json::json!({ "status": "CONFIRMED" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Pending);
}

#[tokio::test]
async fn missing_booking_is_not_found_before_ownership() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let token = login(&app, "agent@example.com").await;

    let response = request(
        &app,
        "PATCH",
        &format!("/api/agent/bookings/{}/status", uuid::Uuid::new_v4()),
        Some(&token),
        Some(serde_json::json!({ "status": "CONFIRMED" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_status_value_is_rejected_before_any_write() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Van").await;
    let booking = insert_booking(&db, customer, vehicle, BookingStatus::Pending, None).await;

    let token = login(&app, "agent@example.com").await;
    let response = request(
        &app,
        "PATCH",
        &format!("/api/agent/bookings/{}/status", booking),
        Some(&token),
        Some(serde_json::json!({ "status": "ARCHIVED" })),
    )
    .await;

    assert!(response.status().is_client_error());
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Pending);
}

#[tokio::test]
async fn admin_status_write_is_unconditional() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Admin, "admin@example.com").await;
    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Coupe").await;
    let booking =
        insert_booking(&db, customer, vehicle, BookingStatus::Completed, Some(90.0)).await;

    // No transition table: COMPLETED may go back to PENDING.
    let token = login(&app, "admin@example.com").await;
    let response = request(
        &app,
        "PATCH",
        &format!("/api/admin/bookings/{}/status", booking),
        Some(&token),
        Some(serde_json::json!({ "status": "PENDING" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Pending);
}

#[tokio::test]
async fn payment_finalizes_booking_to_completed() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Roadster").await;
    let booking = insert_booking(&db, customer, vehicle, BookingStatus::Pending, Some(100.0)).await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/payments",
        Some(&token),
        Some(serde_json::json!({
            "booking_id": booking,
            "amount": 100,
            "method": "MANUAL"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["booking"]["id"], booking.to_string());
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Completed);
}

#[tokio::test]
async fn payment_finalizes_even_a_cancelled_booking() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Hatchback").await;
    let booking =
        insert_booking(&db, customer, vehicle, BookingStatus::Cancelled, Some(60.0)).await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/payments",
        Some(&token),
        Some(serde_json::json!({
            "booking_id": booking,
            "amount": 60,
            "method": "MANUAL"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Completed);
}

#[tokio::test]
async fn paying_for_someone_elses_booking_is_forbidden() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    insert_user(&db, UserRole::Customer, "other@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Pickup").await;
    let booking = insert_booking(&db, customer, vehicle, BookingStatus::Pending, Some(75.0)).await;

    let token = login(&app, "other@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/payments",
        Some(&token),
        Some(serde_json::json!({
            "booking_id": booking,
            "amount": 75,
            "method": "MANUAL"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(booking_status(&db, booking).await, BookingStatus::Pending);
}

#[tokio::test]
async fn paying_for_missing_booking_is_not_found() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let token = login(&app, "customer@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/payments",
        Some(&token),
        Some(serde_json::json!({
            "booking_id": uuid::Uuid::new_v4(),
            "amount": 10,
            "method": "MANUAL"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_requires_a_completed_booking() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Estate").await;
    insert_booking(&db, customer, vehicle, BookingStatus::Pending, None).await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/reviews",
        Some(&token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "rating": 5,
            "comment": "Great car"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_is_allowed_after_completion() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Cabrio").await;
    insert_booking(&db, customer, vehicle, BookingStatus::Completed, Some(120.0)).await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/reviews",
        Some(&token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "rating": 4,
            "comment": "Smooth ride"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["rating"], 4);
    assert_eq!(json["comment"], "Smooth ride");
    assert_eq!(json["user_id"], customer.to_string());
    assert_eq!(json["vehicle_id"], vehicle.to_string());
}

#[tokio::test]
async fn review_rating_must_be_one_to_five() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let customer = insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Limo").await;
    insert_booking(&db, customer, vehicle, BookingStatus::Completed, Some(200.0)).await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/reviews",
        Some(&token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "rating": 6,
            "comment": "Too good"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_author_may_update_or_delete_a_review() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let author = insert_user(&db, UserRole::Customer, "author@example.com").await;
    insert_user(&db, UserRole::Customer, "other@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Minivan").await;
    insert_booking(&db, author, vehicle, BookingStatus::Completed, Some(80.0)).await;

    let author_token = login(&app, "author@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/reviews",
        Some(&author_token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "rating": 3,
            "comment": "Average"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let review_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let other_token = login(&app, "other@example.com").await;
    let response = request(
        &app,
        "PATCH",
        &format!("/api/reviews/{}", review_id),
        Some(&other_token),
        Some(serde_json::json!({ "rating": 1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(
        &app,
        "DELETE",
        &format!("/api/reviews/{}", review_id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(
        &app,
        "DELETE",
        &format!("/api/reviews/{}", review_id),
        Some(&author_token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn agent_vehicle_mutations_are_ownership_checked() {
    let (app, db) = spawn_app().await;

    let owner = insert_user(&db, UserRole::Agent, "owner@example.com").await;
    insert_user(&db, UserRole::Agent, "intruder@example.com").await;
    let vehicle = insert_vehicle(&db, owner, "Sedan").await;

    let token = login(&app, "intruder@example.com").await;
    let response = request(
        &app,
        "PUT",
        &format!("/api/agent/vehicles/{}", vehicle),
        Some(&token),
        Some(serde_json::json!({ "price_per_day": 1.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = request(
        &app,
        "DELETE",
        &format!("/api/agent/vehicles/{}", vehicle),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Missing resource reports NotFound even for a non-owner.
    let response = request(
        &app,
        "DELETE",
        &format!("/api/agent/vehicles/{}", uuid::Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_a_vehicle_returns_created() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let token = login(&app, "agent@example.com").await;

    let response = request(
        &app,
        "POST",
        "/api/agent/vehicles",
        Some(&token),
        Some(serde_json::json!({
            "title": "New Listing",
            "category": "SUV",
            "price_per_day": 75.0,
            "features": ["gps"],
            "image_urls": [],
            "available_from": "2026-09-01T00:00:00Z",
            "available_to": "2026-12-01T00:00:00Z",
            "location": "Hamburg"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["title"], "New Listing");
}

#[tokio::test]
async fn customer_booking_creation_prices_by_day() {
    let (app, db) = spawn_app().await;

    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    insert_user(&db, UserRole::Customer, "customer@example.com").await;
    let vehicle = insert_vehicle(&db, agent, "Budget Car").await;

    let token = login(&app, "customer@example.com").await;
    let response = request(
        &app,
        "POST",
        "/api/customer/bookings",
        Some(&token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "start_date": "2026-09-01T10:00:00Z",
            "end_date": "2026-09-04T10:00:00Z"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "PENDING");
    // 3 days at 50.0/day
    assert_eq!(json["total_price"], 150.0);

    let response = request(
        &app,
        "POST",
        "/api/customer/bookings",
        Some(&token),
        Some(serde_json::json!({
            "vehicle_id": vehicle,
            "start_date": "2026-09-04T10:00:00Z",
            "end_date": "2026-09-01T10:00:00Z"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_stats_reflect_store_state() {
    let (app, db) = spawn_app().await;

    insert_user(&db, UserRole::Admin, "admin@example.com").await;
    let agent = insert_user(&db, UserRole::Agent, "agent@example.com").await;
    let c1 = insert_user(&db, UserRole::Customer, "c1@example.com").await;
    let c2 = insert_user(&db, UserRole::Customer, "c2@example.com").await;

    let popular = insert_vehicle(&db, agent, "Popular").await;
    let quiet = insert_vehicle(&db, agent, "Quiet").await;

    insert_booking(&db, c1, popular, BookingStatus::Completed, Some(100.0)).await;
    insert_booking(&db, c2, popular, BookingStatus::Completed, Some(150.0)).await;
    insert_booking(&db, c1, quiet, BookingStatus::Pending, Some(40.0)).await;

    let token = login(&app, "admin@example.com").await;
    let response = request(&app, "GET", "/api/admin/stats", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["users"]["total"], 4);
    assert_eq!(json["users"]["agents"], 1);
    assert_eq!(json["users"]["customers"], 2);
    assert_eq!(json["vehicles"], 2);
    assert_eq!(json["bookings"]["total"], 3);
    assert_eq!(json["bookings"]["by_status"]["COMPLETED"], 2);
    assert_eq!(json["bookings"]["by_status"]["PENDING"], 1);
    // Revenue counts only COMPLETED bookings.
    assert_eq!(json["revenue"], 250.0);
    assert_eq!(json["top_vehicles"][0]["title"], "Popular");
    assert_eq!(json["top_vehicles"][0]["bookings"], 2);
}
