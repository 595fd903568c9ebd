#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;
use uuid::Uuid;

use car_rental_backend::{
    config::Config,
    entities::booking::{self, BookingStatus},
    entities::user::{self, UserRole},
    entities::vehicle,
    handlers::auth::hash_password,
    routes,
    utils::mailer::Mailer,
    AppState,
};

pub const TEST_PASSWORD: &str = "password123";

pub async fn spawn_app() -> (Router, DatabaseConnection) {
    // A single pooled connection keeps every request on the same in-memory
    // database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
    };

    let state = AppState {
        db: db.clone(),
        config,
        mailer: Mailer,
    };

    (routes::create_router(state), db)
}

pub async fn insert_user(db: &DatabaseConnection, role: UserRole, email: &str) -> Uuid {
    insert_user_with(db, role, email, true, false).await
}

pub async fn insert_user_with(
    db: &DatabaseConnection,
    role: UserRole,
    email: &str,
    verified: bool,
    blocked: bool,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    user::ActiveModel {
        id: Set(id),
        full_name: Set(email.split('@').next().unwrap().to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(TEST_PASSWORD).unwrap()),
        phone_number: Set(None),
        profile_image: Set(None),
        role: Set(role),
        is_email_verified: Set(verified),
        is_blocked: Set(blocked),
        must_change_password: Set(false),
        email_verify_token: Set(None),
        reset_token: Set(None),
        reset_token_expiry: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("failed to insert user");
    id
}

pub async fn insert_vehicle(db: &DatabaseConnection, created_by: Uuid, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    vehicle::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        category: Set("SUV".to_string()),
        price_per_day: Set(50.0),
        features: Set(serde_json::json!(["air conditioning"])),
        image_urls: Set(serde_json::json!([])),
        available_from: Set((now - Duration::days(1)).into()),
        available_to: Set((now + Duration::days(90)).into()),
        location: Set("Berlin".to_string()),
        created_by: Set(created_by),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("failed to insert vehicle");
    id
}

pub async fn insert_booking(
    db: &DatabaseConnection,
    user_id: Uuid,
    vehicle_id: Uuid,
    status: BookingStatus,
    total_price: Option<f64>,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    booking::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        vehicle_id: Set(vehicle_id),
        start_date: Set(now.into()),
        end_date: Set((now + Duration::days(3)).into()),
        status: Set(status),
        total_price: Set(total_price),
        created_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("failed to insert booking");
    id
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn login(app: &Router, email: &str) -> String {
    let response = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login failed for {}", email);

    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

pub async fn booking_status(db: &DatabaseConnection, id: Uuid) -> BookingStatus {
    use sea_orm::EntityTrait;
    booking::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .expect("booking missing")
        .status
}
