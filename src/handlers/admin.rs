use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chrono::Utc;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::handlers::agent::{apply_vehicle_update, UpdateVehicleRequest};
use crate::handlers::auth::{hash_password, UserInfo};
use crate::handlers::booking::{BookingResponse, UpdateBookingStatusRequest};
use crate::AppState;

// ============ Agent Provisioning ============

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Create an agent account with a mailed temporary password. The agent must
/// change it before they can log in.
pub async fn create_agent(
    State(state): State<AppState>,
    Json(payload): Json<CreateAgentRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest("Email already exists".to_string()));
    }

    let temp_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    let now = Utc::now();
    let agent = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(payload.full_name.clone()),
        email: Set(payload.email.clone()),
        password_hash: Set(hash_password(&temp_password)?),
        phone_number: Set(payload.phone_number.clone()),
        profile_image: Set(None),
        role: Set(UserRole::Agent),
        is_email_verified: Set(true),
        is_blocked: Set(false),
        must_change_password: Set(true),
        email_verify_token: Set(None),
        reset_token: Set(None),
        reset_token_expiry: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let agent = agent.insert(&state.db).await?;

    state
        .mailer
        .send_agent_invite(&agent.email, &agent.full_name, &temp_password);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": format!("Agent {} created and invite sent", agent.full_name)
        })),
    ))
}

// ============ User Management ============

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<user::Model>>> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
}

/// Update a user's details or role (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(email) = &payload.email {
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Id.ne(id))
            .one(&state.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Email already exists".to_string()));
        }
    }

    let mut active: user::ActiveModel = user.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(Some(phone_number));
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(UserInfo::from_model(updated)))
}

#[derive(Debug, Deserialize)]
pub struct SetBlockedRequest {
    pub blocked: bool,
}

/// Block or unblock a user (admin). Admin accounts cannot be blocked.
pub async fn set_user_blocked(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetBlockedRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Err(AppError::BadRequest("Cannot block an admin".to_string()));
    }

    let mut active: user::ActiveModel = user.into();
    active.is_blocked = Set(payload.blocked);
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(UserInfo::from_model(updated)))
}

/// Delete a user account (admin). Bookings, payments and reviews go with
/// the user; vehicles they created stay listed.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = user::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Vehicle Management ============

/// List all vehicles (admin)
pub async fn list_vehicles(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Update any vehicle (admin). No ownership predicate: the route guard is
/// what restricts this to admins.
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let mut active: vehicle::ActiveModel = vehicle.into();
    apply_vehicle_update(&mut active, payload);

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete any vehicle (admin)
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = vehicle::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Vehicle not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Vehicle deleted" })))
}

// ============ Booking Management ============

/// List all bookings (admin), newest first
pub async fn list_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        bookings.into_iter().map(BookingResponse::from_model).collect(),
    ))
}

/// Set any booking's status (admin). The write is unconditional; only
/// existence is checked.
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<BookingResponse>> {
    let booking = booking::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(payload.status);

    let updated = active.update(&state.db).await?;
    Ok(Json(BookingResponse::from_model(updated)))
}

// ============ System Stats ============

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub agents: u64,
    pub customers: u64,
}

#[derive(Debug, Serialize)]
pub struct BookingStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
pub struct TopVehicleEntry {
    pub vehicle_id: Uuid,
    pub title: String,
    pub bookings: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub users: UserStats,
    pub vehicles: u64,
    pub bookings: BookingStats,
    pub revenue: f64,
    pub top_vehicles: Vec<TopVehicleEntry>,
}

/// Platform-wide reporting: user counts by role, booking counts by status,
/// revenue over completed bookings, and the five most-booked vehicles.
/// Ties in the top-5 keep first-seen order (stable sort).
pub async fn system_stats(State(state): State<AppState>) -> AppResult<Json<SystemStatsResponse>> {
    let total_users = user::Entity::find().count(&state.db).await?;
    let total_agents = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Agent))
        .count(&state.db)
        .await?;
    let total_customers = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Customer))
        .count(&state.db)
        .await?;

    let total_vehicles = vehicle::Entity::find().count(&state.db).await?;

    let bookings = booking::Entity::find().all(&state.db).await?;
    let total_bookings = bookings.len() as u64;

    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    let mut revenue = 0.0;
    let mut booked_order: Vec<Uuid> = Vec::new();
    let mut booked_counts: Vec<u64> = Vec::new();

    for b in &bookings {
        let key = match b.status {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        };
        *by_status.entry(key.to_string()).or_insert(0) += 1;

        if b.status == BookingStatus::Completed {
            revenue += b.total_price.unwrap_or(0.0);
        }

        match booked_order.iter().position(|id| *id == b.vehicle_id) {
            Some(idx) => booked_counts[idx] += 1,
            None => {
                booked_order.push(b.vehicle_id);
                booked_counts.push(1);
            }
        }
    }

    let vehicles = vehicle::Entity::find().all(&state.db).await?;

    let mut ranked: Vec<(Uuid, u64)> = booked_order
        .into_iter()
        .zip(booked_counts)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let top_vehicles: Vec<TopVehicleEntry> = ranked
        .into_iter()
        .take(5)
        .map(|(vehicle_id, count)| TopVehicleEntry {
            vehicle_id,
            title: vehicles
                .iter()
                .find(|v| v.id == vehicle_id)
                .map(|v| v.title.clone())
                .unwrap_or_default(),
            bookings: count,
        })
        .collect();

    Ok(Json(SystemStatsResponse {
        users: UserStats {
            total: total_users,
            agents: total_agents,
            customers: total_customers,
        },
        vehicles: total_vehicles,
        bookings: BookingStats {
            total: total_bookings,
            by_status,
        },
        revenue,
        top_vehicles,
    }))
}
