use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{user, vehicle};
use crate::error::{AppError, AppResult};
use crate::handlers::agent::UpdateProfileRequest;
use crate::handlers::auth::UserInfo;
use crate::handlers::booking::BookingResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Get the customer's own profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserInfo::from_model(user)))
}

/// Update the customer's own profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(Some(phone_number));
    }
    if let Some(profile_image) = payload.profile_image {
        active.profile_image = Set(Some(profile_image));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(UserInfo::from_model(updated)))
}

// ============ Bookings ============

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Create a booking in PENDING state. The total price is fixed at creation
/// from whole rental days times the vehicle's daily price.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let vehicle = vehicle::Entity::find_by_id(payload.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if payload.end_date <= payload.start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date".to_string(),
        ));
    }

    let days = (payload.end_date - payload.start_date).num_days().max(1);
    let total_price = days as f64 * vehicle.price_per_day;

    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(claims.sub),
        vehicle_id: Set(vehicle.id),
        start_date: Set(payload.start_date.into()),
        end_date: Set(payload.end_date.into()),
        status: Set(BookingStatus::Pending),
        total_price: Set(Some(total_price)),
        created_at: Set(Utc::now().into()),
    };

    let booking = new_booking.insert(&state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_model(booking)),
    ))
}

#[derive(Debug, Serialize)]
pub struct RentalVehicleInfo {
    pub title: String,
    pub category: String,
    pub location: String,
    pub price_per_day: f64,
    pub image_urls: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct RentalHistoryEntry {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub vehicle: Option<RentalVehicleInfo>,
}

/// The customer's rental history, newest first
pub async fn rental_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<RentalHistoryEntry>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let vehicles = vehicle::Entity::find().all(&state.db).await?;

    let entries: Vec<RentalHistoryEntry> = bookings
        .into_iter()
        .map(|b| {
            let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);
            RentalHistoryEntry {
                id: b.id,
                start_date: b.start_date.with_timezone(&Utc),
                end_date: b.end_date.with_timezone(&Utc),
                status: b.status,
                total_price: b.total_price,
                created_at: b.created_at.with_timezone(&Utc),
                vehicle: vehicle.map(|v| RentalVehicleInfo {
                    title: v.title.clone(),
                    category: v.category.clone(),
                    location: v.location.clone(),
                    price_per_day: v.price_per_day,
                    image_urls: v.image_urls.clone(),
                }),
            }
        })
        .collect();

    Ok(Json(entries))
}
