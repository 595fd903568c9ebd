use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl BookingResponse {
    pub fn from_model(b: booking::Model) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            vehicle_id: b.vehicle_id,
            start_date: b.start_date.with_timezone(&Utc),
            end_date: b.end_date.with_timezone(&Utc),
            status: b.status,
            total_price: b.total_price,
            created_at: b.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Bookings on vehicles created by the logged-in agent, newest first
pub async fn bookings_for_my_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let vehicle_ids: Vec<Uuid> = vehicle::Entity::find()
        .filter(vehicle::Column::CreatedBy.eq(claims.sub))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let bookings = booking::Entity::find()
        .filter(booking::Column::VehicleId.is_in(vehicle_ids))
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        bookings.into_iter().map(BookingResponse::from_model).collect(),
    ))
}

/// Set a booking's status as the agent owning its vehicle.
///
/// The write itself is unconditional: any status may be set from any other.
/// What is enforced is existence (before ownership) and that the acting
/// agent created the booked vehicle.
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<BookingResponse>> {
    let booking = booking::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.created_by != claims.sub {
        return Err(AppError::Forbidden("You do not own this vehicle".to_string()));
    }

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(payload.status);

    let updated = active.update(&state.db).await?;
    Ok(Json(BookingResponse::from_model(updated)))
}
