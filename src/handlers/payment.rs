use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentMethod, PaymentStatus};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub booking: Option<PaymentBookingInfo>,
}

#[derive(Debug, Serialize)]
pub struct PaymentBookingInfo {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: f64,
    pub vehicle: Option<PaymentVehicleInfo>,
}

#[derive(Debug, Serialize)]
pub struct PaymentVehicleInfo {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub price_per_day: f64,
}

fn payment_response(
    p: payment::Model,
    booking: Option<&booking::Model>,
    vehicle: Option<&vehicle::Model>,
) -> PaymentResponse {
    PaymentResponse {
        id: p.id,
        booking_id: p.booking_id,
        amount: p.amount,
        method: p.method,
        status: p.status,
        created_at: p.created_at.with_timezone(&Utc),
        booking: booking.map(|b| PaymentBookingInfo {
            id: b.id,
            start_date: b.start_date.with_timezone(&Utc),
            end_date: b.end_date.with_timezone(&Utc),
            total_price: b.total_price.unwrap_or(0.0),
            vehicle: vehicle.map(|v| PaymentVehicleInfo {
                id: v.id,
                title: v.title.clone(),
                location: v.location.clone(),
                price_per_day: v.price_per_day,
            }),
        }),
    }
}

/// Record a payment against one of the customer's bookings and finalize the
/// booking: its status is forced to COMPLETED whatever it was before.
/// Existence is checked before ownership; there is no guard against paying
/// for the same booking twice.
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    let booking = booking::Entity::find_by_id(payload.booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "Unauthorized booking access".to_string(),
        ));
    }

    let new_payment = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        amount: Set(payload.amount),
        method: Set(payload.method),
        status: Set(PaymentStatus::Completed),
        created_at: Set(Utc::now().into()),
    };
    let paid = new_payment.insert(&state.db).await?;

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Completed);
    let finalized = active.update(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(payment_response(paid, Some(&finalized), vehicle.as_ref())),
    ))
}

/// The customer's payments with booking and vehicle summaries
pub async fn my_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .all(&state.db)
        .await?;
    let booking_ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();

    let payments = payment::Entity::find()
        .filter(payment::Column::BookingId.is_in(booking_ids))
        .all(&state.db)
        .await?;

    let vehicles = vehicle::Entity::find().all(&state.db).await?;

    let responses: Vec<PaymentResponse> = payments
        .into_iter()
        .map(|p| {
            let booking = bookings.iter().find(|b| b.id == p.booking_id);
            let vehicle =
                booking.and_then(|b| vehicles.iter().find(|v| v.id == b.vehicle_id));
            payment_response(p, booking, vehicle)
        })
        .collect();

    Ok(Json(responses))
}

/// Invoice for a single payment. Only the customer who made the booking may
/// read it.
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = payment::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;

    let booking = booking::Entity::find_by_id(payment.booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "Unauthorized booking access".to_string(),
        ));
    }

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id)
        .one(&state.db)
        .await?;

    Ok(Json(payment_response(
        payment,
        Some(&booking),
        vehicle.as_ref(),
    )))
}
