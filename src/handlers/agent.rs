use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{user, vehicle};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserInfo;
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Vehicle Management ============

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub title: String,
    pub category: String,
    pub price_per_day: f64,
    pub features: Vec<String>,
    pub image_urls: Vec<String>,
    pub available_from: DateTime<Utc>,
    pub available_to: DateTime<Utc>,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub price_per_day: Option<f64>,
    pub features: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

pub fn apply_vehicle_update(active: &mut vehicle::ActiveModel, payload: UpdateVehicleRequest) {
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(price) = payload.price_per_day {
        active.price_per_day = Set(price);
    }
    if let Some(features) = payload.features {
        active.features = Set(serde_json::json!(features));
    }
    if let Some(image_urls) = payload.image_urls {
        active.image_urls = Set(serde_json::json!(image_urls));
    }
    if let Some(from) = payload.available_from {
        active.available_from = Set(from.into());
    }
    if let Some(to) = payload.available_to {
        active.available_to = Set(to.into());
    }
    if let Some(location) = payload.location {
        active.location = Set(location);
    }
    active.updated_at = Set(Utc::now().into());
}

/// List a vehicle (agent)
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<vehicle::Model>)> {
    if payload.available_to <= payload.available_from {
        return Err(AppError::BadRequest(
            "Availability window must end after it starts".to_string(),
        ));
    }

    let now = Utc::now();
    let new_vehicle = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        category: Set(payload.category),
        price_per_day: Set(payload.price_per_day),
        features: Set(serde_json::json!(payload.features)),
        image_urls: Set(serde_json::json!(payload.image_urls)),
        available_from: Set(payload.available_from.into()),
        available_to: Set(payload.available_to.into()),
        location: Set(payload.location),
        created_by: Set(claims.sub),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let result = new_vehicle.insert(&state.db).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// List the agent's own vehicles
pub async fn my_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::CreatedBy.eq(claims.sub))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Update one of the agent's own vehicles
pub async fn update_my_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.created_by != claims.sub {
        return Err(AppError::Forbidden("You do not own this vehicle".to_string()));
    }

    let mut active: vehicle::ActiveModel = vehicle.into();
    apply_vehicle_update(&mut active, payload);

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete one of the agent's own vehicles
pub async fn delete_my_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.created_by != claims.sub {
        return Err(AppError::Forbidden("You do not own this vehicle".to_string()));
    }

    vehicle::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Vehicle deleted" })))
}

// ============ Customers & Income ============

/// Distinct customers who have booked the agent's vehicles
pub async fn my_customers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<UserInfo>>> {
    let vehicle_ids: Vec<Uuid> = vehicle::Entity::find()
        .filter(vehicle::Column::CreatedBy.eq(claims.sub))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let bookings = booking::Entity::find()
        .filter(booking::Column::VehicleId.is_in(vehicle_ids))
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let mut seen = Vec::new();
    let mut customers = Vec::new();
    for b in &bookings {
        if seen.contains(&b.user_id) {
            continue;
        }
        seen.push(b.user_id);
        if let Some(u) = users.iter().find(|u| u.id == b.user_id) {
            customers.push(UserInfo::from_model(u.clone()));
        }
    }

    Ok(Json(customers))
}

#[derive(Debug, Serialize)]
pub struct CompletedPaymentInfo {
    pub booking_id: Uuid,
    pub vehicle_title: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AgentIncomeResponse {
    pub total_income: f64,
    pub completed_payments: Vec<CompletedPaymentInfo>,
}

/// Completed, priced bookings on the agent's vehicles and the summed income
pub async fn my_income(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<AgentIncomeResponse>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::CreatedBy.eq(claims.sub))
        .all(&state.db)
        .await?;
    let vehicle_ids: Vec<Uuid> = vehicles.iter().map(|v| v.id).collect();

    let bookings = booking::Entity::find()
        .filter(booking::Column::VehicleId.is_in(vehicle_ids))
        .filter(booking::Column::Status.eq(BookingStatus::Completed))
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let mut total_income = 0.0;
    let mut completed_payments = Vec::new();
    for b in bookings {
        let Some(price) = b.total_price else { continue };
        total_income += price;

        let customer = users.iter().find(|u| u.id == b.user_id);
        let vehicle = vehicles.iter().find(|v| v.id == b.vehicle_id);
        completed_payments.push(CompletedPaymentInfo {
            booking_id: b.id,
            vehicle_title: vehicle.map(|v| v.title.clone()).unwrap_or_default(),
            customer_name: customer.map(|u| u.full_name.clone()).unwrap_or_default(),
            customer_email: customer.map(|u| u.email.clone()).unwrap_or_default(),
            total_price: price,
            created_at: b.created_at.with_timezone(&Utc),
        });
    }

    Ok(Json(AgentIncomeResponse {
        total_income,
        completed_payments,
    }))
}

// ============ Profile ============

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

/// Get the agent's own profile
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

/// Update the agent's own profile
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
