use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchVehiclesQuery {
    pub location: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Browse the catalog. Dates narrow to vehicles whose availability window
/// covers the requested range; text filters match case-insensitively.
pub async fn search_vehicles(
    State(state): State<AppState>,
    Query(query): Query<SearchVehiclesQuery>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let from = query.from.unwrap_or_else(Utc::now);
    let to = query.to.unwrap_or_else(Utc::now);

    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::AvailableFrom.lte(from))
        .filter(vehicle::Column::AvailableTo.gte(to))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let location = query.location.map(|s| s.to_lowercase());
    let category = query.category.map(|s| s.to_lowercase());
    let title = query.q.map(|s| s.to_lowercase());

    let results: Vec<vehicle::Model> = vehicles
        .into_iter()
        .filter(|v| {
            location
                .as_ref()
                .is_none_or(|l| v.location.to_lowercase().contains(l))
                && category
                    .as_ref()
                    .is_none_or(|c| v.category.to_lowercase() == *c)
                && title
                    .as_ref()
                    .is_none_or(|t| v.title.to_lowercase().contains(t))
        })
        .collect();

    Ok(Json(results))
}

/// Featured vehicles: listed within the last 7 days, newest first, max 6
pub async fn featured_vehicles(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let cutoff = Utc::now() - Duration::days(7);

    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::CreatedAt.gte(cutoff))
        .order_by_desc(vehicle::Column::CreatedAt)
        .limit(6)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Vehicle details
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(vehicle))
}
