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
use crate::entities::{review, user, vehicle};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub vehicle_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub author: Option<ReviewAuthorInfo>,
}

#[derive(Debug, Serialize)]
pub struct ReviewAuthorInfo {
    pub full_name: String,
    pub profile_image: Option<String>,
}

fn review_response(r: review::Model, author: Option<&user::Model>) -> ReviewResponse {
    ReviewResponse {
        id: r.id,
        rating: r.rating,
        comment: r.comment,
        vehicle_id: r.vehicle_id,
        user_id: r.user_id,
        created_at: r.created_at.with_timezone(&Utc),
        author: author.map(|u| ReviewAuthorInfo {
            full_name: u.full_name.clone(),
            profile_image: u.profile_image.clone(),
        }),
    }
}

fn validate_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

/// Create a review. Gated on a COMPLETED booking existing for the same
/// customer/vehicle pair; nothing prevents a second review for the pair.
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewResponse>)> {
    validate_rating(payload.rating)?;

    let completed = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .filter(booking::Column::VehicleId.eq(payload.vehicle_id))
        .filter(booking::Column::Status.eq(BookingStatus::Completed))
        .one(&state.db)
        .await?;

    if completed.is_none() {
        return Err(AppError::Forbidden(
            "You can only review a vehicle after completing a booking".to_string(),
        ));
    }

    let new_review = review::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(claims.sub),
        vehicle_id: Set(payload.vehicle_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now().into()),
    };
    let created = new_review.insert(&state.db).await?;

    let author = user::Entity::find_by_id(claims.sub).one(&state.db).await?;
    Ok((
        StatusCode::CREATED,
        Json(review_response(created, author.as_ref())),
    ))
}

/// Update the author's own review
pub async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    let review = review::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    if review.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only update your own review".to_string(),
        ));
    }

    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let mut active: review::ActiveModel = review.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment);
    }

    let updated = active.update(&state.db).await?;
    let author = user::Entity::find_by_id(claims.sub).one(&state.db).await?;
    Ok(Json(review_response(updated, author.as_ref())))
}

/// Delete the author's own review
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let review = review::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    if review.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only delete your own review".to_string(),
        ));
    }

    review::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Review deleted successfully" })))
}

/// The customer's own reviews, newest first
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    let reviews = review::Entity::find()
        .filter(review::Column::UserId.eq(claims.sub))
        .order_by_desc(review::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let author = user::Entity::find_by_id(claims.sub).one(&state.db).await?;

    Ok(Json(
        reviews
            .into_iter()
            .map(|r| review_response(r, author.as_ref()))
            .collect(),
    ))
}

/// Public list of a vehicle's reviews with author names, newest first
pub async fn vehicle_reviews(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    vehicle::Entity::find_by_id(vehicle_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let reviews = review::Entity::find()
        .filter(review::Column::VehicleId.eq(vehicle_id))
        .order_by_desc(review::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    Ok(Json(
        reviews
            .into_iter()
            .map(|r| {
                let author = users.iter().find(|u| u.id == r.user_id);
                review_response(r, author)
            })
            .collect(),
    ))
}
