use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{create_token, Claims};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

impl UserInfo {
    pub fn from_model(user: user::Model) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            phone_number: user.phone_number,
            profile_image: user.profile_image,
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Register a new customer account. The account starts unverified and a
/// verification link is mailed out; a token is only issued on login.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let verify_token = random_token(32);
    let now = Utc::now();

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(payload.full_name.clone()),
        email: Set(payload.email.clone()),
        password_hash: Set(password_hash),
        phone_number: Set(payload.phone_number.clone()),
        profile_image: Set(payload.profile_image.clone()),
        role: Set(UserRole::Customer),
        is_email_verified: Set(false),
        is_blocked: Set(false),
        must_change_password: Set(false),
        email_verify_token: Set(Some(verify_token.clone())),
        reset_token: Set(None),
        reset_token_expiry: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let user = new_user.insert(&state.db).await?;

    state
        .mailer
        .send_verification(&user.email, &user.full_name, &verify_token);

    Ok(Json(AuthResponse {
        access_token: String::new(),
        user: UserInfo::from_model(user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Verify a customer's email address via the mailed token
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find()
        .filter(user::Column::EmailVerifyToken.eq(&query.token))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Invalid or expired verification token".to_string())
        })?;

    let mut active: user::ActiveModel = user.into();
    active.is_email_verified = Set(true);
    active.email_verify_token = Set(None);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "message": "Email verified successfully. You can now log in."
    })))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    if user.role == UserRole::Customer && !user.is_email_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email before logging in".to_string(),
        ));
    }

    if user.is_blocked {
        return Err(AppError::Unauthorized(
            "Your account has been blocked".to_string(),
        ));
    }

    if user.must_change_password {
        return Err(AppError::Unauthorized(
            "You must change your password before accessing the system".to_string(),
        ));
    }

    let token = create_token(
        user.id,
        &user.email,
        user.role.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse {
        access_token: token,
        user: UserInfo::from_model(user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let email = user.email.clone();
    let full_name = user.full_name.clone();

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.must_change_password = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.db).await?;

    state.mailer.send_password_changed(&email, &full_name);

    Ok(Json(serde_json::json!({ "message": "Password changed successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

/// Request a password reset code. Admin accounts are never reset this way.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<RequestResetRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    let user = match user {
        Some(u) if u.role != UserRole::Admin => u,
        _ => return Err(AppError::BadRequest("Invalid or unauthorized user".to_string())),
    };

    let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
    let expiry = Utc::now() + Duration::minutes(10);

    let email = user.email.clone();
    let full_name = user.full_name.clone();

    let mut active: user::ActiveModel = user.into();
    active.reset_token = Set(Some(code.clone()));
    active.reset_token_expiry = Set(Some(expiry.into()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.db).await?;

    state.mailer.send_reset_code(&email, &full_name, &code);

    Ok(Json(serde_json::json!({ "message": "Reset code sent to email" })))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmResetRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Confirm a password reset with the mailed code
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmResetRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&state.db)
        .await?;

    let user = match user {
        Some(u) if u.role != UserRole::Admin => u,
        _ => return Err(AppError::BadRequest("Invalid or unauthorized user".to_string())),
    };

    let (code, expiry) = match (&user.reset_token, &user.reset_token_expiry) {
        (Some(code), Some(expiry)) => (code.clone(), *expiry),
        _ => return Err(AppError::BadRequest("No reset request found".to_string())),
    };

    if code != payload.code || expiry < Utc::now() {
        return Err(AppError::BadRequest("Invalid or expired reset code".to_string()));
    }

    let email = user.email.clone();
    let full_name = user.full_name.clone();

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.reset_token = Set(None);
    active.reset_token_expiry = Set(None);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.db).await?;

    state.mailer.send_password_changed(&email, &full_name);

    Ok(Json(serde_json::json!({ "message": "Password updated successfully" })))
}
