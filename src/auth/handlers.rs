use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, LoginUser, PublicUser, RegisterRequest, RegisterResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{is_unique_violation, User},
        validation::validate_registration,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let reg = validate_registration(payload)?;

    if User::username_or_email_taken(&state.db, &reg.username, &reg.email).await? {
        warn!(email = %reg.email, "username or email already registered");
        return Err(ApiError::Conflict);
    }

    let hash = hash_password(&reg.password)?;

    let user = User::create(&state.db, &reg.username, &reg.email, &hash, reg.role.as_str())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                // Lost a registration race to a concurrent insert.
                ApiError::Conflict
            } else {
                ApiError::Store(e)
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user: PublicUser {
                id: user.id,
                username: user.username,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            ApiError::UserNotFound
        })?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        user: LoginUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        },
        token,
    }))
}
