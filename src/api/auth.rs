use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::multipart::MultipartForm;
use crate::api::validation::{require_text, validate_payload, validate_upload_name, IMAGE_EXTENSIONS};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{
    CredentialsRequest, FaceImageData, FaceUploadResponse, LoginResponse, LookupRequest,
    LookupResponse, MeResponse,
};
use crate::schemas::MessageResponse;

/// Max attempts per window for lookup/signup/login, per enrollment number.
const AUTH_RATE_LIMIT: u64 = 10;
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

const ALREADY_REGISTERED: &str = "Account already registered. Please Login.";
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/lookup", post(lookup))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/upload-face", post(upload_face))
        .route("/me", get(me))
}

async fn lookup(
    State(state): State<AppState>,
    Json(payload): Json<LookupRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    validate_payload(&payload)?;
    let enrollment = payload.enrollment_number.trim();
    enforce_rate_limit(&state, "lookup", enrollment).await?;

    let user = fetch_user(&state, enrollment)
        .await?
        .ok_or_else(|| ApiError::NotFound("Enrollment number not found. Contact Admin.".to_string()))?;

    if user.is_activated() {
        return Err(ApiError::BadRequest(ALREADY_REGISTERED.to_string()));
    }

    Ok(Json(LookupResponse {
        message: "User found".to_string(),
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_payload(&payload)?;
    let enrollment = payload.enrollment_number.trim();
    enforce_rate_limit(&state, "signup", enrollment).await?;

    let user = fetch_user(&state, enrollment)
        .await?
        .ok_or_else(|| ApiError::NotFound("Enrollment number not found. Contact Admin.".to_string()))?;
    if user.is_activated() {
        return Err(ApiError::BadRequest(ALREADY_REGISTERED.to_string()));
    }

    let password_hash = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    // The update is conditional on a null hash, so a concurrent signup loses here.
    let activated =
        repositories::users::activate(state.db(), enrollment, &password_hash, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to activate account"))?;
    if activated.is_none() {
        return Err(ApiError::BadRequest(ALREADY_REGISTERED.to_string()));
    }

    tracing::info!(user_id = %user.id, "account activated");
    Ok(Json(MessageResponse::new("Registration successful! You can now login.")))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_payload(&payload)?;
    let enrollment = payload.enrollment_number.trim();
    enforce_rate_limit(&state, "login", enrollment).await?;

    let user = fetch_user(&state, enrollment)
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(ApiError::BadRequest("Account not activated. Please Register first.".to_string()));
    };

    let verified = security::verify_password(&payload.password, password_hash)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let token = security::create_access_token(&user.id, user.role, &user.name, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(LoginResponse { token, role: user.role, name: user.name }))
}

async fn upload_face(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FaceUploadResponse>, ApiError> {
    let mut form =
        MultipartForm::read(multipart, state.settings().uploads().max_upload_bytes()).await?;

    let image = form
        .take_file("face_image")
        .ok_or_else(|| ApiError::BadRequest("No image captured.".to_string()))?;
    let enrollment = require_text(form.take_text("enrollment_number"), "enrollment_number")?;
    let extension = validate_upload_name(&image.filename, IMAGE_EXTENSIONS)?;

    let user = fetch_user(&state, &enrollment)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if user.password_hash.is_some() {
        return Err(ApiError::BadRequest(ALREADY_REGISTERED.to_string()));
    }

    let stored = state
        .uploads()
        .save("face_image", &extension, &image.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store face image"))?;

    let updated =
        repositories::users::set_face_image(state.db(), &enrollment, &stored.url, primitive_now_utc())
            .await;
    let user = match updated {
        Ok(Some(user)) => user,
        Ok(None) => {
            state.uploads().discard(&stored).await;
            return Err(ApiError::BadRequest(ALREADY_REGISTERED.to_string()));
        }
        Err(err) => {
            state.uploads().discard(&stored).await;
            return Err(ApiError::internal(err, "Failed to save face image"));
        }
    };

    Ok(Json(FaceUploadResponse {
        message: "Face registered successfully!".to_string(),
        data: FaceImageData { name: user.name, face_image_url: stored.url },
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { id: user.id, role: user.role, name: user.name })
}

async fn fetch_user(state: &AppState, enrollment_number: &str) -> Result<Option<User>, ApiError> {
    repositories::users::find_by_enrollment(state.db(), enrollment_number)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))
}

async fn enforce_rate_limit(state: &AppState, action: &str, enrollment: &str) -> Result<(), ApiError> {
    let rate_key = format!("rl:{action}:{enrollment}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests("Too many attempts, try again later"))
    }
}
