//! Authentication handlers.

use actix_web::{HttpResponse, web};

use todo_core::domain::{RegistrationFields, User, normalize_email};
use todo_core::error::RepoError;
use todo_core::ports::BaseRepository;
use todo_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const ALREADY_EXISTS: &str = "Username or email already exists.";
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id)
        .map_err(|e| AppError::internal("Internal server error while issuing token.", e))?;

    Ok(AuthResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        token,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let registration = RegistrationFields {
        username: req.username,
        email: req.email,
        password: req.password,
    }
    .validate()?;

    // Best-effort pre-check; the unique indexes decide races.
    let existing = state
        .users
        .find_by_username_or_email(&registration.username, &registration.email)
        .await
        .map_err(|e| AppError::internal("Internal server error during registration.", e))?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_EXISTS.to_string()));
    }

    let password_hash = state
        .passwords
        .hash(&registration.password)
        .map_err(|e| AppError::internal("Internal server error during registration.", e))?;

    let user = state
        .users
        .insert(User::new(registration, password_hash))
        .await
        .map_err(|e| match e {
            RepoError::Constraint(_) => AppError::Conflict(ALREADY_EXISTS.to_string()),
            other => AppError::internal("Internal server error during registration.", other),
        })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(auth_response(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| AppError::internal("Internal server error during login.", e))?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::internal("Internal server error during login.", e))?;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(HttpResponse::Ok().json(auth_response(&state, &user)?))
}

/// GET /api/auth/me
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id.to_string(),
        username: identity.username,
        email: identity.email,
        created_at: identity.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::test::{self, TestRequest};
    use serde_json::{Value, json};
    use todo_infra::auth::JwtConfig;

    fn state() -> AppState {
        AppState::in_memory(JwtConfig::default(), false)
    }

    macro_rules! send {
        ($app:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $req.to_request()).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn alice() -> Value {
        json!({ "username": "alice", "email": "Alice@Example.com", "password": "secret1" })
    }

    #[actix_web::test]
    async fn test_register_returns_identity_and_token() {
        let state = state();
        let app = test_app!(state);

        let (status, body) = send!(
            app,
            TestRequest::post().uri("/api/auth/register").set_json(alice())
        );

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body.get("password").is_none());

        let token = body["token"].as_str().unwrap();
        let claims = state.tokens.validate_token(token).unwrap();
        assert_eq!(claims.user_id.to_string(), body["_id"].as_str().unwrap());

        let stored = state
            .users
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "secret1");
    }

    #[actix_web::test]
    async fn test_duplicate_registration_is_rejected() {
        let state = state();
        let app = test_app!(state);

        let (status, _) = send!(
            app,
            TestRequest::post().uri("/api/auth/register").set_json(alice())
        );
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send!(
            app,
            TestRequest::post().uri("/api/auth/register").set_json(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "another1",
            }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], ALREADY_EXISTS);

        let found = state
            .users
            .find_by_username_or_email("alice2", "nobody@example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[actix_web::test]
    async fn test_register_validation_errors() {
        let state = state();
        let app = test_app!(state);

        let (status, body) = send!(
            app,
            TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({ "username": "al", "email": "nope", "password": "123" }))
        );

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert!(body["errors"]["username"].is_string());
        assert!(body["errors"]["email"].is_string());
        assert!(body["errors"]["password"].is_string());
    }

    #[actix_web::test]
    async fn test_login_flow() {
        let state = state();
        let app = test_app!(state);

        send!(
            app,
            TestRequest::post().uri("/api/auth/register").set_json(alice())
        );

        let (status, body) = send!(
            app,
            TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": " ALICE@example.com ", "password": "secret1" }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert!(body["token"].is_string());

        let (status, wrong_password) = send!(
            app,
            TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "alice@example.com", "password": "wrong-one" }))
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, unknown_email) = send!(
            app,
            TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "bob@example.com", "password": "secret1" }))
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(unknown_email["message"], INVALID_CREDENTIALS);
    }

    #[actix_web::test]
    async fn test_me_requires_token() {
        let state = state();
        let app = test_app!(state);

        let (_, registered) = send!(
            app,
            TestRequest::post().uri("/api/auth/register").set_json(alice())
        );
        let token = registered["token"].as_str().unwrap();

        let (status, body) = send!(
            app,
            TestRequest::get()
                .uri("/api/auth/me")
                .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], registered["_id"]);
        assert_eq!(body["username"], "alice");
        assert!(body["createdAt"].is_string());

        let (status, _) = send!(app, TestRequest::get().uri("/api/auth/me"));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
