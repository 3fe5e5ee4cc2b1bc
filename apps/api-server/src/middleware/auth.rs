//! Access-control gate and the identity it attaches to requests.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderMap},
};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use todo_core::domain::User;
use todo_core::ports::{BaseRepository, TokenService, UserRepository};

use crate::middleware::error::AppError;
use crate::state::AppState;

const NO_TOKEN: &str = "Not authorized, no token.";
const TOKEN_FAILED: &str = "Not authorized, token failed.";
const USER_NOT_FOUND: &str = "Not authorized, user not found.";

/// The authenticated user, without the password hash.
///
/// Only available behind [`RequireAuth`]:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string())),
        )
    }
}

/// Middleware that rejects requests without a valid bearer token for an
/// existing user, and attaches the [`Identity`] otherwise.
pub struct RequireAuth {
    tokens: Arc<dyn TokenService>,
    users: Arc<dyn UserRepository>,
}

impl RequireAuth {
    pub fn new(state: &AppState) -> Self {
        Self {
            tokens: state.tokens.clone(),
            users: state.users.clone(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            users: self.users.clone(),
        }))
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
    tokens: Arc<dyn TokenService>,
    users: Arc<dyn UserRepository>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = self.tokens.clone();
        let users = self.users.clone();
        let token = bearer_token(req.headers());

        Box::pin(async move {
            let identity = match token {
                Ok(token) => authenticate(&token, tokens.as_ref(), users.as_ref()).await,
                Err(err) => Err(err),
            };

            match identity {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(TOKEN_FAILED.to_string()))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(AppError::Unauthorized(TOKEN_FAILED.to_string())),
        None => Err(AppError::Unauthorized(NO_TOKEN.to_string())),
    }
}

async fn authenticate(
    token: &str,
    tokens: &dyn TokenService,
    users: &dyn UserRepository,
) -> Result<Identity, AppError> {
    let claims = tokens.validate_token(token).map_err(|e| {
        tracing::debug!(reason = %e, "Bearer token rejected");
        AppError::Unauthorized(TOKEN_FAILED.to_string())
    })?;

    match users.find_by_id(claims.user_id).await {
        Ok(Some(user)) => Ok(Identity::from(user)),
        Ok(None) => {
            tracing::debug!(user_id = %claims.user_id, "Token refers to a missing user");
            Err(AppError::Unauthorized(USER_NOT_FOUND.to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, "User lookup failed during token validation");
            Err(AppError::Unauthorized(TOKEN_FAILED.to_string()))
        }
    }
}
