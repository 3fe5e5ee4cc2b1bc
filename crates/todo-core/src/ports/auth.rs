//! Authentication and authorization ports.

use uuid::Uuid;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
    pub exp: i64,
}

/// Token service trait for bearer-token operations.
pub trait TokenService: Send + Sync {
    /// Issue a signed token for a user.
    fn generate_token(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Verify signature, issuer and expiry, then decode the claims.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}
