use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{ValidationErrors, char_len};

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;

/// User entity - an account that can log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user from a validated registration. The plaintext password is
    /// dropped here; only `password_hash` is kept.
    pub fn new(registration: Registration, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: registration.username,
            email: registration.email,
            password_hash,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// Raw registration input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFields {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration: trimmed username, normalized email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationFields {
    pub fn validate(self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self
            .username
            .map(|u| u.trim().to_string())
            .unwrap_or_default();
        if username.is_empty() {
            errors.add("username", "Username is required.");
        } else if char_len(&username) < USERNAME_MIN_LEN {
            errors.add(
                "username",
                format!("Username must be at least {USERNAME_MIN_LEN} characters."),
            );
        }

        let email = self.email.as_deref().map(normalize_email).unwrap_or_default();
        if email.is_empty() {
            errors.add("email", "Email is required.");
        } else if !is_valid_email(&email) {
            errors.add("email", "Please provide a valid email address.");
        }

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "Password is required.");
        } else if char_len(&password) < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN_LEN} characters."),
            );
        }

        errors.into_result(Registration {
            username,
            email,
            password,
        })
    }
}

/// Emails are stored trimmed and lower-cased; lookups use the same form.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `<local>@<domain>.<tld>` with each part non-empty.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len(),
        None => false,
    }
}
