use std::fmt;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    /// Local ten-digit telephone numbers starting with `0`, e.g. `0812345678`.
    pub static ref TELEPHONE_REGEX: Regex = Regex::new(r"^0[0-9]{9}$").unwrap();
}

/// Role attached to every user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    #[default]
    User,
    /// Administrator with access to every resource
    Admin,
}

impl Role {
    /// Returns the name stored in the database and in tokens
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Parses a stored role name
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request structure for user registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Name of the user
    #[validate(length(min = 1, max = 255, message = "Please add a name"))]
    pub name: String,

    /// Telephone number of the user
    #[validate(regex(path = *TELEPHONE_REGEX, message = "Please add a valid telephone number"))]
    pub telephone: String,

    /// Email address of the user
    #[validate(email(message = "Please add a valid email"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Requested role, defaults to `user`.
    ///
    /// Taken as sent, so a client can register itself as `admin`; there is no
    /// separate admin provisioning path.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Request structure for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address of the user
    #[serde(default)]
    pub email: String,

    /// Password for the user account
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Whether both credentials were supplied
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// Response returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Always true for this response
    pub success: bool,
    /// Unique identifier for the user
    pub id: Uuid,
    /// Name of the user
    pub name: String,
    /// Telephone number of the user
    pub telephone: String,
    /// Email address of the user
    pub email: String,
    /// Signed access token
    pub token: String,
}

/// Public view of a user, without the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Name of the user
    pub name: String,
    /// Telephone number of the user
    pub telephone: String,
    /// Email address of the user
    pub email: String,
    /// Role of the user
    pub role: Role,
    /// Time at which the user was created
    pub created_at: DateTime<Utc>,
}

/// User model representing the database schema
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Name of the user
    pub name: String,
    /// Telephone number of the user
    pub telephone: String,
    /// Email address of the user, stored lowercase
    pub email: String,
    /// Hashed password of the user
    pub password_hash: String,
    /// Role of the user
    pub role: Role,
    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            telephone: user.telephone,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID
    pub sub: String,
    /// Role of the user at the time the token was issued
    pub role: Role,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Issued at timestamp of the token
    pub iat: usize,
}

/// Identity carried by a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// ID of the authenticated user
    pub user_id: Uuid,
    /// Role of the authenticated user
    pub role: Role,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email address already exists in the system
    #[error("Email already exists")]
    EmailExists,

    /// Login was attempted without an email or password
    #[error("Please provide an email and password")]
    MissingCredentials,

    /// The provided credentials are invalid
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No token was sent with a request to a protected route
    #[error("Not authorized to access this route")]
    MissingToken,

    /// The token could not be verified
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The authenticated user's role may not use the route
    #[error("User role {0} is not authorized to access this route")]
    Forbidden(Role),

    /// The user was not found in the system
    #[error("User not found")]
    UserNotFound,

    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while signing or decoding a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AuthError {
    /// Machine-readable error code used in response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "email_exists",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::UserNotFound => "user_not_found",
            AuthError::Validation(_) => "validation_error",
            AuthError::Database(_) | AuthError::PasswordHash(_) | AuthError::Jwt(_) => {
                "internal_error"
            }
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::Validation(errors.to_string())
    }
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::EmailExists | AuthError::MissingCredentials | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::PasswordHash(_) | AuthError::Jwt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let message = match self {
            AuthError::Database(_) | AuthError::PasswordHash(_) | AuthError::Jwt(_) => {
                log::error!("Auth request failed: {}", self);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.code(),
            "message": message
        }))
    }
}
