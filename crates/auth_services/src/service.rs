use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::{AuthError, RegisterRequest, Role, User};

const USER_COLUMNS: &str = "id, name, telephone, email, password_hash, role, created_at";

/// A service for handling user authentication operations such as creating users,
/// retrieving user information and verifying credentials.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database with the provided registration request.
    pub async fn create_user(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();

        // Check if email already exists
        let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        if existing_user.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = hash(&request.password, DEFAULT_COST)?;
        let role = request.role.unwrap_or_default();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (name, telephone, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.name.trim())
        .bind(&request.telephone)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match postgres::database::unique_violation(&e) {
            // Lost a race with a concurrent registration for the same email
            Some(_) => AuthError::EmailExists,
            None => AuthError::Database(e),
        })?;

        let user = user_from_row(&row)?;
        log::info!("Registered user {} with role {}", user.id, user.role);

        Ok(user)
    }

    /// Retrieves a user by their email address, returning `None` if not found.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Retrieves a user by their ID, returning `None` if not found.
    pub async fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Verifies the user's password against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = verify(password, &user.password_hash)?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn user_from_row(row: &PgRow) -> Result<User, AuthError> {
    let role: String = row.try_get("role")?;
    let role = Role::parse(&role).ok_or_else(|| {
        AuthError::Database(sqlx::Error::Decode(
            format!("unknown role '{}'", role).into(),
        ))
    })?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        telephone: row.try_get("telephone")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        created_at: row.try_get("created_at")?,
    })
}
