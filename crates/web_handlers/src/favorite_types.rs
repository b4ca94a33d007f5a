use actix_web::ResponseError;
use actix_web::http::StatusCode;
use auth_services::types::AuthError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::campground_types::CampgroundSummary;
use crate::errors::{error_response, internal_error};

/// A bookmarked campground as stored
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Unique identifier for the favorite
    pub id: Uuid,
    /// ID of the user who saved it
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// ID of the saved campground
    #[serde(rename = "campground")]
    pub campground_id: Uuid,
    /// When it was saved
    pub created_at: DateTime<Utc>,
}

/// A favorite with its campground populated
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWithCampground {
    /// Unique identifier for the favorite
    pub id: Uuid,
    /// ID of the user who saved it
    pub user: Uuid,
    /// The saved campground
    pub campground: CampgroundSummary,
    /// When it was saved
    pub created_at: DateTime<Utc>,
}

/// Custom error type for favorite operations
#[derive(thiserror::Error, Debug)]
pub enum FavoriteError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The pair already exists
    #[error("Already favorited")]
    AlreadyFavorited,

    /// Referenced campground not found
    #[error("No campground with the id of {0}")]
    CampgroundNotFound(Uuid),

    /// Authentication failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl FavoriteError {
    /// Error for an insert whose reference named by `field` no longer exists
    pub fn missing_reference(field: &str, campground_id: Uuid) -> Self {
        match field {
            "user_id" => FavoriteError::Auth(AuthError::UserNotFound),
            _ => FavoriteError::CampgroundNotFound(campground_id),
        }
    }
}

impl ResponseError for FavoriteError {
    fn status_code(&self) -> StatusCode {
        match self {
            FavoriteError::AlreadyFavorited => StatusCode::BAD_REQUEST,
            FavoriteError::CampgroundNotFound(_) => StatusCode::NOT_FOUND,
            FavoriteError::Auth(err) => err.status_code(),
            FavoriteError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            FavoriteError::AlreadyFavorited => {
                error_response(status, "already_favorited", &message)
            }
            FavoriteError::CampgroundNotFound(_) => {
                error_response(status, "campground_not_found", &message)
            }
            FavoriteError::Auth(err) => err.error_response(),
            FavoriteError::Database(err) => internal_error("Favorite request failed", err),
        }
    }
}
