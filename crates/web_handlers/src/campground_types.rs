use actix_web::ResponseError;
use actix_web::http::StatusCode;
use auth_services::types::{AuthError, TELEPHONE_REGEX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use validator::Validate;

use crate::appointment_types::Appointment;
use crate::errors::{error_response, internal_error};

/// Capacity given to campgrounds created without one
pub const DEFAULT_DAILY_CAPACITY: i32 = 1;

/// Structure representing a campground from the database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campground {
    /// Unique identifier for the campground
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Unique contact number
    pub telephone: String,
    /// Number of appointments the campground accepts per day
    pub daily_capacity: i32,
    /// When the campground was created
    pub created_at: DateTime<Utc>,
}

impl Campground {
    /// Columns selected for every campground query
    pub const COLUMNS: &'static str = "id, name, address, telephone, daily_capacity, created_at";

    /// Builds a campground from a row holding [`Campground::COLUMNS`]
    pub fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            telephone: row.try_get("telephone")?,
            daily_capacity: row.try_get("daily_capacity")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Campground fields embedded in appointment and favorite responses
#[derive(Debug, Clone, Serialize)]
pub struct CampgroundSummary {
    /// Unique identifier for the campground
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact number
    pub telephone: String,
}

/// A campground together with its appointments, as returned by the listing
#[derive(Debug, Serialize)]
pub struct CampgroundListing {
    /// The campground itself
    #[serde(flatten)]
    pub campground: Campground,
    /// Appointments made at the campground
    pub appointments: Vec<Appointment>,
}

/// Request structure for creating a campground
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampgroundRequest {
    /// Display name, trimmed before storage
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    /// Postal address
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: String,

    /// Contact number
    #[validate(regex(path = *TELEPHONE_REGEX, message = "Please add a valid telephone number"))]
    pub telephone: String,

    /// Daily capacity, defaults to one
    #[validate(range(min = 1, message = "Daily capacity must be at least 1"))]
    pub daily_capacity: Option<i32>,
}

/// Request structure for a partial campground update
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampgroundRequest {
    /// New display name
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    /// New postal address
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: Option<String>,

    /// New contact number
    #[validate(regex(path = *TELEPHONE_REGEX, message = "Please add a valid telephone number"))]
    pub telephone: Option<String>,

    /// New daily capacity
    #[validate(range(min = 1, message = "Daily capacity must be at least 1"))]
    pub daily_capacity: Option<i32>,
}

fn validate_name(name: &str) -> Result<(), validator::ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validator::ValidationError::new("name_required")
            .with_message("Please add a name".into()));
    }
    if trimmed.chars().count() > 50 {
        return Err(validator::ValidationError::new("name_too_long")
            .with_message("Name can not be more than 50 characters".into()));
    }
    Ok(())
}

/// Custom error type for campground operations
#[derive(thiserror::Error, Debug)]
pub enum CampgroundError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unsupported listing or calendar parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A unique field already holds this value
    #[error("Duplicate field value entered: {0}")]
    Duplicate(String),

    /// Campground not found
    #[error("No campground with the id of {0}")]
    NotFound(Uuid),

    /// Response body could not be built
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication or role failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<validator::ValidationErrors> for CampgroundError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CampgroundError::Validation(errors.to_string())
    }
}

impl CampgroundError {
    /// Converts a write failure, mapping unique-key violations to [`CampgroundError::Duplicate`]
    pub fn from_write(err: sqlx::Error) -> Self {
        match postgres::database::unique_violation(&err) {
            Some(constraint) => CampgroundError::Duplicate(
                postgres::database::constraint_field(&constraint).to_string(),
            ),
            None => CampgroundError::Database(err),
        }
    }
}

impl ResponseError for CampgroundError {
    fn status_code(&self) -> StatusCode {
        match self {
            CampgroundError::Validation(_)
            | CampgroundError::InvalidQuery(_)
            | CampgroundError::Duplicate(_) => StatusCode::BAD_REQUEST,
            CampgroundError::NotFound(_) => StatusCode::NOT_FOUND,
            CampgroundError::Auth(err) => err.status_code(),
            CampgroundError::Database(_) | CampgroundError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            CampgroundError::Validation(_) => error_response(status, "validation_error", &message),
            CampgroundError::InvalidQuery(_) => error_response(status, "invalid_query", &message),
            CampgroundError::Duplicate(_) => error_response(status, "duplicate_field", &message),
            CampgroundError::NotFound(_) => {
                error_response(status, "campground_not_found", &message)
            }
            CampgroundError::Auth(err) => err.error_response(),
            CampgroundError::Database(err) => internal_error("Campground request failed", err),
            CampgroundError::Serialization(err) => {
                internal_error("Campground response failed", err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateCampgroundRequest {
        CreateCampgroundRequest {
            name: "Sunny Meadows".to_string(),
            address: "123 Forest Lane, Springfield".to_string(),
            telephone: "0123456789".to_string(),
            daily_capacity: None,
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request().validate().is_ok());

        let mut request = create_request();
        request.name = "   ".to_string();
        assert!(request.validate().is_err());

        let mut request = create_request();
        request.name = "x".repeat(51);
        assert!(request.validate().is_err());

        let mut request = create_request();
        request.name = format!("  {}  ", "x".repeat(50));
        assert!(request.validate().is_ok());

        let mut request = create_request();
        request.address = String::new();
        assert!(request.validate().is_err());

        let mut request = create_request();
        request.telephone = "123456789".to_string();
        assert!(request.validate().is_err());

        let mut request = create_request();
        request.daily_capacity = Some(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_telephone_must_use_ascii_digits() {
        let mut request = create_request();
        request.telephone = "0๑๒๓๔๕๖๗๘๙".to_string();
        assert!(request.validate().is_err());

        let request = UpdateCampgroundRequest {
            telephone: Some("0١٢٣٤٥٦٧٨٩".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_reads_camel_case() {
        let request: CreateCampgroundRequest = serde_json::from_value(serde_json::json!({
            "name": "Sunny Meadows",
            "address": "123 Forest Lane",
            "telephone": "0123456789",
            "dailyCapacity": 4
        }))
        .unwrap();

        assert_eq!(request.daily_capacity, Some(4));
    }

    #[test]
    fn test_update_request_only_checks_present_fields() {
        assert!(UpdateCampgroundRequest::default().validate().is_ok());

        let request = UpdateCampgroundRequest {
            telephone: Some("999".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateCampgroundRequest {
            daily_capacity: Some(3),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_campground_serializes_camel_case() {
        let campground = Campground {
            id: Uuid::nil(),
            name: "Pine Ridge".to_string(),
            address: "1 Ridge Road".to_string(),
            telephone: "0123456789".to_string(),
            daily_capacity: 2,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(CampgroundListing {
            campground,
            appointments: Vec::new(),
        })
        .unwrap();

        assert_eq!(value["dailyCapacity"], 2);
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["appointments"], serde_json::json!([]));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            CampgroundError::Duplicate("name".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CampgroundError::NotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CampgroundError::Auth(AuthError::Forbidden(auth_services::types::Role::User))
                .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CampgroundError::from_write(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
