use std::fmt;
use std::future::{Ready, ready};

use actix_web::ResponseError;
use actix_web::http::StatusCode;
use auth_services::middleware::AuthenticatedUser;
use auth_services::types::AuthError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::campground_types::CampgroundSummary;
use crate::errors::{error_response, internal_error};

/// Number of appointments a non-admin user may hold at once
pub const MAX_APPOINTMENTS_PER_USER: i64 = 3;

/// Name under which a reservation route is exposed.
///
/// `/appointments` and `/bookings` serve the same resource; the kind only changes
/// the wording of responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationKind {
    /// Routes under `/appointments`
    Appointment,
    /// Routes under `/bookings`
    Booking,
}

impl ReservationKind {
    /// Picks the kind from a request path
    pub fn from_path(path: &str) -> Self {
        if path.split('/').any(|segment| segment == "bookings") {
            ReservationKind::Booking
        } else {
            ReservationKind::Appointment
        }
    }

    /// Singular noun used in messages
    pub fn noun(&self) -> &'static str {
        match self {
            ReservationKind::Appointment => "appointment",
            ReservationKind::Booking => "booking",
        }
    }
}

impl fmt::Display for ReservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

impl actix_web::FromRequest for ReservationKind {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(ReservationKind::from_path(req.path())))
    }
}

/// Structure representing an appointment from the database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Unique identifier for the appointment
    pub id: Uuid,
    /// Reserved date and time
    pub appt_date: DateTime<Utc>,
    /// ID of the user who made the appointment
    #[serde(rename = "user")]
    pub user_id: Uuid,
    /// ID of the reserved campground
    #[serde(rename = "campground")]
    pub campground_id: Uuid,
    /// When the appointment was created
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Columns selected for every appointment query
    pub const COLUMNS: &'static str = "id, appt_date, user_id, campground_id, created_at";

    /// Builds an appointment from a row holding [`Appointment::COLUMNS`]
    pub fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            appt_date: row.try_get("appt_date")?,
            user_id: row.try_get("user_id")?,
            campground_id: row.try_get("campground_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Appointment with its campground populated
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWithCampground {
    /// Unique identifier for the appointment
    pub id: Uuid,
    /// Reserved date and time
    pub appt_date: DateTime<Utc>,
    /// ID of the user who made the appointment
    pub user: Uuid,
    /// The reserved campground
    pub campground: CampgroundSummary,
    /// When the appointment was created
    pub created_at: DateTime<Utc>,
}

/// Request structure for creating an appointment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    /// Date and time to reserve
    pub appt_date: DateTime<Utc>,
}

/// Request structure for updating an appointment
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    /// New date and time
    pub appt_date: Option<DateTime<Utc>>,
}

/// Custom error type for appointment operations
#[derive(thiserror::Error, Debug)]
pub enum AppointmentError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Appointment not found
    #[error("No {kind} with the id of {id}")]
    NotFound {
        /// Route wording
        kind: ReservationKind,
        /// Requested ID
        id: Uuid,
    },

    /// Referenced campground not found
    #[error("No campground with the id of {0}")]
    CampgroundNotFound(Uuid),

    /// The user already holds the maximum number of appointments
    #[error("The user with ID {user_id} has already made {max} {kind}s", max = MAX_APPOINTMENTS_PER_USER)]
    LimitReached {
        /// Route wording
        kind: ReservationKind,
        /// The user at the limit
        user_id: Uuid,
    },

    /// The requested day has no capacity left
    #[error("Campground {campground} is fully booked on {date}")]
    DayFull {
        /// Campground name
        campground: String,
        /// The full day
        date: NaiveDate,
    },

    /// Caller is neither the owner nor an admin
    #[error("User {user_id} is not authorized to {action} this {kind}")]
    NotOwner {
        /// Route wording
        kind: ReservationKind,
        /// The caller
        user_id: Uuid,
        /// What was attempted, e.g. `update`
        action: &'static str,
    },

    /// Authentication or role failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppointmentError {
    /// Error for an insert whose reference named by `field` no longer exists
    pub fn missing_reference(field: &str, campground_id: Uuid) -> Self {
        match field {
            "user_id" => AppointmentError::Auth(AuthError::UserNotFound),
            _ => AppointmentError::CampgroundNotFound(campground_id),
        }
    }
}

impl ResponseError for AppointmentError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppointmentError::NotFound { .. } | AppointmentError::CampgroundNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppointmentError::LimitReached { .. } | AppointmentError::DayFull { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppointmentError::NotOwner { .. } => StatusCode::UNAUTHORIZED,
            AppointmentError::Auth(err) => err.status_code(),
            AppointmentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            AppointmentError::NotFound { .. } => error_response(status, "not_found", &message),
            AppointmentError::CampgroundNotFound(_) => {
                error_response(status, "campground_not_found", &message)
            }
            AppointmentError::LimitReached { .. } => {
                error_response(status, "limit_reached", &message)
            }
            AppointmentError::DayFull { .. } => error_response(status, "day_full", &message),
            AppointmentError::NotOwner { .. } => error_response(status, "not_owner", &message),
            AppointmentError::Auth(err) => err.error_response(),
            AppointmentError::Database(err) => internal_error("Appointment request failed", err),
        }
    }
}

/// Rejects a new appointment when a non-admin caller already holds the maximum
pub fn check_booking_limit(
    user: &AuthenticatedUser,
    existing: i64,
    kind: ReservationKind,
) -> Result<(), AppointmentError> {
    if !user.is_admin() && existing >= MAX_APPOINTMENTS_PER_USER {
        return Err(AppointmentError::LimitReached {
            kind,
            user_id: user.id,
        });
    }
    Ok(())
}

/// Rejects an appointment on a day that already reached the campground's capacity
pub fn check_capacity(
    campground: &str,
    date: NaiveDate,
    booked: i64,
    daily_capacity: i32,
) -> Result<(), AppointmentError> {
    if booked >= i64::from(daily_capacity) {
        return Err(AppointmentError::DayFull {
            campground: campground.to_string(),
            date,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_services::types::Role;

    fn caller(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_booking_limit_applies_to_users() {
        let user = caller(Role::User);

        assert!(check_booking_limit(&user, 0, ReservationKind::Appointment).is_ok());
        assert!(check_booking_limit(&user, 2, ReservationKind::Appointment).is_ok());

        let err = check_booking_limit(&user, 3, ReservationKind::Appointment).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            format!("The user with ID {} has already made 3 appointments", user.id)
        );
    }

    #[test]
    fn test_booking_limit_wording_follows_route() {
        let user = caller(Role::User);
        let err = check_booking_limit(&user, 5, ReservationKind::Booking).unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("The user with ID {} has already made 3 bookings", user.id)
        );
    }

    #[test]
    fn test_admins_are_exempt_from_booking_limit() {
        let admin = caller(Role::Admin);
        assert!(check_booking_limit(&admin, 10, ReservationKind::Appointment).is_ok());
    }

    #[test]
    fn test_capacity_check() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        assert!(check_capacity("Pine Ridge", date, 0, 1).is_ok());
        assert!(check_capacity("Pine Ridge", date, 2, 3).is_ok());

        let err = check_capacity("Pine Ridge", date, 3, 3).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Campground Pine Ridge is fully booked on 2025-12-01"
        );
    }

    #[test]
    fn test_reservation_kind_from_path() {
        assert_eq!(
            ReservationKind::from_path("/api/v1/bookings"),
            ReservationKind::Booking
        );
        assert_eq!(
            ReservationKind::from_path("/api/v1/campgrounds/abc/bookings"),
            ReservationKind::Booking
        );
        assert_eq!(
            ReservationKind::from_path("/api/v1/appointments/abc"),
            ReservationKind::Appointment
        );
    }

    #[test]
    fn test_not_owner_is_unauthorized() {
        let user_id = Uuid::new_v4();
        let err = AppointmentError::NotOwner {
            kind: ReservationKind::Appointment,
            user_id,
            action: "delete",
        };

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.to_string(),
            format!("User {} is not authorized to delete this appointment", user_id)
        );
    }

    #[test]
    fn test_missing_reference_names_the_right_record() {
        let campground_id = Uuid::new_v4();

        let err = AppointmentError::missing_reference("user_id", campground_id);
        assert!(matches!(err, AppointmentError::Auth(AuthError::UserNotFound)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppointmentError::missing_reference("campground_id", campground_id);
        assert!(matches!(err, AppointmentError::CampgroundNotFound(id) if id == campground_id));
    }

    #[test]
    fn test_appointment_serializes_references() {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            appt_date: "2025-12-01T10:00:00Z".parse().unwrap(),
            user_id: Uuid::new_v4(),
            campground_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&appointment).unwrap();

        assert_eq!(value["user"], appointment.user_id.to_string());
        assert_eq!(value["campground"], appointment.campground_id.to_string());
        assert_eq!(value["apptDate"], "2025-12-01T10:00:00Z");
    }
}
