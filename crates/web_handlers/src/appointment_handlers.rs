//! Handlers for appointments, also served under `/bookings`.
//!
//! Every handler takes a [`ReservationKind`] so that messages use the wording of the
//! route the client called.

use actix_web::{HttpResponse, Result, web};
use auth_services::middleware::AuthenticatedUser;
use auth_services::types::Role;
use sqlx::PgPool;
use uuid::Uuid;

use crate::appointment_service::AppointmentService;
use crate::appointment_types::*;

/// Lists the caller's appointments, or every appointment for an admin
pub async fn get_appointments(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppointmentError> {
    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let owner = (!user.is_admin()).then_some(&user.id);
    let appointments = appointment_service.list_appointments(owner, None).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": appointments.len(),
        "data": appointments
    })))
}

/// Lists the appointments at one campground: all of them for an admin,
/// the caller's own otherwise
pub async fn get_campground_appointments(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppointmentError> {
    let campground_id = path.into_inner();
    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let owner = (!user.is_admin()).then_some(&user.id);
    let appointments = appointment_service
        .list_appointments(owner, Some(&campground_id))
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": appointments.len(),
        "data": appointments
    })))
}

/// Gets a single appointment owned by the caller
pub async fn get_appointment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    kind: ReservationKind,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppointmentError> {
    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let appointment = appointment_service.get_appointment(&path, kind).await?;

    if !user.can_access(&appointment.user) {
        return Err(AppointmentError::NotOwner {
            kind,
            user_id: user.id,
            action: "view",
        });
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": appointment
    })))
}

/// Books a campground for the caller, enforcing the per-user limit and the
/// campground's daily capacity
pub async fn add_appointment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    kind: ReservationKind,
    path: web::Path<Uuid>,
    request: web::Json<CreateAppointmentRequest>,
) -> Result<HttpResponse, AppointmentError> {
    user.authorize(&[Role::User, Role::Admin])?;
    let campground_id = path.into_inner();

    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let (campground_name, daily_capacity) = appointment_service
        .campground_capacity(&campground_id)
        .await?;

    let existing = appointment_service.count_for_user(&user.id).await?;
    check_booking_limit(&user, existing, kind)?;

    let day = request.appt_date.date_naive();
    let booked = appointment_service
        .count_on_day(&campground_id, day, None)
        .await?;
    check_capacity(&campground_name, day, booked, daily_capacity)?;

    let appointment = appointment_service
        .create_appointment(&user.id, &campground_id, request.appt_date)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": appointment
    })))
}

/// Moves an appointment to another date. Owner or admin only.
pub async fn update_appointment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    kind: ReservationKind,
    path: web::Path<Uuid>,
    request: web::Json<UpdateAppointmentRequest>,
) -> Result<HttpResponse, AppointmentError> {
    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let appointment = appointment_service.find_appointment(&path, kind).await?;

    if !user.can_access(&appointment.user_id) {
        return Err(AppointmentError::NotOwner {
            kind,
            user_id: user.id,
            action: "update",
        });
    }

    let Some(appt_date) = request.appt_date else {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": appointment
        })));
    };

    let (campground_name, daily_capacity) = appointment_service
        .campground_capacity(&appointment.campground_id)
        .await?;
    let day = appt_date.date_naive();
    let booked = appointment_service
        .count_on_day(&appointment.campground_id, day, Some(&appointment.id))
        .await?;
    check_capacity(&campground_name, day, booked, daily_capacity)?;

    let updated = appointment_service
        .update_appointment(&appointment.id, appt_date, kind)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": updated
    })))
}

/// Deletes an appointment. Owner or admin only.
pub async fn delete_appointment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    kind: ReservationKind,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppointmentError> {
    let appointment_service = AppointmentService::new(pool.get_ref().clone());
    let appointment = appointment_service.find_appointment(&path, kind).await?;

    if !user.can_access(&appointment.user_id) {
        return Err(AppointmentError::NotOwner {
            kind,
            user_id: user.id,
            action: "delete",
        });
    }

    appointment_service
        .delete_appointment(&appointment.id, kind)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {}
    })))
}
