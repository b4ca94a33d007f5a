use std::collections::HashMap;

use actix_web::{HttpResponse, Result, web};
use auth_services::middleware::AuthenticatedUser;
use auth_services::types::Role;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::availability::{AvailabilityQuery, AvailabilityResponse, CalendarRange, build_calendar};
use crate::campground_query::CampgroundListQuery;
use crate::campground_service::CampgroundService;
use crate::campground_types::*;

/// Lists campgrounds with filtering, projection, sorting and pagination.
/// Each campground carries its appointments.
pub async fn get_campgrounds(
    pool: web::Data<PgPool>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, CampgroundError> {
    let query = CampgroundListQuery::parse(&params)?;
    let campground_service = CampgroundService::new(pool.get_ref().clone());

    let (campgrounds, total) = campground_service.list_campgrounds(&query).await?;
    let ids: Vec<Uuid> = campgrounds.iter().map(|c| c.id).collect();
    let mut appointments = campground_service.appointments_for(&ids).await?;

    let data = campgrounds
        .into_iter()
        .map(|campground| {
            let listing = CampgroundListing {
                appointments: appointments.remove(&campground.id).unwrap_or_default(),
                campground,
            };
            serde_json::to_value(listing).map(|value| query.project(value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": data.len(),
        "pagination": query.pagination(total),
        "data": data
    })))
}

/// Gets a single campground
pub async fn get_campground(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CampgroundError> {
    let campground_service = CampgroundService::new(pool.get_ref().clone());
    let campground = campground_service.get_campground(&path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": campground
    })))
}

/// Creates a campground. Admin only.
pub async fn create_campground(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    request: web::Json<CreateCampgroundRequest>,
) -> Result<HttpResponse, CampgroundError> {
    user.authorize(&[Role::Admin])?;
    request.validate()?;

    let campground_service = CampgroundService::new(pool.get_ref().clone());
    let campground = campground_service.create_campground(&request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": campground
    })))
}

/// Updates the given fields of a campground. Admin only.
pub async fn update_campground(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    request: web::Json<UpdateCampgroundRequest>,
) -> Result<HttpResponse, CampgroundError> {
    user.authorize(&[Role::Admin])?;
    request.validate()?;

    let campground_service = CampgroundService::new(pool.get_ref().clone());
    let campground = campground_service
        .update_campground(&path, &request)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": campground
    })))
}

/// Deletes a campground and its appointments. Admin only.
pub async fn delete_campground(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CampgroundError> {
    user.authorize(&[Role::Admin])?;

    let campground_service = CampgroundService::new(pool.get_ref().clone());
    campground_service.delete_campground(&path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {}
    })))
}

/// Per-day availability of a campground for the next 30 days or a given month
pub async fn get_availability(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, CampgroundError> {
    let range = CalendarRange::resolve(&query, Utc::now().date_naive())?;

    let campground_service = CampgroundService::new(pool.get_ref().clone());
    let campground = campground_service.get_campground(&path).await?;
    let booked = campground_service.booked_days(&campground.id, &range).await?;

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        success: true,
        availability: build_calendar(&range, booked, campground.daily_capacity),
        campground: campground.name,
    }))
}
