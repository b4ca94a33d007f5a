use actix_web::{HttpResponse, Result, web};
use auth_services::middleware::AuthenticatedUser;
use sqlx::PgPool;
use uuid::Uuid;

use crate::favorite_service::FavoriteService;
use crate::favorite_types::FavoriteError;

/// Adds a campground to the caller's favorites
pub async fn add_favorite(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, FavoriteError> {
    let favorite_service = FavoriteService::new(pool.get_ref().clone());
    let favorite = favorite_service.add_favorite(&user.id, &path).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": favorite
    })))
}

/// Removes a campground from the caller's favorites
pub async fn remove_favorite(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, FavoriteError> {
    let favorite_service = FavoriteService::new(pool.get_ref().clone());
    favorite_service.remove_favorite(&user.id, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {}
    })))
}

/// Lists the caller's favorite campgrounds
pub async fn get_favorites(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, FavoriteError> {
    let favorite_service = FavoriteService::new(pool.get_ref().clone());
    let favorites = favorite_service.list_favorites(&user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": favorites.len(),
        "data": favorites
    })))
}
