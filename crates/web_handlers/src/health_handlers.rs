use actix_web::{HttpResponse, web};
use sqlx::PgPool;

/// Reports whether the service and its database are reachable
pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    match postgres::database::test_connection(pool.get_ref()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "service": "campground-booking",
            "status": "healthy",
            "timestamp": chrono::Utc::now()
        })),
        Err(e) => {
            log::warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "service": "campground-booking",
                "status": "unavailable",
                "timestamp": chrono::Utc::now()
            }))
        }
    }
}
