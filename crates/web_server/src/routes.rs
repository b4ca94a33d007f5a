//! Route table of the `/api/v1` API.

use actix_web::web;
use auth_services::jwt::JwtService;
use auth_services::middleware::AuthMiddleware;
use web_handlers::*;

/// Registers every API route.
///
/// The whole API resolves a caller when a token is present; the
/// reservation, favorite and account routes reject requests without one.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_service: &JwtService) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(AuthMiddleware::optional(jwt_service.clone()))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .service(
                        web::resource("/me")
                            .wrap(AuthMiddleware::new(jwt_service.clone()))
                            .route(web::get().to(get_me)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(AuthMiddleware::new(jwt_service.clone()))
                            .route(web::get().to(logout)),
                    ),
            )
            .service(
                web::scope("/campgrounds")
                    .route("", web::get().to(get_campgrounds))
                    .route("", web::post().to(create_campground))
                    .route("/{id}", web::get().to(get_campground))
                    .route("/{id}", web::put().to(update_campground))
                    .route("/{id}", web::delete().to(delete_campground))
                    .route("/{id}/availability", web::get().to(get_availability))
                    .route(
                        "/{id}/appointments",
                        web::get().to(get_campground_appointments),
                    )
                    .route("/{id}/appointments", web::post().to(add_appointment))
                    .route("/{id}/bookings", web::get().to(get_campground_appointments))
                    .route("/{id}/bookings", web::post().to(add_appointment))
                    .route("/{id}/favorite", web::post().to(add_favorite))
                    .route("/{id}/favorite", web::delete().to(remove_favorite)),
            )
            .service(reservation_scope("/appointments", jwt_service))
            .service(reservation_scope("/bookings", jwt_service))
            .service(
                web::resource("/favorites")
                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                    .route(web::get().to(get_favorites)),
            ),
    );
}

fn reservation_scope(
    path: &str,
    jwt_service: &JwtService,
) -> impl actix_web::dev::HttpServiceFactory + use<> {
    web::scope(path)
        .wrap(AuthMiddleware::new(jwt_service.clone()))
        .route("", web::get().to(get_appointments))
        .route("/{id}", web::get().to(get_appointment))
        .route("/{id}", web::put().to(update_appointment))
        .route("/{id}", web::delete().to(delete_appointment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use auth_services::jwt::JwtConfig;
    use auth_services::types::Role;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;
    use web_handlers::errors::{json_error_handler, path_error_handler, query_error_handler};

    // These requests are all answered before any query runs, so the pool never connects.
    macro_rules! test_app {
        ($jwt:expr) => {{
            let jwt: JwtService = $jwt;
            let pool = PgPoolOptions::new()
                .connect_lazy("postgres://localhost/unused")
                .unwrap();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(pool))
                    .app_data(web::Data::new(jwt.clone()))
                    .app_data(web::Data::new(CookieSettings::default()))
                    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                    .app_data(web::PathConfig::default().error_handler(path_error_handler))
                    .configure(|cfg| configure(cfg, &jwt)),
            )
            .await
        }};
    }

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig::default())
    }

    fn bearer(jwt: &JwtService, role: Role) -> (&'static str, String) {
        let token = jwt.generate_token(&Uuid::new_v4(), role).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    async fn json_body(resp: actix_web::dev::ServiceResponse) -> serde_json::Value {
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn test_reservation_routes_require_token() {
        let app = test_app!(jwt());

        for uri in [
            "/api/v1/appointments",
            "/api/v1/bookings",
            "/api/v1/favorites",
            "/api/v1/auth/me",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_campground_writes_need_a_token() {
        let app = test_app!(jwt());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/campgrounds/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing_token");
    }

    #[actix_web::test]
    async fn test_users_cannot_manage_campgrounds() {
        let jwt = jwt();
        let header = bearer(&jwt, Role::User);
        let app = test_app!(jwt);

        let req = test::TestRequest::post()
            .uri("/api/v1/campgrounds")
            .insert_header(header)
            .set_json(serde_json::json!({
                "name": "Pine Ridge",
                "address": "1 Ridge Road",
                "telephone": "0123456789"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = json_body(resp).await;
        assert_eq!(
            body["message"],
            "User role user is not authorized to access this route"
        );
    }

    #[actix_web::test]
    async fn test_admin_create_is_validated() {
        let jwt = jwt();
        let header = bearer(&jwt, Role::Admin);
        let app = test_app!(jwt);

        let req = test::TestRequest::post()
            .uri("/api/v1/campgrounds")
            .insert_header(header)
            .set_json(serde_json::json!({
                "name": "Pine Ridge",
                "address": "1 Ridge Road",
                "telephone": "12345"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "validation_error");
    }

    #[actix_web::test]
    async fn test_non_uuid_ids_are_not_found() {
        let app = test_app!(jwt());

        let req = test::TestRequest::get()
            .uri("/api/v1/campgrounds/not-an-id")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_bad_listing_query_is_rejected() {
        let app = test_app!(jwt());

        let req = test::TestRequest::get()
            .uri("/api/v1/campgrounds?password=x")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "invalid_query");
    }

    #[actix_web::test]
    async fn test_availability_rejects_year_without_month() {
        let app = test_app!(jwt());

        for query in ["year=2025", "month=13", "month=march"] {
            let req = test::TestRequest::get()
                .uri(&format!(
                    "/api/v1/campgrounds/{}/availability?{}",
                    Uuid::new_v4(),
                    query
                ))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", query);
        }
    }

    #[actix_web::test]
    async fn test_login_without_credentials() {
        let app = test_app!(jwt());

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(serde_json::json!({"email": "camper@example.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await["message"],
            "Please provide an email and password"
        );
    }

    #[actix_web::test]
    async fn test_register_is_validated() {
        let app = test_app!(jwt());

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(serde_json::json!({
                "name": "Camper",
                "telephone": "0123456789",
                "email": "not-an-email",
                "password": "secret123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_body_uses_envelope() {
        let jwt = jwt();
        let header = bearer(&jwt, Role::User);
        let app = test_app!(jwt);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/campgrounds/{}/bookings", Uuid::new_v4()))
            .insert_header(header)
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"apptDate\": \"tomorrow\"}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "invalid_body");
    }
}
