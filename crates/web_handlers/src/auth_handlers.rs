use actix_web::cookie::{Cookie, time::Duration};
use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::middleware::{AuthenticatedUser, TOKEN_COOKIE};
use auth_services::service::AuthService;
use auth_services::types::*;

/// How long the cleared cookie lingers after logout
const LOGOUT_COOKIE_SECONDS: i64 = 10;

/// Attributes of the token cookie
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Send the cookie over HTTPS only
    pub secure: bool,
}

fn token_cookie(value: String, max_age: Duration, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, value)
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .max_age(max_age)
        .finish()
}

fn token_response(
    user: User,
    jwt_service: &JwtService,
    settings: &CookieSettings,
) -> Result<HttpResponse, AuthError> {
    let token = jwt_service.generate_token(&user.id, user.role)?;
    let cookie = token_cookie(
        token.clone(),
        Duration::days(jwt_service.expire_days()),
        settings,
    );

    let response = AuthResponse {
        success: true,
        id: user.id,
        name: user.name,
        telephone: user.telephone,
        email: user.email,
        token,
    };

    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

/// Registers a user and signs them in.
/// Returns the user's contact details together with a fresh token.
pub async fn register(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    settings: web::Data<CookieSettings>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AuthError> {
    request.validate()?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let user = auth_service.create_user(&request).await?;

    token_response(user, &jwt_service, &settings)
}

/// Verifies credentials and issues a token
pub async fn login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    settings: web::Data<CookieSettings>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    if !request.is_complete() {
        return Err(AuthError::MissingCredentials);
    }

    let auth_service = AuthService::new(pool.get_ref().clone());
    let user = auth_service
        .verify_password(&request.email, &request.password)
        .await?;

    token_response(user, &jwt_service, &settings)
}

/// Returns the signed-in user
pub async fn get_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AuthError> {
    let auth_service = AuthService::new(pool.get_ref().clone());
    let user = auth_service
        .get_user_by_id(&user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": UserInfo::from(user)
    })))
}

/// Overwrites the token cookie with a short-lived placeholder
pub async fn logout(_user: AuthenticatedUser, settings: web::Data<CookieSettings>) -> HttpResponse {
    let cookie = token_cookie(
        "none".to_string(),
        Duration::seconds(LOGOUT_COOKIE_SECONDS),
        &settings,
    );

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "success": true,
        "data": {}
    }))
}
