use actix_web::{
    Error, HttpMessage, HttpRequest, ResponseError, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
};
use uuid::Uuid;

use crate::jwt::JwtService;
use crate::types::{AuthError, Identity, Role};

/// Name of the cookie that may carry the access token.
pub const TOKEN_COOKIE: &str = "token";

/// Middleware for handling authentication by verifying JWT tokens
/// and storing the caller's [`Identity`] in the request extensions.
///
/// In required mode a missing or invalid token is answered with 401 before the
/// handler runs. In optional mode such requests pass through anonymously and
/// handlers that need a caller use the [`AuthenticatedUser`] extractor.
pub struct AuthMiddleware {
    jwt_service: JwtService,
    required: bool,
}

impl AuthMiddleware {
    /// Rejects requests without a valid token.
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service,
            required: true,
        }
    }

    /// Resolves the identity when a valid token is present, otherwise lets the request through.
    pub fn optional(jwt_service: JwtService) -> Self {
        Self {
            jwt_service,
            required: false,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            required: self.required,
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();
        let required = self.required;

        Box::pin(async move {
            let outcome = match extract_token(req.request()) {
                Some(token) => jwt_service
                    .identity_from_token(&token)
                    .map_err(|_| AuthError::InvalidToken),
                None => Err(AuthError::MissingToken),
            };

            match outcome {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                }
                Err(err) if required => {
                    log::debug!("Rejected {} {}: {}", req.method(), req.path(), err);
                    let response = err.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
                Err(_) => {}
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Reads the bearer token from the `Authorization` header, falling back to the token cookie.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
}

/// Custom extractor for the authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    /// ID of the authenticated user
    pub id: Uuid,
    /// Role of the authenticated user
    pub role: Role,
}

impl AuthenticatedUser {
    /// Whether the caller is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`AuthError::Forbidden`] unless the caller has one of `roles`
    pub fn authorize(&self, roles: &[Role]) -> Result<(), AuthError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(self.role))
        }
    }

    /// Whether the caller owns the resource or is an administrator
    pub fn can_access(&self, owner_id: &Uuid) -> bool {
        self.is_admin() || self.id == *owner_id
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().copied();

        ready(match identity {
            Some(identity) => Ok(AuthenticatedUser {
                id: identity.user_id,
                role: identity.role,
            }),
            None => Err(AuthError::MissingToken),
        })
    }
}
