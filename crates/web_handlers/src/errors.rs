use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, error};

/// Builds the `{success: false, error, message}` body shared by every error response.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "error": code,
        "message": message
    }))
}

/// Logs an unexpected failure and hides its details from the client.
pub(crate) fn internal_error(context: &str, err: &dyn std::fmt::Display) -> HttpResponse {
    log::error!("{}: {}", context, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred",
    )
}

/// Answers malformed JSON bodies with a 400 in the common envelope.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = error_response(StatusCode::BAD_REQUEST, "invalid_body", &err.to_string());
    error::InternalError::from_response(err, response).into()
}

/// Answers malformed query strings with a 400 in the common envelope.
pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = error_response(StatusCode::BAD_REQUEST, "invalid_query", &err.to_string());
    error::InternalError::from_response(err, response).into()
}

/// Path ids that do not parse cannot name an existing resource, so they are answered with 404.
pub fn path_error_handler(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    let message = format!("No resource found at {}", req.path());
    let response = error_response(StatusCode::NOT_FOUND, "not_found", &message);
    error::InternalError::from_response(err, response).into()
}
