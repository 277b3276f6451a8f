use actix_web::{HttpMessage, HttpRequest, web};

use crate::domain::error::DomainError;
use crate::presentation::middleware::RequestId;

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// Malformed ids in the path are the caller's fault, not a missing route.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _| DomainError::InvalidInput(format!("invalid id: {}", err)).into())
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1 << 20)
        .error_handler(|err, _| DomainError::InvalidInput(err.to_string()).into())
}
