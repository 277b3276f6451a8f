use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post not found: {0}")]
    PostNotFound(Uuid),
    #[error("post version not found: {0}")]
    PostVersionNotFound(Uuid),
    #[error("post {0} has no versions")]
    NoVersions(Uuid),
    #[error("category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("categories not found: {}", join_ids(.0))]
    CategoriesNotFound(Vec<Uuid>),
    #[error("post version {0} is already published")]
    AlreadyPublished(Uuid),
    #[error("post version {0} is published and cannot be deleted")]
    PublishedVersionNotDeletable(Uuid),
    #[error("category name already exists: {0}")]
    CategoryNameTaken(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::PostNotFound(_)
            | DomainError::PostVersionNotFound(_)
            | DomainError::NoVersions(_)
            | DomainError::CategoryNotFound(_)
            | DomainError::CategoriesNotFound(_) => ErrorKind::NotFound,
            DomainError::AlreadyPublished(_)
            | DomainError::PublishedVersionNotDeletable(_)
            | DomainError::CategoryNameTaken(_) => ErrorKind::Conflict,
            DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to a caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.public_message();
        let details = match self {
            DomainError::PostNotFound(resource)
            | DomainError::PostVersionNotFound(resource)
            | DomainError::NoVersions(resource)
            | DomainError::CategoryNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::CategoriesNotFound(ids) => Some(json!({ "resources": ids })),
            DomainError::CategoryNameTaken(name) => Some(json!({ "name": name })),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            kind: self.kind(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_status_codes() {
        let id = Uuid::now_v7();
        assert_eq!(
            DomainError::PostNotFound(id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::AlreadyPublished(id).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::InvalidInput("title required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let err = DomainError::Internal("relation \"posts\" does not exist".into());
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn missing_categories_are_all_listed() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let message = DomainError::CategoriesNotFound(vec![a, b]).to_string();
        assert!(message.contains(&a.to_string()));
        assert!(message.contains(&b.to_string()));
    }
}
