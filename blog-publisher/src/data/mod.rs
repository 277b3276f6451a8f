pub mod category_repository;
pub mod memory;
pub mod post_repository;
pub mod post_version_repository;
pub mod transaction;

use crate::domain::error::DomainError;
use tracing::error;

pub(crate) fn database_error(operation: &str, e: sqlx::Error) -> DomainError {
    error!(operation, error = %e, "database error");
    DomainError::Internal(format!("database error: {}", e))
}
