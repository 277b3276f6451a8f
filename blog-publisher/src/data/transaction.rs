use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use tracing::error;

use crate::domain::error::DomainError;

/// A unit of work handed to every store call that must be atomic.
///
/// Dropping a transaction without committing rolls it back, which covers
/// early returns, panics and cancelled request futures alike.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(self) -> Result<(), DomainError>;
    async fn rollback(self) -> Result<(), DomainError>;
}

#[async_trait]
pub trait Transactor: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, DomainError>;
}

/// Commits on success, rolls back once on failure.
///
/// A failed rollback is logged; the caller still gets the original error.
pub async fn finish<Tx, T>(tx: Tx, result: Result<T, DomainError>) -> Result<T, DomainError>
where
    Tx: Transaction,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(
                    error = %rollback_err,
                    cause = %err,
                    "failed to rollback transaction"
                );
            }
            Err(err)
        }
    }
}

pub type PgTransaction = sqlx::Transaction<'static, Postgres>;

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> Result<(), DomainError> {
        sqlx::Transaction::commit(self).await.map_err(|e| {
            error!("failed to commit transaction: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn rollback(self) -> Result<(), DomainError> {
        sqlx::Transaction::rollback(self).await.map_err(|e| {
            error!("failed to rollback transaction: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }
}

#[derive(Clone)]
pub struct PgTransactor {
    pool: PgPool,
}

impl PgTransactor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Transactor for PgTransactor {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<Self::Tx, DomainError> {
        self.pool.begin().await.map_err(|e| {
            error!("failed to begin transaction: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }
}
