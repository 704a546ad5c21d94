//! Voter repository.

use std::sync::Arc;

use crate::entities::{Voter, voter};
use election_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, SqlErr};

/// Message reported when a CNP is registered twice.
pub const ALREADY_REGISTERED: &str = "Voter with this CNP already registered";

/// Voter repository for database operations.
#[derive(Clone)]
pub struct VoterRepository {
    db: Arc<DatabaseConnection>,
}

impl VoterRepository {
    /// Create a new voter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a voter by CNP.
    pub async fn find_by_cnp(&self, cnp: &str) -> AppResult<Option<voter::Model>> {
        Voter::find_by_id(cnp)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new voter.
    ///
    /// A primary-key violation (a concurrent registration won the race) is
    /// reported as a conflict, not a store failure.
    pub async fn create(&self, model: voter::ActiveModel) -> AppResult<voter::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(ALREADY_REGISTERED.to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
