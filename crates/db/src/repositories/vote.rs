//! Vote repository.
//!
//! Owns the two multi-statement units of the voting store: recording a vote
//! together with the voter's `has_voted` flag, and reading a consistent tally.

use std::sync::Arc;

use crate::entities::{Vote, Voter, vote, voter};
use crate::repositories::voter::is_unique_violation;
use election_common::{AppError, AppResult};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::Expr,
};
use tracing::debug;

/// Vote count for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CandidateVoteCount {
    pub candidate_id: String,
    pub count: i64,
}

/// Counts read from one snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallySnapshot {
    /// Votes per candidate, ordered by candidate id.
    pub counts: Vec<CandidateVoteCount>,
    /// Registered voters.
    pub total_voters: u64,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote cast by a voter, if any.
    pub async fn find_by_voter(&self, voter_cnp: &str) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::VoterCnp.eq(voter_cnp))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether any vote row references the voter.
    pub async fn exists_for_voter(&self, voter_cnp: &str) -> AppResult<bool> {
        Ok(self.find_by_voter(voter_cnp).await?.is_some())
    }

    /// Record a vote and flip the voter's `has_voted` flag atomically.
    ///
    /// The flag is claimed with a conditional update (`has_voted = false` in
    /// the `WHERE` clause) inside the transaction, so of two concurrent calls
    /// for the same voter exactly one affects a row. Returns `None` when the
    /// flag was already set; nothing is written in that case.
    pub async fn record(
        &self,
        voter_cnp: &str,
        model: vote::ActiveModel,
    ) -> AppResult<Option<vote::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let claimed = Voter::update_many()
            .col_expr(voter::Column::HasVoted, Expr::value(true))
            .filter(voter::Column::Cnp.eq(voter_cnp))
            .filter(voter::Column::HasVoted.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if claimed.rows_affected == 0 {
            debug!(voter_cnp, "Vote eligibility lost inside transaction");
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(None);
        }

        // Dropping `txn` on error rolls the flag update back.
        let vote = model.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already voted.".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(vote))
    }

    /// Read per-candidate counts and the voter count from one snapshot.
    ///
    /// Both reads run in a read-only repeatable-read transaction so a vote
    /// committing in between cannot make the totals disagree.
    pub async fn tally(&self) -> AppResult<TallySnapshot> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let counts = Vote::find()
            .select_only()
            .column(vote::Column::CandidateId)
            .column_as(Expr::col(vote::Column::Id).count(), "count")
            .group_by(vote::Column::CandidateId)
            .order_by_asc(vote::Column::CandidateId)
            .into_model::<CandidateVoteCount>()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total_voters = Voter::find()
            .count(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(TallySnapshot {
            counts,
            total_voters,
        })
    }
}
