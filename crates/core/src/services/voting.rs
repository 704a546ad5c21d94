//! Voting service.
//!
//! Registration, login, vote casting and the tally. Input is validated
//! before any store access; the one-vote rule is enforced by
//! [`VoteRepository::record`].

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use election_common::{AppError, AppResult, CNP_PATTERN, IdGenerator};
use election_db::{
    entities::{vote, voter},
    repositories::{TallySnapshot, VoteRepository, VoterRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::candidate::CandidateLookup;

const VOTER_NOT_FOUND: &str = "Voter not found. Please register first.";
const ALREADY_VOTED: &str = "You have already voted.";

/// Input for registering a voter.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterVoterInput {
    #[validate(regex(path = *CNP_PATTERN, message = "CNP must be exactly 13 digits"))]
    pub cnp: String,
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: String,
}

/// Input for logging in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(regex(path = *CNP_PATTERN, message = "CNP must be exactly 13 digits"))]
    pub cnp: String,
}

/// Input for casting a vote.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteInput {
    #[validate(regex(path = *CNP_PATTERN, message = "CNP must be exactly 13 digits"))]
    pub cnp: String,
    #[validate(length(
        min = 1,
        max = 64,
        message = "Candidate ID must be between 1 and 64 characters"
    ))]
    pub candidate_id: String,
}

/// Public projection of a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterProfile {
    pub cnp: String,
    pub name: String,
    pub has_voted: bool,
}

/// A successfully cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub id: String,
    pub candidate_id: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<vote::Model> for CastVote {
    fn from(vote: vote::Model) -> Self {
        Self {
            id: vote.id,
            candidate_id: vote.candidate_id,
            created_at: vote.created_at,
        }
    }
}

/// Votes received by one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub candidate_id: String,
    pub count: u64,
}

/// Tally and turnout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatistics {
    pub votes: Vec<CandidateTally>,
    pub total_votes: u64,
    pub total_voters: u64,
    /// Percentage of registered voters who voted; `0` with no voters.
    pub turnout: f64,
}

impl VoteStatistics {
    /// Derive totals and turnout from a store snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: TallySnapshot) -> Self {
        let votes: Vec<CandidateTally> = snapshot
            .counts
            .into_iter()
            .map(|c| CandidateTally {
                candidate_id: c.candidate_id,
                count: u64::try_from(c.count).unwrap_or(0),
            })
            .collect();

        let total_votes = votes.iter().map(|v| v.count).sum();
        let turnout = if snapshot.total_voters == 0 {
            0.0
        } else {
            total_votes as f64 / snapshot.total_voters as f64 * 100.0
        };

        Self {
            votes,
            total_votes,
            total_voters: snapshot.total_voters,
            turnout,
        }
    }
}

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    voter_repo: VoterRepository,
    vote_repo: VoteRepository,
    candidates: Option<Arc<dyn CandidateLookup>>,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service. Candidate ids are not checked.
    #[must_use]
    pub const fn new(voter_repo: VoterRepository, vote_repo: VoteRepository) -> Self {
        Self {
            voter_repo,
            vote_repo,
            candidates: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Reject votes for candidates the lookup does not know.
    #[must_use]
    pub fn with_candidate_lookup(mut self, candidates: Arc<dyn CandidateLookup>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Register a new voter.
    #[instrument(skip(self, input), fields(cnp = %input.cnp))]
    pub async fn register(&self, input: RegisterVoterInput) -> AppResult<VoterProfile> {
        input.validate()?;

        if self.voter_repo.find_by_cnp(&input.cnp).await?.is_some() {
            return Err(AppError::Conflict(
                election_db::repositories::ALREADY_REGISTERED.to_string(),
            ));
        }

        let model = voter::ActiveModel {
            cnp: Set(input.cnp),
            name: Set(input.name),
            has_voted: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let voter = self.voter_repo.create(model).await?;
        info!("Voter registered");

        Ok(VoterProfile {
            cnp: voter.cnp,
            name: voter.name,
            has_voted: voter.has_voted,
        })
    }

    /// Look up a registered voter.
    #[instrument(skip(self, input), fields(cnp = %input.cnp))]
    pub async fn login(&self, input: LoginInput) -> AppResult<VoterProfile> {
        input.validate()?;

        let voter = self
            .voter_repo
            .find_by_cnp(&input.cnp)
            .await?
            .ok_or_else(|| AppError::NotFound(VOTER_NOT_FOUND.to_string()))?;

        let has_vote = self.vote_repo.exists_for_voter(&voter.cnp).await?;

        Ok(VoterProfile {
            has_voted: voter.has_voted || has_vote,
            cnp: voter.cnp,
            name: voter.name,
        })
    }

    /// Cast the voter's single vote.
    #[instrument(skip(self, input), fields(cnp = %input.cnp, candidate_id = %input.candidate_id))]
    pub async fn cast_vote(&self, input: CastVoteInput) -> AppResult<CastVote> {
        input.validate()?;

        if let Some(candidates) = &self.candidates {
            if !candidates.contains(&input.candidate_id).await {
                return Err(AppError::Validation("Unknown candidate".to_string()));
            }
        }

        let voter = self
            .voter_repo
            .find_by_cnp(&input.cnp)
            .await?
            .ok_or_else(|| AppError::NotFound(VOTER_NOT_FOUND.to_string()))?;

        if voter.has_voted || self.vote_repo.exists_for_voter(&voter.cnp).await? {
            return Err(AppError::Conflict(ALREADY_VOTED.to_string()));
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            voter_cnp: Set(voter.cnp.clone()),
            candidate_id: Set(input.candidate_id),
            created_at: Set(Utc::now().into()),
        };

        let vote = self
            .vote_repo
            .record(&voter.cnp, model)
            .await?
            .ok_or_else(|| AppError::Conflict(ALREADY_VOTED.to_string()))?;

        info!(vote_id = %vote.id, "Vote cast");
        Ok(vote.into())
    }

    /// Per-candidate counts, totals and turnout.
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> AppResult<VoteStatistics> {
        let snapshot = self.vote_repo.tally().await?;
        Ok(VoteStatistics::from_snapshot(snapshot))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::candidate::CandidateService;
    use crate::services::notifier::CandidateNotifier;
    use election_db::repositories::CandidateVoteCount;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};

    const CNP: &str = "1850101123456";

    fn create_test_voter(has_voted: bool) -> voter::Model {
        voter::Model {
            cnp: CNP.to_string(),
            name: "Ana Pop".to_string(),
            has_voted,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_vote(candidate_id: &str) -> vote::Model {
        vote::Model {
            id: "01jbz2n3q4r5s6t7v8w9x0y1z2".to_string(),
            voter_cnp: CNP.to_string(),
            candidate_id: candidate_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> VotingService {
        let db = Arc::new(db);
        VotingService::new(
            VoterRepository::new(Arc::clone(&db)),
            VoteRepository::new(db),
        )
    }

    fn empty_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    #[tokio::test]
    async fn test_register_rejects_bad_cnp_before_store() {
        let service = service(empty_db());
        let err = service
            .register(RegisterVoterInput {
                cnp: "12345".to_string(),
                name: "Ana Pop".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == "CNP must be exactly 13 digits"));
    }

    #[tokio::test]
    async fn test_register_rejects_short_name() {
        let service = service(empty_db());
        let err = service
            .register(RegisterVoterInput {
                cnp: CNP.to_string(),
                name: "A".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m.contains("2 and 100")));
    }

    #[tokio::test]
    async fn test_register_success() {
        let voter = create_test_voter(false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<voter::Model>::new()])
            .append_query_results([[voter]])
            .into_connection();

        let profile = service(db)
            .register(RegisterVoterInput {
                cnp: CNP.to_string(),
                name: "Ana Pop".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(profile.cnp, CNP);
        assert!(!profile.has_voted);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .into_connection();

        let err = service(db)
            .register(RegisterVoterInput {
                cnp: CNP.to_string(),
                name: "Ana Pop".to_string(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::Conflict(ref m) if m == "Voter with this CNP already registered")
        );
    }

    #[tokio::test]
    async fn test_login_unknown_voter() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<voter::Model>::new()])
            .into_connection();

        let err = service(db)
            .login(LoginInput {
                cnp: CNP.to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref m) if m == VOTER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_login_reports_vote_even_if_flag_unset() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .append_query_results([[create_test_vote("2")]])
            .into_connection();

        let profile = service(db)
            .login(LoginInput {
                cnp: CNP.to_string(),
            })
            .await
            .unwrap();

        assert!(profile.has_voted);
    }

    #[tokio::test]
    async fn test_login_fresh_voter_has_not_voted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .append_query_results([Vec::<vote::Model>::new()])
            .into_connection();

        let profile = service(db)
            .login(LoginInput {
                cnp: CNP.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(profile.cnp, CNP);
        assert!(!profile.has_voted);
    }

    #[tokio::test]
    async fn test_cast_vote_when_vote_exists_but_flag_unset() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .append_query_results([[create_test_vote("1")]])
            .into_connection();

        let err = service(db)
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "3".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == ALREADY_VOTED));
    }

    #[tokio::test]
    async fn test_cast_vote_rejects_overlong_candidate_id_before_store() {
        let err = service(empty_db())
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "9".repeat(65),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cast_vote_success() {
        let vote = create_test_vote("3");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[vote.clone()]])
            .into_connection();

        let cast = service(db)
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "3".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(cast.id, vote.id);
        assert_eq!(cast.candidate_id, "3");
    }

    #[tokio::test]
    async fn test_cast_vote_when_flag_set() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(true)]])
            .into_connection();

        let err = service(db)
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "3".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == ALREADY_VOTED));
    }

    #[tokio::test]
    async fn test_cast_vote_loses_race_inside_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_voter(false)]])
            .append_query_results([Vec::<vote::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = service(db)
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "3".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cast_vote_unknown_voter() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<voter::Model>::new()])
            .into_connection();

        let err = service(db)
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "3".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cast_vote_checks_candidate_directory() {
        let directory = CandidateService::new(CandidateNotifier::new(4));
        let service = service(empty_db()).with_candidate_lookup(Arc::new(directory));

        let err = service
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: "999".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Unknown candidate"));

        let err = service
            .cast_vote(CastVoteInput {
                cnp: CNP.to_string(),
                candidate_id: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("Candidate ID must be")));
    }

    #[tokio::test]
    async fn test_statistics_from_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                btreemap! {
                    "candidate_id" => Value::from("1"),
                    "count" => Value::from(2i64),
                },
                btreemap! {
                    "candidate_id" => Value::from("4"),
                    "count" => Value::from(1i64),
                },
            ]])
            .append_query_results([[btreemap! { "num_items" => Value::from(4i64) }]])
            .into_connection();

        let stats = service(db).statistics().await.unwrap();
        assert_eq!(stats.total_votes, 3);
        assert_eq!(stats.total_voters, 4);
        assert_eq!(stats.turnout, 75.0);
        assert_eq!(stats.votes[1].candidate_id, "4");
    }

    #[test]
    fn test_turnout_without_voters_is_zero() {
        let stats = VoteStatistics::from_snapshot(TallySnapshot {
            counts: vec![],
            total_voters: 0,
        });
        assert_eq!(stats.total_votes, 0);
        assert_eq!(stats.turnout, 0.0);
    }

    #[test]
    fn test_total_is_sum_of_counts() {
        let stats = VoteStatistics::from_snapshot(TallySnapshot {
            counts: vec![
                CandidateVoteCount {
                    candidate_id: "1".to_string(),
                    count: 5,
                },
                CandidateVoteCount {
                    candidate_id: "2".to_string(),
                    count: 3,
                },
            ],
            total_voters: 10,
        });

        assert_eq!(
            stats.total_votes,
            stats.votes.iter().map(|v| v.count).sum::<u64>()
        );
        assert_eq!(stats.turnout, 80.0);
    }

    #[test]
    fn test_statistics_wire_format() {
        let stats = VoteStatistics::from_snapshot(TallySnapshot {
            counts: vec![CandidateVoteCount {
                candidate_id: "1".to_string(),
                count: 1,
            }],
            total_voters: 2,
        });
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["votes"][0]["candidateId"], "1");
        assert_eq!(json["totalVotes"], 1);
        assert_eq!(json["totalVoters"], 2);
        assert_eq!(json["turnout"], 50.0);
    }
}
