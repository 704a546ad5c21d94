//! Business logic services.

#![allow(missing_docs)]

pub mod candidate;
pub mod generator;
pub mod notifier;
pub mod voting;

pub use candidate::{
    Candidate, CandidateInput, CandidateLookup, CandidateService, default_candidates,
    placeholder_image,
};
pub use generator::{CandidateGenerator, random_candidate};
pub use notifier::{CandidateEvent, CandidateNotifier, Subscription};
pub use voting::{
    CandidateTally, CastVote, CastVoteInput, LoginInput, RegisterVoterInput, VoteStatistics,
    VoterProfile, VotingService,
};
