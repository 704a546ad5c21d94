//! Database repositories.

pub mod vote;
pub mod voter;

pub use vote::{CandidateVoteCount, TallySnapshot, VoteRepository};
pub use voter::{ALREADY_REGISTERED, VoterRepository};
