//! Database entities.

pub mod vote;
pub mod voter;

pub use vote::Entity as Vote;
pub use voter::Entity as Voter;
