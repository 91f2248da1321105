//! Operations a front end drives: casting votes, reading results, auditing.

pub mod admin;
pub mod audit;
pub mod eligibility;
pub mod results;
pub mod voting;

pub use admin::AdminGate;
pub use eligibility::EligibilityVerifier;
pub use results::TallyEngine;
pub use voting::{Rejected, VoteError, VotingSession};
