pub mod ballot;
pub mod candidate;
pub mod db;
pub mod tally;
pub mod voter;
