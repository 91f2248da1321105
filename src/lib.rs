#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate store_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;
pub use error::{Error, Result};

/// Write the example roster, candidate list and admin secret to the paths in `config`.
#[cfg(test)]
pub(crate) fn write_example_files(config: &Config) {
    use model::{
        candidate::CandidateList, db::admin::examples::EXAMPLE_SECRET, voter::VoterRecord,
    };

    let mut roster = csv::Writer::from_path(config.roster_path()).unwrap();
    for voter in [
        VoterRecord::example(),
        VoterRecord::example2(),
        VoterRecord::example3(),
    ] {
        roster.serialize(voter).unwrap();
    }
    roster.flush().unwrap();

    let mut candidates = csv::Writer::from_path(config.candidates_path()).unwrap();
    for candidate in CandidateList::example().iter() {
        candidates.serialize(candidate).unwrap();
    }
    candidates.flush().unwrap();

    std::fs::write(config.admin_secret_path(), format!("{EXAMPLE_SECRET}\n")).unwrap();
}
