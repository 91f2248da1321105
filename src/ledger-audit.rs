//! A simple CLI tool for checking the integrity of a ballot ledger.
//! It reads the same files as the voting front end, through the same config.

use std::path::Path;

use clap::{Arg, ArgAction, ArgMatches, Command};

use ballot_box::{
    api::audit::{audit_stores, AuditReport},
    Config,
};

const PROGRAM_NAME: &str = "ledger-audit";

const ABOUT_TEXT: &str = "Check a ballot ledger for duplicate voters, unknown candidates
and voters missing from the roster.

EXIT CODES:
     0: Audit passed.
   255: Ran successfully, but problems were found.
 Other: Error.";

const CONFIG: &str = "CONFIG";
const JSON: &str = "JSON";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(CONFIG)
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Config file to read instead of Ballot.toml")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(JSON)
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
}

/// Human-readable lines describing every finding.
fn findings(report: &AuditReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (voter_id, ballots) in &report.duplicate_voters {
        lines.push(format!("Voter {voter_id} has {ballots} ballots."));
    }
    for entry in &report.unknown_candidates {
        lines.push(format!(
            "Voter {} voted for unknown candidate {}.",
            entry.voter_id, entry.candidate_id
        ));
    }
    for voter_id in &report.unregistered_voters {
        lines.push(format!("Voter {voter_id} is not on the roster."));
    }
    lines
}

/// Run the audit, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path = args.get_one::<String>(CONFIG).map(Path::new);
    let config = match Config::load(path) {
        Ok(config) => config,
        Err(err) => {
            println!("Invalid configuration: {}", err);
            return 1;
        }
    };
    let report = match audit_stores(&config.stores()) {
        Ok(report) => report,
        Err(err) => {
            println!("Audit could not run: {}", err);
            return 1;
        }
    };

    if args.get_flag(JSON) {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                println!("Could not encode report: {}", err);
                return 1;
            }
        }
    } else {
        println!(
            "{} ballot{} read.",
            report.entries,
            if report.entries != 1 { "s" } else { "" }
        );
        for line in findings(&report) {
            println!("{}", line);
        }
    }

    if report.is_clean() {
        println!("Audit passed.");
        0
    } else {
        println!("Audit failed.");
        255
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Write a roster, candidate list, ledger and a config pointing at them.
    fn setup(ledger: &str) -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let config = Config::in_dir(dir.path());
        fs::write(config.roster_path(), "id,nom,prenom,cnib\n7,Kone,Awa,Z9\n12,Dao,Awa,X1\n")
            .unwrap();
        fs::write(
            config.candidates_path(),
            "id,nom,prenom,classe,mot,image\nc1,Traore,Issa,L3,Slogan,a.png\n",
        )
        .unwrap();
        fs::write(config.ledger_path(), ledger).unwrap();

        let config_file = dir.path().join("Ballot.toml");
        fs::write(
            &config_file,
            format!(
                "roster_path = {:?}\ncandidates_path = {:?}\nledger_path = {:?}\n",
                config.roster_path().to_str().unwrap(),
                config.candidates_path().to_str().unwrap(),
                config.ledger_path().to_str().unwrap(),
            ),
        )
        .unwrap();
        let config_file = config_file.to_str().unwrap().to_string();
        (dir, config_file)
    }

    #[test]
    fn clean_ledger() {
        let (_dir, config_file) = setup("id,candidat\n7,c1\n12,c1\n");
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "--config", &config_file])
            .unwrap();
        assert_eq!(run(&args), 0);
    }

    #[test]
    fn problems_found() {
        let (_dir, config_file) = setup("id,candidat\n7,c1\n7,c1\n40,c2\n");
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "--config", &config_file, "--json"])
            .unwrap();
        assert_eq!(run(&args), 255);
    }

    #[test]
    fn missing_roster() {
        let (dir, config_file) = setup("7,c1\n");
        fs::remove_file(Config::in_dir(dir.path()).roster_path()).unwrap();
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "--config", &config_file])
            .unwrap();
        assert_eq!(run(&args), 1);
    }

    #[test]
    fn finding_text() {
        let report = AuditReport {
            entries: 3,
            duplicate_voters: [("7".to_string(), 2)].into_iter().collect(),
            unknown_candidates: vec![ballot_box::model::ballot::BallotEntry::new("12", "c9")],
            unregistered_voters: vec!["40".to_string()],
        };
        assert_eq!(
            findings(&report),
            vec![
                "Voter 7 has 2 ballots.",
                "Voter 12 voted for unknown candidate c9.",
                "Voter 40 is not on the roster.",
            ]
        );
    }

    #[test]
    fn bad_cli_usage() {
        let command_line = [PROGRAM_NAME, "this", "invocation", "is", "incorrect"];
        cli().try_get_matches_from(command_line).unwrap_err();
    }
}
